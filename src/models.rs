pub mod ai;
pub mod auth;
pub mod crm;
pub mod dashboard;
pub mod finance;
pub mod inventory;
pub mod operations;
pub mod platform;
pub mod portal;
pub mod settings;
pub mod team;
