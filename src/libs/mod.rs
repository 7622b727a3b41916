pub mod config;
pub mod data_storage;
pub mod formatter;
pub mod messages;
pub mod models;
pub mod view;
