pub mod albums;
pub mod config;
