pub mod analyse;
pub mod clean;
pub mod config;
pub mod error;
pub mod fetch;
pub mod process;
pub mod store;
pub mod table;
