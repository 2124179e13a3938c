pub mod bus;
pub mod color;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod query;
pub mod state;
pub mod store;
pub mod template;
