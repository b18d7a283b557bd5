pub mod api;
pub mod coach;
pub mod config;
pub mod core;
pub mod dataset;
pub mod session;
