pub mod api;
pub mod args;
pub mod commands;
mod config;
pub mod dashboard;
mod error;
pub mod export;
pub mod model;
pub mod transactions;
mod utils;


pub use api::Mode;
pub use config::Config;
pub use error::Error;
pub use error::Result;
