pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod routes;
pub mod server;

pub use config::Config;
pub use server::Server;
