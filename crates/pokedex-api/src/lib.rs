pub mod config;
pub mod error;
pub mod params;
pub mod routes;
pub mod server;
pub mod state;
