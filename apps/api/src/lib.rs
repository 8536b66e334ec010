pub mod config;
pub mod errors;
pub mod notifications;
pub mod routes;
pub mod state;
