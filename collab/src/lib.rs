pub mod auth;
pub mod comment;
pub mod configuration;
pub mod document;
pub mod error;
pub mod routes;
pub mod server;
pub mod telemetry;
pub mod user;
pub mod websocket;
