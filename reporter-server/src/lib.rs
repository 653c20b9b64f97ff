pub mod api;
pub mod config;
pub mod logging;
pub mod prometheus;
pub mod router;
pub mod server;
