pub mod config;
pub mod counter;
pub mod logging;
pub mod pose;
pub mod protocol;
pub mod render;
pub mod server;
pub mod session;
