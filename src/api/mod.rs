pub mod handler;
pub mod idle;
pub mod middleware;
pub mod server;
