// src/lib.rs
pub mod check;
pub mod config;
pub mod metrics;
pub mod router;
pub mod server;
