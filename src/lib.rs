pub mod action;
pub mod config;
pub mod error;
pub mod gate;
pub mod platform;
pub mod queue;
pub mod server;
pub mod shutdown;
pub mod webhook;
