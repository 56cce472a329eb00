// Serial module - Serial communication implementation
pub mod client;

pub use client::SerialClient;
