//! Redis pub/sub wrapper used as the broadcast bus between services.

pub mod client;
pub mod error;

pub use client::{BusClient, BusSubscriber};
pub use error::{BusError, Result};
