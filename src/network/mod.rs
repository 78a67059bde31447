//! Network module.
//!
//! Contains the Gateway (TCP listener) and the per-client Connection task.

mod connection;
mod gateway;

pub use connection::{Connection, Outbound, ReplySender};
pub use gateway::{Gateway, SharedMatrix};
