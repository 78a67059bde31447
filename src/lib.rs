//! Hector - a small in-memory IRC daemon.
//!
//! The protocol core lives in [`state`] and [`handlers`]; [`network`] is
//! the tokio transport that feeds it.

pub mod config;
pub mod error;
pub mod handlers;
pub mod network;
pub mod proto;
pub mod state;
pub mod telemetry;
