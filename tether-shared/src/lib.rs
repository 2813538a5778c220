//! Tether Shared - common code for the tether server and its clients
//!
//! This crate contains the error type, route/protocol constants, and
//! listen-address parsing used by both sides of a stream connection.

pub mod constants;
pub mod errors;
pub mod transport;

pub use errors::{TetherError, TetherResult};
pub use transport::Transport;
