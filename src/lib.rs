//! exitnode
//!
//! A websocket-relayed HTTP exit client. It holds a pool of persistent
//! control connections to a relay; each inbound instruction becomes one
//! outbound HTTP request whose outcome is reported back on the same
//! connection.

pub mod error;
pub mod pool;
pub mod protocol;
pub mod worker;

pub use error::{Error, Result};
pub use pool::Pool;
pub use protocol::{Instruction, Method, Reply};
pub use worker::Worker;
