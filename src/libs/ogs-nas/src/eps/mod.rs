//! EPS (Evolved Packet System) NAS implementation
//!
//! EMM Security Mode Command encoding with NAS integrity protection, as
//! specified in 3GPP TS 24.301 and TS 33.401.

pub mod types;
pub mod security;
pub mod message;

pub use types::*;
pub use security::*;
pub use message::*;
