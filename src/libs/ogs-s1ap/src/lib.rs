//! NextGCore S1AP Protocol Library
//!
//! S1AP (3GPP TS 36.413) is the control plane protocol between eNodeB and
//! MME. This crate encodes and decodes the Downlink NAS Transport PDU the
//! MME uses to carry NAS messages to a UE.

pub mod types;
pub mod error;
pub mod builder;


pub use types::*;
pub use error::{S1apError, S1apResult};
pub use builder::*;
