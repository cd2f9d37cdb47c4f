//! NextGCore Cryptographic Library
//!
//! NAS integrity primitives used by the MME: SNOW 3G f9, AES-CMAC and the
//! 128-EIA1 / 128-EIA2 constructions on top of them.

pub mod snow3g;   // SNOW 3G keystream and f9
pub mod aes_cmac; // AES-CMAC
pub mod eia;      // 128-EIA1 / 128-EIA2

pub use eia::{eia1_mac, eia2_mac, EIA_KEY_SIZE, EIA_MAC_SIZE};
