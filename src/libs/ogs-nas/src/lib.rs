//! NextGCore NAS Protocol Library
//!
//! EPS NAS (TS 24.301) support for the MME Security Mode Command procedure:
//! the plain Security Mode Command, the integrity protected envelope around
//! it and the NAS MAC computed with 128-EIA1 or 128-EIA2.
//!
//! # Example
//!
//! ```rust
//! use ogs_core::OgsPkbuf;
//! use ogs_nas::eps::{
//!     encode_protected_security_mode_command, IntegrityAlgorithm, SecurityModeCommand,
//! };
//!
//! let smc = SecurityModeCommand {
//!     nas_key_set_identifier: 1,
//!     replayed_ue_security_capabilities: vec![0xe0, 0xe0],
//!     ..Default::default()
//! };
//! let mut pkbuf = OgsPkbuf::new(64);
//! encode_protected_security_mode_command(&mut pkbuf, &smc, &IntegrityAlgorithm::Eia1, &[0; 16], 0)
//!     .unwrap();
//! assert_eq!(pkbuf.len(), 13);
//! ```

pub mod error;
pub mod eps;

#[cfg(test)]
mod property_tests;

pub use error::{NasError, NasResult};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{NasError, NasResult};
    pub use crate::eps::{
        encode_protected_security_mode_command,
        verify_security_mode_command,
        CipheringAlgorithm,
        IntegrityAlgorithm,
        NasEpsSecurityHeader,
        NasMac,
        NasSecurityAlgorithms,
        SecurityModeCommand,
    };
}
