//! NAS integrity protection
//!
//! The NAS MAC is computed over the sequence number and the plain message
//! (TS 24.301 Section 4.4.3.3). The MAC itself sits in front of that range,
//! so the envelope builder reserves it first and patches it once the rest of
//! the message has been written.

use ogs_core::{OgsPkbuf, PkbufSlot};
use ogs_crypt::{eia1_mac, eia2_mac};

use super::types::{IntegrityAlgorithm, NasDirection};
use crate::error::NasResult;

/// NAS security bearer (always 0 for NAS)
pub const NAS_SECURITY_BEARER: u8 = 0;

/// NAS security MAC size in bytes
pub const NAS_SECURITY_MAC_SIZE: usize = 4;

/// KNASint size in bytes
pub const NAS_KEY_SIZE: usize = 16;

/// NAS integrity primitive
pub trait NasMac {
    /// Compute the 32-bit MAC of `data`.
    ///
    /// `count` is the NAS COUNT, `bearer` the 5-bit bearer identity.
    fn mac(
        &self,
        key: &[u8; NAS_KEY_SIZE],
        count: u32,
        direction: NasDirection,
        bearer: u8,
        data: &[u8],
    ) -> [u8; NAS_SECURITY_MAC_SIZE];
}

impl NasMac for IntegrityAlgorithm {
    fn mac(
        &self,
        key: &[u8; NAS_KEY_SIZE],
        count: u32,
        direction: NasDirection,
        bearer: u8,
        data: &[u8],
    ) -> [u8; NAS_SECURITY_MAC_SIZE] {
        match self {
            // EIA0 carries an all-zero MAC
            IntegrityAlgorithm::Eia0 => [0; NAS_SECURITY_MAC_SIZE],
            IntegrityAlgorithm::Eia1 => eia1_mac(key, count, bearer, direction as u8, data),
            IntegrityAlgorithm::Eia2 => eia2_mac(key, count, bearer, direction as u8, data),
        }
    }
}

/// Compute the downlink MAC over everything written after `slot` and store it
/// in `slot`.
///
/// Returns the MAC that was written.
pub fn patch_downlink_mac<M: NasMac + ?Sized>(
    pkbuf: &mut OgsPkbuf,
    slot: PkbufSlot,
    mac: &M,
    key: &[u8; NAS_KEY_SIZE],
    count: u32,
) -> NasResult<[u8; NAS_SECURITY_MAC_SIZE]> {
    let value = mac.mac(
        key,
        count,
        NasDirection::Downlink,
        NAS_SECURITY_BEARER,
        pkbuf.data_from(slot.end()),
    );
    pkbuf.fill_slot(slot, &value)?;
    Ok(value)
}
