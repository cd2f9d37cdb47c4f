//! EPS integrity algorithms
//!
//! 128-EIA1 and 128-EIA2 as defined in 3GPP TS 33.401 Annex B.2. Both take
//! COUNT (32 bits), BEARER (5 bits), DIRECTION (1 bit), a 128-bit key and
//! return a 32-bit MAC.

use crate::aes_cmac::aes_cmac_calculate;
use crate::snow3g::snow_3g_f9;

/// Integrity key size in bytes
pub const EIA_KEY_SIZE: usize = 16;

/// MAC size in bytes
pub const EIA_MAC_SIZE: usize = 4;

/// 128-EIA1 (SNOW 3G based)
///
/// FRESH is BEARER in its five most significant bits, zero elsewhere.
pub fn eia1_mac(
    key: &[u8; EIA_KEY_SIZE],
    count: u32,
    bearer: u8,
    direction: u8,
    message: &[u8],
) -> [u8; EIA_MAC_SIZE] {
    let fresh = u32::from(bearer & 0x1f) << 27;
    let length = (message.len() as u64) * 8;
    snow_3g_f9(key, count, fresh, u32::from(direction & 0x01), message, length)
}

/// 128-EIA2 (AES-CMAC based)
///
/// The CMAC input is `COUNT | BEARER | DIRECTION | 0^26 | MESSAGE`; the MAC
/// is the 32 most significant bits of the CMAC.
pub fn eia2_mac(
    key: &[u8; EIA_KEY_SIZE],
    count: u32,
    bearer: u8,
    direction: u8,
    message: &[u8],
) -> [u8; EIA_MAC_SIZE] {
    let mut input = Vec::with_capacity(8 + message.len());
    input.extend_from_slice(&count.to_be_bytes());
    input.push(((bearer & 0x1f) << 3) | ((direction & 0x01) << 2));
    input.extend_from_slice(&[0u8; 3]);
    input.extend_from_slice(message);

    let cmac = aes_cmac_calculate(key, &input);
    [cmac[0], cmac[1], cmac[2], cmac[3]]
}
