//! AES-CMAC
//!
//! RFC 4493 AES-CMAC on top of the `aes` and `cmac` crates.

use aes::Aes128;
use cmac::digest::generic_array::GenericArray;
use cmac::digest::KeyInit;
use cmac::{Cmac, Mac};

/// CMAC output size in bytes
pub const CMAC_SIZE: usize = 16;

/// Calculate AES-128-CMAC of `msg`
pub fn aes_cmac_calculate(key: &[u8; 16], msg: &[u8]) -> [u8; CMAC_SIZE] {
    let mut mac = <Cmac<Aes128> as KeyInit>::new(GenericArray::from_slice(key));
    mac.update(msg);

    let mut cmac = [0u8; CMAC_SIZE];
    cmac.copy_from_slice(&mac.finalize().into_bytes());
    cmac
}
