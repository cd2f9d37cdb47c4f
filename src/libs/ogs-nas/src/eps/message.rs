//! EMM Security Mode Command
//!
//! Integrity protected envelope (TS 24.301 Section 9.1):
//!
//! ```text
//! +--------+---------+-----+-------+------+------+-----+---------+-----------+
//! | 0x37   | MAC (4) | SQN | 0x07  | 0x5d | algs | KSI | cap len | cap (N)   |
//! +--------+---------+-----+-------+------+------+-----+---------+-----------+
//!          |<-slot->|<------------------ MAC coverage ------------------------>|
//! ```

use ogs_core::{OgsPkbuf, PkbufSlot};

use super::security::{
    patch_downlink_mac, NasMac, NAS_KEY_SIZE, NAS_SECURITY_BEARER, NAS_SECURITY_MAC_SIZE,
};
use super::types::{
    header_octet, parse_header_octet, EpsMessageType, NasDirection, NasSecurityAlgorithms,
    NasSecurityHeaderType, ProtocolDiscriminator,
};
use crate::error::{NasError, NasResult};

/// Largest replayed UE security capability value accepted
pub const UE_SECURITY_CAPABILITY_MAX_LEN: usize = 16;

/// Security header: header octet, MAC, sequence number
pub const NAS_EPS_SECURITY_HEADER_LEN: usize = 1 + NAS_SECURITY_MAC_SIZE + 1;

/// Fixed part of the plain message: header, type, algorithms, KSI, cap length
pub const SECURITY_MODE_COMMAND_FIXED_LEN: usize = 5;

/// Protected Security Mode Command length for a capability of `cap_len` bytes
pub const fn protected_security_mode_command_len(cap_len: usize) -> usize {
    NAS_EPS_SECURITY_HEADER_LEN + SECURITY_MODE_COMMAND_FIXED_LEN + cap_len
}

/// Decoded NAS EPS security header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NasEpsSecurityHeader {
    pub security_header_type: NasSecurityHeaderType,
    pub protocol_discriminator: ProtocolDiscriminator,
    pub message_authentication_code: [u8; NAS_SECURITY_MAC_SIZE],
    pub sequence_number: u8,
}

impl NasEpsSecurityHeader {
    pub fn decode(bytes: &[u8]) -> NasResult<Self> {
        if bytes.len() < NAS_EPS_SECURITY_HEADER_LEN {
            return Err(NasError::BufferTooShort {
                expected: NAS_EPS_SECURITY_HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let (security_header_type, protocol_discriminator) = parse_header_octet(bytes[0])?;
        let mut message_authentication_code = [0u8; NAS_SECURITY_MAC_SIZE];
        message_authentication_code.copy_from_slice(&bytes[1..1 + NAS_SECURITY_MAC_SIZE]);

        Ok(Self {
            security_header_type,
            protocol_discriminator,
            message_authentication_code,
            sequence_number: bytes[NAS_EPS_SECURITY_HEADER_LEN - 1],
        })
    }
}

/// Plain Security Mode Command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityModeCommand {
    pub selected_nas_security_algorithms: NasSecurityAlgorithms,
    /// NAS security parameter octet (type of security context flag and KSI)
    pub nas_key_set_identifier: u8,
    pub replayed_ue_security_capabilities: Vec<u8>,
}

impl SecurityModeCommand {
    /// Append the plain message to `pkbuf`.
    pub fn encode(&self, pkbuf: &mut OgsPkbuf) -> NasResult<()> {
        let cap = &self.replayed_ue_security_capabilities;
        if cap.len() > UE_SECURITY_CAPABILITY_MAX_LEN {
            return Err(NasError::IeTooLong {
                ie: "replayed UE security capabilities",
                len: cap.len(),
                max: UE_SECURITY_CAPABILITY_MAX_LEN,
            });
        }

        pkbuf.put_u8(header_octet(
            NasSecurityHeaderType::PlainNas,
            ProtocolDiscriminator::EpsMobilityManagement,
        ))?;
        pkbuf.put_u8(EpsMessageType::SecurityModeCommand as u8)?;
        pkbuf.put_u8(self.selected_nas_security_algorithms.octet())?;
        pkbuf.put_u8(self.nas_key_set_identifier)?;
        pkbuf.put_u8(cap.len() as u8)?;
        pkbuf.put_data(cap)?;
        Ok(())
    }

    /// Decode a plain message. Trailing bytes are ignored.
    pub fn decode(bytes: &[u8]) -> NasResult<Self> {
        if bytes.len() < SECURITY_MODE_COMMAND_FIXED_LEN {
            return Err(NasError::BufferTooShort {
                expected: SECURITY_MODE_COMMAND_FIXED_LEN,
                actual: bytes.len(),
            });
        }
        let (security_header_type, _) = parse_header_octet(bytes[0])?;
        if security_header_type != NasSecurityHeaderType::PlainNas {
            return Err(NasError::InvalidSecurityHeaderType(security_header_type as u8));
        }
        EpsMessageType::try_from(bytes[1])?;
        let selected_nas_security_algorithms = NasSecurityAlgorithms::from_octet(bytes[2])?;

        let cap_len = bytes[4] as usize;
        let cap = bytes
            .get(SECURITY_MODE_COMMAND_FIXED_LEN..SECURITY_MODE_COMMAND_FIXED_LEN + cap_len)
            .ok_or(NasError::BufferTooShort {
                expected: SECURITY_MODE_COMMAND_FIXED_LEN + cap_len,
                actual: bytes.len(),
            })?;

        Ok(Self {
            selected_nas_security_algorithms,
            nas_key_set_identifier: bytes[3],
            replayed_ue_security_capabilities: cap.to_vec(),
        })
    }
}

/// Build the integrity protected Security Mode Command into `pkbuf`.
///
/// The MAC is computed with COUNT = `sequence_number` over the sequence
/// number and the plain message, then written back in front of them. On
/// error `pkbuf` holds a partial message and must be discarded.
pub fn encode_protected_security_mode_command<M: NasMac + ?Sized>(
    pkbuf: &mut OgsPkbuf,
    message: &SecurityModeCommand,
    mac: &M,
    key: &[u8; NAS_KEY_SIZE],
    sequence_number: u8,
) -> NasResult<PkbufSlot> {
    pkbuf.put_u8(header_octet(
        NasSecurityHeaderType::IntegrityProtectedWithNewEpsSecurityContext,
        ProtocolDiscriminator::EpsMobilityManagement,
    ))?;
    let slot = pkbuf.reserve_slot(NAS_SECURITY_MAC_SIZE)?;
    pkbuf.put_u8(sequence_number)?;
    message.encode(pkbuf)?;

    patch_downlink_mac(pkbuf, slot, mac, key, u32::from(sequence_number))?;
    Ok(slot)
}

/// Check the MAC of a protected Security Mode Command and decode it.
pub fn verify_security_mode_command<M: NasMac + ?Sized>(
    bytes: &[u8],
    mac: &M,
    key: &[u8; NAS_KEY_SIZE],
) -> NasResult<(NasEpsSecurityHeader, SecurityModeCommand)> {
    let header = NasEpsSecurityHeader::decode(bytes)?;
    let covered = &bytes[NAS_EPS_SECURITY_HEADER_LEN - 1..];
    let expected = mac.mac(
        key,
        u32::from(header.sequence_number),
        NasDirection::Downlink,
        NAS_SECURITY_BEARER,
        covered,
    );
    if expected != header.message_authentication_code {
        return Err(NasError::MacVerificationFailed {
            received: header.message_authentication_code,
            expected,
        });
    }

    let message = SecurityModeCommand::decode(&bytes[NAS_EPS_SECURITY_HEADER_LEN..])?;
    Ok((header, message))
}
