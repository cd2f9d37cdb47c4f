//! EPS-specific NAS types
//!
//! Based on 3GPP TS 24.301

use serde::{Deserialize, Serialize};

use crate::error::{NasError, NasResult};

/// Protocol discriminator values (TS 24.007 Section 11.2.3.1.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProtocolDiscriminator {
    /// EPS Session Management (ESM)
    EpsSessionManagement = 0x02,
    /// EPS Mobility Management (EMM)
    EpsMobilityManagement = 0x07,
}

impl TryFrom<u8> for ProtocolDiscriminator {
    type Error = NasError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x02 => Ok(Self::EpsSessionManagement),
            0x07 => Ok(Self::EpsMobilityManagement),
            _ => Err(NasError::InvalidProtocolDiscriminator(value)),
        }
    }
}

/// Security header type (TS 24.301 Section 9.3.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum NasSecurityHeaderType {
    /// Plain NAS message, not security protected
    #[default]
    PlainNas = 0,
    /// Integrity protected
    IntegrityProtected = 1,
    /// Integrity protected and ciphered
    IntegrityProtectedAndCiphered = 2,
    /// Integrity protected with new EPS security context
    IntegrityProtectedWithNewEpsSecurityContext = 3,
    /// Integrity protected and ciphered with new EPS security context
    IntegrityProtectedAndCipheredWithNewEpsSecurityContext = 4,
}

impl TryFrom<u8> for NasSecurityHeaderType {
    type Error = NasError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::PlainNas),
            1 => Ok(Self::IntegrityProtected),
            2 => Ok(Self::IntegrityProtectedAndCiphered),
            3 => Ok(Self::IntegrityProtectedWithNewEpsSecurityContext),
            4 => Ok(Self::IntegrityProtectedAndCipheredWithNewEpsSecurityContext),
            _ => Err(NasError::InvalidSecurityHeaderType(value)),
        }
    }
}

/// Pack a security header type and protocol discriminator into one octet
pub fn header_octet(security_header_type: NasSecurityHeaderType, pd: ProtocolDiscriminator) -> u8 {
    ((security_header_type as u8) << 4) | ((pd as u8) & 0x0f)
}

/// Split a header octet into security header type and protocol discriminator
pub fn parse_header_octet(octet: u8) -> NasResult<(NasSecurityHeaderType, ProtocolDiscriminator)> {
    let security_header_type = NasSecurityHeaderType::try_from(octet >> 4)?;
    let pd = ProtocolDiscriminator::try_from(octet & 0x0f)?;
    Ok((security_header_type, pd))
}

/// EMM message types handled here (TS 24.301 Section 9.8)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EpsMessageType {
    SecurityModeCommand = 0x5d,
}

impl TryFrom<u8> for EpsMessageType {
    type Error = NasError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x5d => Ok(Self::SecurityModeCommand),
            _ => Err(NasError::InvalidMessageType(value)),
        }
    }
}

/// EPS encryption algorithms (TS 33.401 Section 5.1.3.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CipheringAlgorithm {
    /// Null ciphering
    #[default]
    #[serde(rename = "EEA0")]
    Eea0 = 0,
    /// SNOW 3G
    #[serde(rename = "EEA1")]
    Eea1 = 1,
    /// AES
    #[serde(rename = "EEA2")]
    Eea2 = 2,
    /// ZUC
    #[serde(rename = "EEA3")]
    Eea3 = 3,
}

/// EPS integrity algorithms (TS 33.401 Section 5.1.4.2)
///
/// 128-EIA3 is not supported by this MME.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum IntegrityAlgorithm {
    /// Null integrity (emergency calls only)
    #[serde(rename = "EIA0")]
    Eia0 = 0,
    /// SNOW 3G
    #[default]
    #[serde(rename = "EIA1")]
    Eia1 = 1,
    /// AES-CMAC
    #[serde(rename = "EIA2")]
    Eia2 = 2,
}

impl TryFrom<u8> for CipheringAlgorithm {
    type Error = NasError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Eea0),
            1 => Ok(Self::Eea1),
            2 => Ok(Self::Eea2),
            3 => Ok(Self::Eea3),
            _ => Err(NasError::InvalidAlgorithm(value)),
        }
    }
}

impl TryFrom<u8> for IntegrityAlgorithm {
    type Error = NasError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Eia0),
            1 => Ok(Self::Eia1),
            2 => Ok(Self::Eia2),
            _ => Err(NasError::InvalidAlgorithm(value)),
        }
    }
}

/// Selected NAS security algorithms IE (TS 24.301 Section 9.9.3.23)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NasSecurityAlgorithms {
    pub ciphering: CipheringAlgorithm,
    pub integrity: IntegrityAlgorithm,
}

impl NasSecurityAlgorithms {
    /// Ciphering in the high nibble, integrity in the low nibble
    pub fn octet(&self) -> u8 {
        ((self.ciphering as u8) << 4) | (self.integrity as u8 & 0x0f)
    }

    pub fn from_octet(octet: u8) -> NasResult<Self> {
        Ok(Self {
            ciphering: CipheringAlgorithm::try_from((octet >> 4) & 0x07)?,
            integrity: IntegrityAlgorithm::try_from(octet & 0x07)?,
        })
    }
}

/// Direction bit of the NAS COUNT input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NasDirection {
    Uplink = 0,
    Downlink = 1,
}
