//! S1AP Message Types
//!
//! Identifiers and message representation for the Downlink NAS Transport
//! procedure per 3GPP TS 36.413.

use serde::{Deserialize, Serialize};

use crate::error::S1apError;

/// S1AP Protocol IEs
pub mod protocol_ie_id {
    pub const MME_UE_S1AP_ID: u16 = 0;
    pub const ENB_UE_S1AP_ID: u16 = 8;
    pub const NAS_PDU: u16 = 26;
}

/// S1AP Procedure Codes
pub mod procedure_code {
    pub const DOWNLINK_NAS_TRANSPORT: u8 = 11;
}

/// Number of protocol IEs in a Downlink NAS Transport
pub const S1AP_DL_NAS_TRANSPORT_IE_COUNT: u32 = 3;

/// S1AP Criticality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Criticality {
    Reject = 0,
    Ignore = 1,
    Notify = 2,
}

impl TryFrom<u8> for Criticality {
    type Error = S1apError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Reject),
            1 => Ok(Self::Ignore),
            2 => Ok(Self::Notify),
            _ => Err(S1apError::InvalidCriticality(value)),
        }
    }
}

/// S1AP PDU Type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PduType {
    InitiatingMessage = 0,
    SuccessfulOutcome = 1,
    UnsuccessfulOutcome = 2,
}

/// How IE payload and PDU value lengths are written
///
/// `Aper` is what deployed eNBs expect: one-octet IE lengths, a NAS-PDU
/// value that repeats its own length, and an aligned PER length determinant
/// for the PDU value. `Canonical` uses a two-octet length everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum S1apLengthLayout {
    #[default]
    Aper,
    Canonical,
}

/// A decoded protocol IE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolIe {
    pub id: u16,
    pub criticality: Criticality,
    pub value: Vec<u8>,
}

/// Downlink NAS Transport - sent by MME to eNB
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DlNasTransport {
    /// MME UE S1AP ID
    pub mme_ue_s1ap_id: u32,
    /// eNB UE S1AP ID
    pub enb_ue_s1ap_id: u32,
    /// NAS-PDU
    pub nas_pdu: Vec<u8>,
}
