//! Security context record
//!
//! One record per datagram on the IPC socket, all integers big-endian:
//!
//! ```text
//! ue_idx(4) | enb_s1ap_ue_id(4) | dl_seq_no(1) | int_key(16) |
//! ue_network.len(1) | ue_network.capab(16) | enb_fd(4)
//! ```

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

/// KNASint size
pub const INT_KEY_SIZE: usize = 16;

/// Capacity of the UE network capability field
pub const UE_NETWORK_CAPAB_SIZE: usize = 16;

/// Size of one security context record
pub const SEC_MODE_MSG_SIZE: usize = 4 + 4 + 1 + INT_KEY_SIZE + 1 + UE_NETWORK_CAPAB_SIZE + 4;

/// Record decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("record is {actual} bytes, expected {}", SEC_MODE_MSG_SIZE)]
    WrongSize { actual: usize },
    #[error("UE network capability length {0} exceeds {}", UE_NETWORK_CAPAB_SIZE)]
    CapabilityTooLong(u8),
}

/// UE network capability as carried in the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UeNetworkCapability {
    pub len: u8,
    pub capab: [u8; UE_NETWORK_CAPAB_SIZE],
}

impl UeNetworkCapability {
    /// Build from a slice of at most 16 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ContextError> {
        if bytes.len() > UE_NETWORK_CAPAB_SIZE {
            return Err(ContextError::CapabilityTooLong(bytes.len().min(u8::MAX as usize) as u8));
        }
        let mut capab = [0u8; UE_NETWORK_CAPAB_SIZE];
        capab[..bytes.len()].copy_from_slice(bytes);
        Ok(Self { len: bytes.len() as u8, capab })
    }

    /// The used part of the capability
    pub fn as_slice(&self) -> &[u8] {
        &self.capab[..(self.len as usize).min(UE_NETWORK_CAPAB_SIZE)]
    }
}

/// Security Mode Command request for one UE
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityContext {
    /// MME-UE-S1AP-ID
    pub ue_idx: u32,
    /// eNB-UE-S1AP-ID
    pub enb_s1ap_ue_id: u32,
    /// Downlink NAS sequence number
    pub dl_seq_no: u8,
    /// KNASint
    pub int_key: [u8; INT_KEY_SIZE],
    pub ue_network: UeNetworkCapability,
    /// eNB connection descriptor
    pub enb_fd: u32,
}

impl SecurityContext {
    pub fn decode(record: &[u8]) -> Result<Self, ContextError> {
        if record.len() != SEC_MODE_MSG_SIZE {
            return Err(ContextError::WrongSize { actual: record.len() });
        }

        let mut buf = record;
        let ue_idx = buf.get_u32();
        let enb_s1ap_ue_id = buf.get_u32();
        let dl_seq_no = buf.get_u8();
        let mut int_key = [0u8; INT_KEY_SIZE];
        buf.copy_to_slice(&mut int_key);
        let len = buf.get_u8();
        if len as usize > UE_NETWORK_CAPAB_SIZE {
            return Err(ContextError::CapabilityTooLong(len));
        }
        let mut capab = [0u8; UE_NETWORK_CAPAB_SIZE];
        buf.copy_to_slice(&mut capab);
        let enb_fd = buf.get_u32();

        Ok(Self {
            ue_idx,
            enb_s1ap_ue_id,
            dl_seq_no,
            int_key,
            ue_network: UeNetworkCapability { len, capab },
            enb_fd,
        })
    }

    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(SEC_MODE_MSG_SIZE);
        buf.put_u32(self.ue_idx);
        buf.put_u32(self.enb_s1ap_ue_id);
        buf.put_u8(self.dl_seq_no);
        buf.put_slice(&self.int_key);
        buf.put_u8(self.ue_network.len);
        buf.put_slice(&self.ue_network.capab);
        buf.put_u32(self.enb_fd);
        buf
    }
}
