//! Security Mode Command stage
//!
//! Per request: decode the security context record, build the integrity
//! protected Security Mode Command, wrap it in a Downlink NAS Transport and
//! hand the PDU to the eNB transport. A failed cycle is logged and the stage
//! moves on to the next request.

use bytes::Bytes;
use ogs_core::{OgsPkbuf, CLUSTER_128, CLUSTER_256};
use ogs_nas::eps::{
    encode_protected_security_mode_command, IntegrityAlgorithm, NasMac, NasSecurityAlgorithms,
    SecurityModeCommand,
};
use ogs_nas::NasError;
use ogs_s1ap::{build_downlink_nas_transport_with_ids, S1apError, S1apLengthLayout};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::SecReqConfig;
use crate::context::{ContextError, SecurityContext};
use crate::s1ap_path::{EnbTransport, TransportError};

/// Per-cycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecReqError {
    #[error("malformed security context: {0}")]
    Context(#[from] ContextError),
    #[error("NAS encoding failed: {0}")]
    Nas(#[from] NasError),
    #[error("S1AP encoding failed: {0}")]
    S1ap(#[from] S1apError),
    #[error("dispatch to eNB {descriptor} failed: {source}")]
    Dispatch {
        descriptor: u32,
        #[source]
        source: TransportError,
    },
}

/// Fixed Security Mode Command parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SecReqSettings {
    pub algorithms: NasSecurityAlgorithms,
    pub nas_security_param: u8,
    pub length_layout: S1apLengthLayout,
}

impl From<&SecReqConfig> for SecReqSettings {
    fn from(config: &SecReqConfig) -> Self {
        SecReqSettings {
            algorithms: config.security.algorithms(),
            nas_security_param: config.security.nas_security_param,
            length_layout: config.s1ap.length_layout,
        }
    }
}

/// Buffers owned by one cycle
#[derive(Debug)]
pub struct SecReqBuffers {
    pub nas: OgsPkbuf,
    pub value: OgsPkbuf,
    pub pdu: OgsPkbuf,
}

impl Default for SecReqBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl SecReqBuffers {
    pub fn new() -> Self {
        Self {
            nas: OgsPkbuf::new(CLUSTER_128),
            value: OgsPkbuf::new(CLUSTER_128),
            pdu: OgsPkbuf::new(CLUSTER_256),
        }
    }
}

/// How a cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Dispatched,
    /// PDU was handed to the transport, which refused it
    DispatchFailed,
    /// Nothing was sent
    Aborted,
}

/// Stage counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SecReqStats {
    /// Cycles that reached the dispatcher
    pub processed: u64,
    /// Cycles dropped before dispatch
    pub aborted: u64,
    /// Processed cycles the transport refused
    pub dispatch_failed: u64,
}

impl SecReqStats {
    fn record(&mut self, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::Dispatched => self.processed += 1,
            CycleOutcome::DispatchFailed => {
                self.processed += 1;
                self.dispatch_failed += 1;
            }
            CycleOutcome::Aborted => self.aborted += 1,
        }
    }
}

/// Build the Downlink NAS Transport carrying the Security Mode Command.
///
/// `bufs` must be fresh. On success the PDU is in `bufs.pdu`.
pub fn build_security_mode_command<M: NasMac + ?Sized>(
    ctx: &SecurityContext,
    settings: &SecReqSettings,
    mac: &M,
    bufs: &mut SecReqBuffers,
) -> Result<(), SecReqError> {
    let smc = SecurityModeCommand {
        selected_nas_security_algorithms: settings.algorithms,
        nas_key_set_identifier: settings.nas_security_param,
        replayed_ue_security_capabilities: ctx.ue_network.as_slice().to_vec(),
    };
    encode_protected_security_mode_command(&mut bufs.nas, &smc, mac, &ctx.int_key, ctx.dl_seq_no)?;

    build_downlink_nas_transport_with_ids(
        ctx.ue_idx,
        ctx.enb_s1ap_ue_id,
        bufs.nas.as_slice(),
        settings.length_layout,
        &mut bufs.value,
        &mut bufs.pdu,
    )?;
    Ok(())
}

/// Security Mode Command stage
pub struct SecReqStage<T: EnbTransport> {
    settings: SecReqSettings,
    transport: T,
    stats: SecReqStats,
}

impl<T: EnbTransport> SecReqStage<T> {
    pub fn new(settings: SecReqSettings, transport: T) -> Self {
        Self {
            settings,
            transport,
            stats: SecReqStats::default(),
        }
    }

    pub fn stats(&self) -> SecReqStats {
        self.stats
    }

    fn integrity(&self) -> IntegrityAlgorithm {
        self.settings.algorithms.integrity
    }

    fn build(&self, record: &[u8]) -> Result<(SecurityContext, Bytes), SecReqError> {
        let ctx = SecurityContext::decode(record)?;
        let mut bufs = SecReqBuffers::new();
        build_security_mode_command(&ctx, &self.settings, &self.integrity(), &mut bufs)?;
        log::debug!(
            "Security Mode Command: MME-UE-S1AP-ID[{}] eNB-UE-S1AP-ID[{}] SEQ[{}] NAS[{}] PDU[{}]",
            ctx.ue_idx,
            ctx.enb_s1ap_ue_id,
            ctx.dl_seq_no,
            bufs.nas.len(),
            bufs.pdu.len()
        );
        Ok((ctx, bufs.pdu.freeze()))
    }

    /// Run one request through the stage
    pub fn process_cycle(&mut self, record: &[u8]) -> CycleOutcome {
        let outcome = match self.build(record) {
            Ok((ctx, pdu)) => {
                let len = pdu.len();
                match self.transport.send(ctx.enb_fd, pdu) {
                    Ok(()) => {
                        log::info!(
                            "Security Mode Command sent to eNB {} (MME-UE-S1AP-ID[{}], {} bytes)",
                            ctx.enb_fd,
                            ctx.ue_idx,
                            len
                        );
                        CycleOutcome::Dispatched
                    }
                    Err(source) => {
                        let e = SecReqError::Dispatch { descriptor: ctx.enb_fd, source };
                        log::warn!("MME-UE-S1AP-ID[{}]: {e}", ctx.ue_idx);
                        CycleOutcome::DispatchFailed
                    }
                }
            }
            Err(e) => {
                log::warn!("Security Mode Command aborted: {e}");
                CycleOutcome::Aborted
            }
        };
        self.stats.record(&outcome);
        outcome
    }

    /// Process requests until the inbound channel closes
    pub async fn run(mut self, mut rx: mpsc::Receiver<Bytes>) -> SecReqStats {
        log::info!("Security Mode Command stage running");
        while let Some(record) = rx.recv().await {
            self.process_cycle(&record);
        }
        log::info!(
            "Security Mode Command stage stopped: processed={} aborted={} dispatch_failed={}",
            self.stats.processed,
            self.stats.aborted,
            self.stats.dispatch_failed
        );
        self.stats
    }
}
