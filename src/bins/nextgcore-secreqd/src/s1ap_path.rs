//! S1AP Path
//!
//! eNB-facing transport. Each accepted connection is given a descriptor and
//! a writer task; PDUs are queued to the writer and never retried.
//!
//! Descriptors count up from 1 in accept order and are logged at info level
//! with the peer address. The MME side uses that mapping (or
//! `EnbConnectionTable::descriptor_of`) to fill `enb_fd` in a record. Uplink
//! bytes from the eNB are read and dropped.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::backoff::Backoff;

/// Uplink read buffer size
const S1AP_RECV_BUF_SIZE: usize = 8192;

/// Transport failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("no eNB connection with descriptor {0}")]
    UnknownDescriptor(u32),
    #[error("eNB connection {0} is closed")]
    ConnectionClosed(u32),
}

/// Outbound transport to the eNBs
pub trait EnbTransport {
    /// Queue `pdu` on the connection named by `descriptor`.
    fn send(&self, descriptor: u32, pdu: Bytes) -> Result<(), TransportError>;
}

/// One connected eNB
#[derive(Debug)]
struct EnbConnection {
    addr: SocketAddr,
    tx: mpsc::UnboundedSender<Bytes>,
}

/// Connected eNBs keyed by descriptor
#[derive(Debug, Clone)]
pub struct EnbConnectionTable {
    connections: Arc<Mutex<HashMap<u32, EnbConnection>>>,
    next_descriptor: Arc<AtomicU32>,
}

impl Default for EnbConnectionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EnbConnectionTable {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(Mutex::new(HashMap::new())),
            next_descriptor: Arc::new(AtomicU32::new(1)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u32, EnbConnection>> {
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the writer queue of the eNB at `addr` and return its descriptor
    pub fn register(&self, addr: SocketAddr, tx: mpsc::UnboundedSender<Bytes>) -> u32 {
        let descriptor = self.next_descriptor.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(descriptor, EnbConnection { addr, tx });
        descriptor
    }

    /// Descriptor of the connected eNB at `addr`
    pub fn descriptor_of(&self, addr: SocketAddr) -> Option<u32> {
        self.lock()
            .iter()
            .find(|(_, conn)| conn.addr == addr)
            .map(|(&descriptor, _)| descriptor)
    }

    /// Peer address of the eNB behind `descriptor`
    pub fn peer_addr(&self, descriptor: u32) -> Option<SocketAddr> {
        self.lock().get(&descriptor).map(|conn| conn.addr)
    }

    pub fn unregister(&self, descriptor: u32) {
        self.lock().remove(&descriptor);
    }

    /// Number of connected eNBs
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EnbTransport for EnbConnectionTable {
    fn send(&self, descriptor: u32, pdu: Bytes) -> Result<(), TransportError> {
        let connections = self.lock();
        let conn = connections
            .get(&descriptor)
            .ok_or(TransportError::UnknownDescriptor(descriptor))?;
        conn.tx.send(pdu).map_err(|_| TransportError::ConnectionClosed(descriptor))
    }
}

/// TCP listener accepting eNB connections
pub struct S1apListener {
    listener: TcpListener,
    table: EnbConnectionTable,
}

impl S1apListener {
    pub async fn bind(addr: SocketAddr, table: EnbConnectionTable) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        log::info!("S1AP listening on {}", listener.local_addr()?);
        Ok(Self { listener, table })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the task is dropped
    pub async fn run(self) {
        let mut backoff = Backoff::new();
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    backoff.reset();
                    let (tx, rx) = mpsc::unbounded_channel();
                    let descriptor = self.table.register(addr, tx);
                    log::info!("eNB connected from {addr} (descriptor {descriptor})");
                    tokio::spawn(serve_connection(stream, descriptor, rx, self.table.clone()));
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    log::warn!("Failed to accept eNB connection: {e}, retrying in {delay:?}");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    descriptor: u32,
    mut rx: mpsc::UnboundedReceiver<Bytes>,
    table: EnbConnectionTable,
) {
    let (mut reader, mut writer) = stream.into_split();
    let mut buf = vec![0u8; S1AP_RECV_BUF_SIZE];

    loop {
        tokio::select! {
            pdu = rx.recv() => {
                let Some(pdu) = pdu else { break };
                if let Err(e) = writer.write_all(&pdu).await {
                    log::warn!("eNB {descriptor}: write failed: {e}");
                    break;
                }
            }
            n = reader.read(&mut buf) => match n {
                Ok(0) => break,
                Ok(n) => log::debug!("eNB {descriptor}: ignoring {n} uplink bytes"),
                Err(e) => {
                    log::warn!("eNB {descriptor}: read failed: {e}");
                    break;
                }
            },
        }
    }

    let peer = table.peer_addr(descriptor);
    table.unregister(descriptor);
    match peer {
        Some(addr) => log::info!("eNB {descriptor} ({addr}) disconnected"),
        None => log::info!("eNB {descriptor} disconnected"),
    }
}
