//! IPC Path
//!
//! Security context records arrive on a Unix datagram socket, one record per
//! datagram. Each datagram is forwarded as-is to the stage; size checking
//! happens when the record is decoded.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::net::UnixDatagram;
use tokio::sync::mpsc;

use crate::backoff::Backoff;
use crate::context::SEC_MODE_MSG_SIZE;

/// Receive buffer size; one byte more than a record so that oversized
/// datagrams are seen as such instead of being truncated to a valid size.
pub const IPC_RECV_BUF_SIZE: usize = SEC_MODE_MSG_SIZE + 1;

/// Inbound channel reader
pub struct IpcReader {
    socket: UnixDatagram,
    path: PathBuf,
}

impl IpcReader {
    /// Bind the socket, replacing a stale socket file
    pub fn bind(path: &Path) -> std::io::Result<Self> {
        match std::fs::remove_file(path) {
            Ok(()) => log::debug!("Removed stale IPC socket {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        let socket = UnixDatagram::bind(path)?;
        log::info!("IPC socket bound at {}", path.display());
        Ok(Self {
            socket,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Receive one datagram; returns the number of bytes received
    pub async fn recv(&self, buf: &mut [u8; IPC_RECV_BUF_SIZE]) -> std::io::Result<usize> {
        self.socket.recv(buf).await
    }

    /// Forward datagrams to `tx` until the receiver goes away or the task is
    /// dropped. Dropping this future drops `tx`, which closes the channel.
    pub async fn run(self, tx: mpsc::Sender<Bytes>) {
        let mut buf = [0u8; IPC_RECV_BUF_SIZE];
        let mut backoff = Backoff::new();
        loop {
            let n = match self.recv(&mut buf).await {
                Ok(n) => {
                    backoff.reset();
                    n
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    log::warn!("IPC receive failed: {e}, retrying in {delay:?}");
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };
            log::debug!("IPC received {n} bytes");
            if tx.send(Bytes::copy_from_slice(&buf[..n])).await.is_err() {
                log::debug!("Stage closed, IPC reader exiting");
                break;
            }
        }
    }
}

impl Drop for IpcReader {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn socket_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("secreqd-{}-{}.sock", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_one_datagram_per_record() {
        let path = socket_path("record");
        let reader = IpcReader::bind(&path).unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let handle = tokio::spawn(reader.run(tx));

        let sender = UnixDatagram::unbound().unwrap();
        sender.send_to(&[1u8; SEC_MODE_MSG_SIZE], &path).await.unwrap();
        sender.send_to(&[2u8; SEC_MODE_MSG_SIZE + 10], &path).await.unwrap();

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        assert_eq!(first.len(), SEC_MODE_MSG_SIZE);
        assert!(first.iter().all(|&b| b == 1));

        // Oversized datagram is cut at one byte past a record
        let second = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        assert_eq!(second.len(), IPC_RECV_BUF_SIZE);

        handle.abort();
        let _ = handle.await;
        assert!(rx.recv().await.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_bind_replaces_stale_socket() {
        let path = socket_path("stale");
        std::fs::write(&path, b"").unwrap();
        let reader = IpcReader::bind(&path).unwrap();
        assert_eq!(reader.path(), path.as_path());
        drop(reader);
        assert!(!path.exists());
    }
}
