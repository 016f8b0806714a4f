//! Sync hub: relays preference changes between registered views

use anyhow::{bail, Context, Result};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

use super::{default_socket_path, read_message, write_message, SyncMessage};
use crate::preference::{StorageChange, ViewId};

/// Server listener for the hub
pub struct SyncHub {
    listener: UnixListener,
    socket_path: PathBuf,
}

/// Write half of one connected view
struct Peer {
    id: u64,
    view: Option<ViewId>,
    stream: UnixStream,
}

type PeerRegistry = Arc<Mutex<Vec<Peer>>>;

impl SyncHub {
    /// Create hub and bind to default socket path
    pub fn bind() -> Result<Self> {
        let socket_path = default_socket_path()?;
        Self::bind_to(socket_path)
    }

    /// Create hub and bind to specific socket path
    pub fn bind_to(socket_path: PathBuf) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create socket directory: {}", parent.display()))?;
        }

        if socket_path.exists() {
            // A live hub keeps its socket; only stale files are replaced
            if UnixStream::connect(&socket_path).is_ok() {
                bail!("Sync hub already running at {}", socket_path.display());
            }
            std::fs::remove_file(&socket_path)
                .context(format!("Failed to remove stale socket: {}", socket_path.display()))?;
        }

        let listener = UnixListener::bind(&socket_path)
            .context(format!("Failed to bind socket at {}", socket_path.display()))?;

        // Set permissions to 0700 (owner only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o700))
                .context("Failed to set socket permissions")?;
        }

        Ok(Self {
            listener,
            socket_path,
        })
    }

    /// Accept incoming connection (blocking)
    pub fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self.listener.accept()
            .context("Failed to accept sync connection")?;
        Ok(stream)
    }

    pub fn path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for SyncHub {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Spawn the hub's accept loop. With `idle_tx`, a signal is sent each time
/// the last registered view goes away. Connections that never register
/// (liveness checks, one-shot notifiers) do not count.
pub fn spawn_hub(hub: SyncHub, idle_tx: Option<mpsc::Sender<()>>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        if let Err(e) = run_accept_loop(&hub, idle_tx) {
            error!(error = ?e, "Sync hub thread crashed");
        }
    })
}

fn lock(peers: &PeerRegistry) -> MutexGuard<'_, Vec<Peer>> {
    peers.lock().unwrap_or_else(PoisonError::into_inner)
}

fn run_accept_loop(hub: &SyncHub, idle_tx: Option<mpsc::Sender<()>>) -> Result<()> {
    info!(socket = ?hub.path(), "Sync hub started");
    let peers: PeerRegistry = Arc::new(Mutex::new(Vec::new()));
    let mut next_id = 0u64;

    loop {
        let stream = hub.accept()?;
        let writer = match stream.try_clone() {
            Ok(writer) => writer,
            Err(e) => {
                warn!(error = ?e, "Failed to clone view connection, dropping it");
                continue;
            }
        };

        let id = next_id;
        next_id += 1;
        lock(&peers).push(Peer { id, view: None, stream: writer });
        debug!(peer = id, "View connected to sync hub");

        let peers = Arc::clone(&peers);
        let idle_tx = idle_tx.clone();
        std::thread::spawn(move || {
            serve_peer(id, stream, &peers);
            let (was_view, views_left) = {
                let mut peers = lock(&peers);
                let was_view = peers.iter().any(|peer| peer.id == id && peer.view.is_some());
                peers.retain(|peer| peer.id != id);
                (was_view, peers.iter().filter(|peer| peer.view.is_some()).count())
            };
            if !was_view {
                debug!(peer = id, "Unregistered connection closed");
                return;
            }
            info!(peer = id, views_left, "View disconnected from sync hub");
            if views_left == 0 && let Some(tx) = idle_tx {
                tx.send(()).ok();
            }
        });
    }
}

/// Handle frames from one view until it disconnects
fn serve_peer(id: u64, mut stream: UnixStream, peers: &PeerRegistry) {
    loop {
        match read_message::<SyncMessage, _>(&mut stream) {
            Ok(SyncMessage::Register(view)) => {
                info!(peer = id, view = %view, "View registered");
                if let Some(peer) = lock(peers).iter_mut().find(|peer| peer.id == id) {
                    peer.view = Some(view);
                }
            }

            Ok(SyncMessage::PreferenceChanged(change)) => {
                broadcast(peers, id, &change);
            }

            Ok(SyncMessage::Ping) => {
                let mut peers = lock(peers);
                if let Some(peer) = peers.iter_mut().find(|peer| peer.id == id)
                    && let Err(e) = write_message(&mut peer.stream, &SyncMessage::Pong)
                {
                    debug!(peer = id, error = ?e, "Failed to answer ping");
                }
            }

            Ok(SyncMessage::Pong) => {}

            Err(e) => {
                debug!(peer = id, error = ?e, "Sync connection closed or error");
                break;
            }
        }
    }
}

/// Relay a change to every view except the one it came from. Views that can
/// no longer be written to are dropped.
fn broadcast(peers: &PeerRegistry, sender: u64, change: &StorageChange) {
    let msg = SyncMessage::PreferenceChanged(change.clone());
    let mut peers = lock(peers);
    let mut delivered = 0usize;
    peers.retain_mut(|peer| {
        if peer.id == sender || peer.view == Some(change.origin) {
            return true;
        }
        match write_message(&mut peer.stream, &msg) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(e) => {
                warn!(peer = peer.id, error = ?e, "Dropping unreachable view");
                false
            }
        }
    });
    info!(key = %change.key, origin = %change.origin, delivered, "Relayed preference change");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::preference::STORAGE_KEY;
    use crate::ipc::SyncClient;
    use std::time::Duration;

    fn change(value: &str, origin: ViewId) -> StorageChange {
        StorageChange { key: STORAGE_KEY.to_string(), value: Some(value.to_string()), origin }
    }

    #[test]
    fn test_bind_refuses_to_replace_live_hub() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.sock");
        let hub = SyncHub::bind_to(path.clone()).unwrap();
        assert!(SyncHub::bind_to(path.clone()).is_err());
        drop(hub);
        assert!(!path.exists());
    }

    #[test]
    fn test_bind_replaces_stale_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.sock");
        {
            let _listener = UnixListener::bind(&path).unwrap();
        }
        assert!(path.exists());
        assert!(SyncHub::bind_to(path).is_ok());
    }

    #[test]
    fn test_changes_arrive_in_order_at_every_other_view() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.sock");
        spawn_hub(SyncHub::bind_to(path.clone()).unwrap(), None);

        let (a, b, c) = (ViewId::generate(), ViewId::generate(), ViewId::generate());
        let mut writer = SyncClient::connect_to(&path, a).unwrap();
        let link_b = SyncClient::connect_to(&path, b).unwrap().start().unwrap();
        let link_c = SyncClient::connect_to(&path, c).unwrap().start().unwrap();

        for value in ["anatomical", "clinical", "minimalist"] {
            writer.publish_change(&change(value, a)).unwrap();
        }

        for link in [&link_b, &link_c] {
            let values: Vec<String> = (0..3)
                .map(|_| link.changes.recv_timeout(Duration::from_secs(5)).unwrap().value.unwrap())
                .collect();
            assert_eq!(values, vec!["anatomical", "clinical", "minimalist"]);
        }
    }

    #[test]
    fn test_idle_signal_after_last_view_leaves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.sock");
        let (idle_tx, idle_rx) = mpsc::channel();
        spawn_hub(SyncHub::bind_to(path.clone()).unwrap(), Some(idle_tx));

        let client = SyncClient::connect_to(&path, ViewId::generate()).unwrap();
        drop(client);
        assert!(idle_rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_unregistered_connections_do_not_make_hub_idle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.sock");
        let (idle_tx, idle_rx) = mpsc::channel();
        spawn_hub(SyncHub::bind_to(path.clone()).unwrap(), Some(idle_tx));

        // A second bind checks liveness with a bare connection
        assert!(SyncHub::bind_to(path.clone()).is_err());
        crate::ipc::notify(&path, &change("clinical", ViewId::generate())).unwrap();
        assert!(idle_rx.recv_timeout(Duration::from_millis(300)).is_err());

        let client = SyncClient::connect_to(&path, ViewId::generate()).unwrap();
        drop(client);
        assert!(idle_rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }
}
