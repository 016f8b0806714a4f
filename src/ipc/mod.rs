//! Cross-view sync via Unix sockets
//!
//! Views connect to a hub that relays preference changes to every other view.
//! Uses length-prefixed JSON over Unix domain sockets.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

pub mod hub;
mod messages;

pub use hub::{spawn_hub, SyncHub};
pub use messages::SyncMessage;

use crate::constants::ipc::MAX_MESSAGE_SIZE;
use crate::constants::paths::{APP_DIR, SOCKET_FILENAME};
use crate::preference::{ChangePublisher, StorageChange, ViewId};

/// Get default socket path (XDG_RUNTIME_DIR with fallback to cache)
pub fn default_socket_path() -> Result<PathBuf> {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(runtime_dir).join(APP_DIR).join(SOCKET_FILENAME));
    }

    let cache = dirs::cache_dir()
        .context("Failed to determine cache directory (no XDG_RUNTIME_DIR or HOME)")?;
    Ok(cache.join(APP_DIR).join(SOCKET_FILENAME))
}

/// One view's registered connection to the hub
pub struct SyncClient {
    stream: UnixStream,
    view: ViewId,
}

/// Write half of a started client
pub struct SyncPublisher {
    stream: UnixStream,
}

/// A running link to the hub: publish local changes, receive remote ones
pub struct SyncLink {
    pub publisher: SyncPublisher,
    pub changes: Receiver<StorageChange>,
    pub reader: JoinHandle<()>,
}

impl SyncClient {
    /// Connect to the hub at the default socket path
    pub fn connect(view: ViewId) -> Result<Self> {
        let path = default_socket_path()?;
        Self::connect_to(&path, view)
    }

    /// Connect to a specific socket path and register. Returns once the hub
    /// has accepted the registration.
    pub fn connect_to(path: &Path, view: ViewId) -> Result<Self> {
        let mut client = Self::open(path, view)?;
        client.send(&SyncMessage::Register(view))?;
        client.ping()?;
        debug!(view = %view, socket = %path.display(), "Registered with sync hub");
        Ok(client)
    }

    /// Connection that never registers: it can publish, receives no
    /// changes and does not count as a view for the hub's idle tracking
    fn open(path: &Path, view: ViewId) -> Result<Self> {
        let stream = UnixStream::connect(path)
            .with_context(|| format!("Failed to connect to sync hub at {}", path.display()))?;
        Ok(Self { stream, view })
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn send(&mut self, msg: &SyncMessage) -> Result<()> {
        write_message(&mut self.stream, msg)
    }

    /// Receive the next frame (blocking)
    pub fn recv(&mut self) -> Result<SyncMessage> {
        read_message(&mut self.stream)
    }

    /// Round trip to the hub
    pub fn ping(&mut self) -> Result<()> {
        self.send(&SyncMessage::Ping)?;
        loop {
            match self.recv()? {
                SyncMessage::Pong => return Ok(()),
                // Changes may already be in flight towards us
                other => debug!(message = ?other, "Skipping frame while waiting for pong"),
            }
        }
    }

    pub fn publish_change(&mut self, change: &StorageChange) -> Result<()> {
        self.send(&SyncMessage::PreferenceChanged(change.clone()))
    }

    /// Split into a publisher and a reader thread forwarding remote changes
    pub fn start(self) -> Result<SyncLink> {
        let writer = self.stream.try_clone().context("Failed to clone sync socket")?;
        let (tx, changes) = mpsc::channel();
        let view = self.view;
        let reader = std::thread::spawn(move || run_reader(self.stream, view, tx));
        Ok(SyncLink {
            publisher: SyncPublisher { stream: writer },
            changes,
            reader,
        })
    }
}

fn run_reader(mut stream: UnixStream, view: ViewId, tx: Sender<StorageChange>) {
    loop {
        match read_message::<SyncMessage, _>(&mut stream) {
            Ok(SyncMessage::PreferenceChanged(change)) => {
                debug!(view = %view, origin = %change.origin, key = %change.key, "Received change from hub");
                if tx.send(change).is_err() {
                    debug!("Change receiver gone, stopping sync reader");
                    break;
                }
            }
            Ok(SyncMessage::Pong) => {}
            Ok(other) => debug!(message = ?other, "Ignoring unexpected frame from hub"),
            Err(e) => {
                warn!(error = ?e, "Sync hub connection closed, continuing unsynchronized");
                break;
            }
        }
    }
}

impl ChangePublisher for SyncPublisher {
    fn publish(&mut self, change: &StorageChange) -> Result<()> {
        write_message(&mut self.stream, &SyncMessage::PreferenceChanged(change.clone()))
    }
}

/// Join the hub at `path`, hosting one in a background thread if none answers
pub fn join_or_host(path: &Path, view: ViewId) -> Option<SyncLink> {
    let client = match SyncClient::connect_to(path, view) {
        Ok(client) => client,
        Err(e) => {
            debug!(error = ?e, "No sync hub reachable, hosting one");
            let hosted = SyncHub::bind_to(path.to_path_buf()).map(|hub| {
                spawn_hub(hub, None);
            });
            match hosted.and_then(|()| SyncClient::connect_to(path, view)) {
                Ok(client) => client,
                Err(e) => {
                    warn!(error = ?e, "Sync hub unavailable, this view will not follow other views");
                    return None;
                }
            }
        }
    };

    match client.start() {
        Ok(link) => {
            info!(view = %view, socket = %path.display(), "Joined sync hub");
            Some(link)
        }
        Err(e) => {
            warn!(error = ?e, "Failed to start sync reader, this view will not follow other views");
            None
        }
    }
}

/// Announce a change through the hub without staying connected
pub fn notify(path: &Path, change: &StorageChange) -> Result<()> {
    let mut client = SyncClient::open(path, change.origin)?;
    client.publish_change(change)?;
    // The hub has relayed the change once it answers
    client.ping()
}

/// Write length-prefixed message to stream
pub(crate) fn write_message<T: Serialize, W: Write>(stream: &mut W, msg: &T) -> Result<()> {
    let json = serde_json::to_vec(msg).context("Failed to serialize message to JSON")?;
    if json.len() > MAX_MESSAGE_SIZE {
        bail!("Message too large: {} bytes (max: {})", json.len(), MAX_MESSAGE_SIZE);
    }

    // Length prefix (u32 little-endian)
    let len = json.len() as u32;
    stream
        .write_all(&len.to_le_bytes())
        .context("Failed to write message length")?;
    stream
        .write_all(&json)
        .context("Failed to write message payload")?;
    stream.flush().context("Failed to flush stream")?;

    Ok(())
}

/// Read length-prefixed message from stream
pub(crate) fn read_message<T: for<'de> Deserialize<'de>, R: Read>(stream: &mut R) -> Result<T> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .context("Failed to read message length")?;
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_SIZE {
        return Err(anyhow!("Message too large: {} bytes (max: {})", len, MAX_MESSAGE_SIZE));
    }

    let mut json_buf = vec![0u8; len];
    stream
        .read_exact(&mut json_buf)
        .context("Failed to read message payload")?;

    serde_json::from_slice(&json_buf).context("Failed to deserialize message from JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::preference::STORAGE_KEY;
    use std::io::Cursor;
    use std::time::Duration;

    fn change(value: &str, origin: ViewId) -> StorageChange {
        StorageChange { key: STORAGE_KEY.to_string(), value: Some(value.to_string()), origin }
    }

    #[test]
    fn test_frame_round_trip() {
        let msg = SyncMessage::PreferenceChanged(change("clinical", ViewId::from(3)));
        let mut buf = Vec::new();
        write_message(&mut buf, &msg).unwrap();
        assert_eq!(u32::from_le_bytes(buf[..4].try_into().unwrap()) as usize, buf.len() - 4);
        let back: SyncMessage = read_message(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_oversized_frame_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&((MAX_MESSAGE_SIZE as u32) + 1).to_le_bytes());
        assert!(read_message::<SyncMessage, _>(&mut Cursor::new(buf)).is_err());
    }

    #[test]
    fn test_join_or_host_relays_between_views() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.sock");

        let (a, b) = (ViewId::generate(), ViewId::generate());
        let mut link_a = join_or_host(&path, a).unwrap();
        let link_b = join_or_host(&path, b).unwrap();

        link_a.publisher.publish(&change("anatomical", a)).unwrap();
        let received = link_b.changes.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(received.value.as_deref(), Some("anatomical"));
        assert_eq!(received.origin, a);
        assert!(link_a.changes.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_notify_reaches_connected_view() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.sock");
        let link = join_or_host(&path, ViewId::generate()).unwrap();

        notify(&path, &change("minimalist", ViewId::generate())).unwrap();
        let received = link.changes.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(received.value.as_deref(), Some("minimalist"));
    }
}
