//! Design preference: which layout every view of the chart uses
//!
//! The preference is owned by a [`PreferenceStore`]. A store starts
//! `Initializing`, loads the persisted value once and is `Ready` from then
//! on. Local writes persist and publish a [`StorageChange`]; changes from
//! other views arrive through [`PreferenceStore::apply_remote`].

pub mod storage;

pub use storage::{FileStorage, MemoryStorage, PreferenceStorage};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, trace, warn};

use crate::constants::preference::STORAGE_KEY;

/// The layout a view renders the chart with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignPreference {
    #[default]
    Traditional,
    Anatomical,
    Interactive,
    Minimalist,
    Clinical,
}

/// Identity of one view (window or process) taking part in sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(u64);

/// A key/value change made by some view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageChange {
    pub key: String,
    /// `None` when the key was removed
    pub value: Option<String>,
    pub origin: ViewId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceState {
    Initializing,
    Ready(DesignPreference),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Listener = Box<dyn FnMut(DesignPreference) + Send>;

/// Delivers local changes to the other views
pub trait ChangePublisher: Send {
    fn publish(&mut self, change: &StorageChange) -> Result<()>;
}

impl ChangePublisher for Sender<StorageChange> {
    fn publish(&mut self, change: &StorageChange) -> Result<()> {
        self.send(change.clone())
            .map_err(|_| anyhow::anyhow!("Change receiver disconnected"))
    }
}

/// Store handle shared between a view's dispatcher and its sync plumbing
pub type SharedPreferenceStore = Arc<Mutex<PreferenceStore>>;

pub struct PreferenceStore {
    view: ViewId,
    state: PreferenceState,
    storage: Box<dyn PreferenceStorage>,
    publisher: Option<Box<dyn ChangePublisher>>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl DesignPreference {
    pub const ALL: [DesignPreference; 5] = [
        DesignPreference::Traditional,
        DesignPreference::Anatomical,
        DesignPreference::Interactive,
        DesignPreference::Minimalist,
        DesignPreference::Clinical,
    ];

    /// Stored identifier
    pub fn as_str(self) -> &'static str {
        match self {
            DesignPreference::Traditional => "traditional",
            DesignPreference::Anatomical => "anatomical",
            DesignPreference::Interactive => "interactive",
            DesignPreference::Minimalist => "minimalist",
            DesignPreference::Clinical => "clinical",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DesignPreference::Traditional => "Traditional",
            DesignPreference::Anatomical => "Anatomical",
            DesignPreference::Interactive => "Interactive",
            DesignPreference::Minimalist => "Minimalist",
            DesignPreference::Clinical => "Clinical",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|design| design.as_str().eq_ignore_ascii_case(raw))
    }

    /// Unknown or corrupted values resolve to the traditional layout
    pub fn from_str_lossy(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|| {
            debug!(value = %raw, "Unrecognized design preference, using traditional");
            Self::default()
        })
    }
}

impl fmt::Display for DesignPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ViewId {
    /// Unique for this process and distinct across processes
    pub fn generate() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        let local = NEXT.fetch_add(1, Ordering::Relaxed);
        Self((u64::from(std::process::id()) << 32) | u64::from(local))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ViewId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl PreferenceStore {
    /// A store that has not read storage yet
    pub fn new(storage: Box<dyn PreferenceStorage>, view: ViewId) -> Self {
        Self {
            view,
            state: PreferenceState::Initializing,
            storage,
            publisher: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// A ready store
    pub fn open(storage: Box<dyn PreferenceStorage>, view: ViewId) -> Self {
        let mut store = Self::new(storage, view);
        store.initialize();
        store
    }

    pub fn into_shared(self) -> SharedPreferenceStore {
        Arc::new(Mutex::new(self))
    }

    pub fn with_publisher(mut self, publisher: Box<dyn ChangePublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn set_publisher(&mut self, publisher: Box<dyn ChangePublisher>) {
        self.publisher = Some(publisher);
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn state(&self) -> PreferenceState {
        self.state
    }

    /// Load the persisted value. Storage trouble leaves the default in memory.
    pub fn initialize(&mut self) -> DesignPreference {
        if let PreferenceState::Ready(design) = self.state {
            return design;
        }

        let design = match self.storage.load(STORAGE_KEY) {
            Ok(Some(raw)) => DesignPreference::from_str_lossy(&raw),
            Ok(None) => DesignPreference::default(),
            Err(e) => {
                warn!(error = ?e, "Preference storage unavailable, using in-memory default");
                DesignPreference::default()
            }
        };

        info!(design = %design, view = %self.view, "Design preference ready");
        self.state = PreferenceState::Ready(design);
        design
    }

    /// Current preference, reading storage on first use
    pub fn read(&mut self) -> DesignPreference {
        self.initialize()
    }

    /// Current preference without touching storage
    pub fn current(&self) -> DesignPreference {
        match self.state {
            PreferenceState::Ready(design) => design,
            PreferenceState::Initializing => DesignPreference::default(),
        }
    }

    /// Update, persist and announce a locally chosen preference
    pub fn write(&mut self, design: DesignPreference) {
        self.state = PreferenceState::Ready(design);

        if let Err(e) = self.storage.save(STORAGE_KEY, design.as_str()) {
            warn!(error = ?e, design = %design, "Failed to persist design preference, keeping it in memory");
        }

        let change = StorageChange {
            key: STORAGE_KEY.to_string(),
            value: Some(design.as_str().to_string()),
            origin: self.view,
        };
        if let Some(publisher) = self.publisher.as_mut()
            && let Err(e) = publisher.publish(&change)
        {
            warn!(error = ?e, "Failed to publish design preference change");
        }
    }

    /// Register a callback for changes coming from other views
    pub fn subscribe(&mut self, listener: impl FnMut(DesignPreference) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Apply a change made by another view. Returns the new preference when
    /// the change was accepted.
    pub fn apply_remote(&mut self, change: &StorageChange) -> Option<DesignPreference> {
        if change.origin == self.view {
            trace!("Ignoring own preference change");
            return None;
        }
        if change.key != STORAGE_KEY {
            trace!(key = %change.key, "Ignoring change to unrelated key");
            return None;
        }

        let design = change
            .value
            .as_deref()
            .map(DesignPreference::from_str_lossy)
            .unwrap_or_default();

        debug!(design = %design, origin = %change.origin, "Applying design preference from another view");
        self.state = PreferenceState::Ready(design);
        for (_, listener) in self.listeners.iter_mut() {
            listener(design);
        }
        Some(design)
    }
}

/// Lock a shared store, recovering from a poisoned lock
pub fn lock(store: &SharedPreferenceStore) -> MutexGuard<'_, PreferenceStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn memory_store(storage: &MemoryStorage) -> PreferenceStore {
        PreferenceStore::open(Box::new(storage.clone()), ViewId::generate())
    }

    #[test]
    fn test_parse_and_fallback() {
        for design in DesignPreference::ALL {
            assert_eq!(DesignPreference::parse(design.as_str()), Some(design));
        }
        assert_eq!(DesignPreference::parse(" Clinical "), Some(DesignPreference::Clinical));
        assert_eq!(DesignPreference::from_str_lossy("holographic"), DesignPreference::Traditional);
        assert_eq!(DesignPreference::from_str_lossy(""), DesignPreference::Traditional);
    }

    #[test]
    fn test_state_machine() {
        let storage = MemoryStorage::new();
        let mut store = PreferenceStore::new(Box::new(storage), ViewId::generate());
        assert_eq!(store.state(), PreferenceState::Initializing);
        assert_eq!(store.read(), DesignPreference::Traditional);
        assert_eq!(store.state(), PreferenceState::Ready(DesignPreference::Traditional));
        store.write(DesignPreference::Minimalist);
        assert_eq!(store.state(), PreferenceState::Ready(DesignPreference::Minimalist));
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let storage = MemoryStorage::new();
        for design in DesignPreference::ALL {
            let mut store = memory_store(&storage);
            store.write(design);
            assert_eq!(store.read(), design);
            // Persisted for the next view that opens the storage
            assert_eq!(memory_store(&storage).read(), design);
        }
    }

    #[test]
    fn test_corrupted_storage_value_falls_back() {
        let mut storage = MemoryStorage::new();
        storage.save(STORAGE_KEY, "3d-hologram").unwrap();
        assert_eq!(memory_store(&storage).read(), DesignPreference::Traditional);
    }

    #[test]
    fn test_unwritable_storage_keeps_value_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let storage = FileStorage::at(blocker.join("preferences.json"));

        let mut store = PreferenceStore::open(Box::new(storage), ViewId::generate());
        store.write(DesignPreference::Anatomical);
        assert_eq!(store.read(), DesignPreference::Anatomical);
    }

    #[test]
    fn test_write_publishes_change() {
        let (tx, rx) = mpsc::channel::<StorageChange>();
        let mut store = memory_store(&MemoryStorage::new()).with_publisher(Box::new(tx));
        store.write(DesignPreference::Clinical);

        let change = rx.try_recv().unwrap();
        assert_eq!(change.key, STORAGE_KEY);
        assert_eq!(change.value.as_deref(), Some("clinical"));
        assert_eq!(change.origin, store.view());
    }

    #[test]
    fn test_remote_change_reaches_other_view_only() {
        let (tx, rx) = mpsc::channel::<StorageChange>();
        let mut a = memory_store(&MemoryStorage::new()).with_publisher(Box::new(tx));
        let mut b = memory_store(&MemoryStorage::new());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_b = Arc::clone(&seen);
        b.subscribe(move |design| seen_by_b.lock().unwrap().push(design));

        a.write(DesignPreference::Anatomical);
        let change = rx.try_recv().unwrap();

        // Echo of its own change leaves A alone
        assert_eq!(a.apply_remote(&change), None);
        assert_eq!(b.apply_remote(&change), Some(DesignPreference::Anatomical));
        assert_eq!(b.read(), DesignPreference::Anatomical);
        assert_eq!(*seen.lock().unwrap(), vec![DesignPreference::Anatomical]);
    }

    #[test]
    fn test_remote_change_filtering() {
        let mut store = memory_store(&MemoryStorage::new());
        let other = ViewId::from(42);

        let unrelated = StorageChange { key: "theme".into(), value: Some("dark".into()), origin: other };
        assert_eq!(store.apply_remote(&unrelated), None);

        store.write(DesignPreference::Clinical);
        let removed = StorageChange { key: STORAGE_KEY.into(), value: None, origin: other };
        assert_eq!(store.apply_remote(&removed), Some(DesignPreference::Traditional));

        let corrupted = StorageChange { key: STORAGE_KEY.into(), value: Some("???".into()), origin: other };
        assert_eq!(store.apply_remote(&corrupted), Some(DesignPreference::Traditional));
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut store = memory_store(&MemoryStorage::new());
        let (tx, rx) = mpsc::channel();
        let id = store.subscribe(move |design| {
            let _ = tx.send(design);
        });
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));

        let change = StorageChange {
            key: STORAGE_KEY.into(),
            value: Some("minimalist".into()),
            origin: ViewId::from(7),
        };
        store.apply_remote(&change);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_view_ids_are_unique() {
        assert_ne!(ViewId::generate(), ViewId::generate());
    }
}
