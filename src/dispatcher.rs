//! Rendering dispatcher
//!
//! Maps a design preference to a mounted layout through a fixed strategy
//! table and keeps the mounted layout in step with the preference store.

use std::sync::mpsc::{self, Receiver};
use tracing::{debug, info};

use crate::layout::{
    AnatomicalArc, ClinicalGrid, CompactRing, Layout, LayoutSettings, LinearGrid, QuadrantBlock,
};
use crate::preference::{self, DesignPreference, SharedPreferenceStore, SubscriptionId};

type LayoutFactory = fn(&LayoutSettings) -> Layout;

const STRATEGY_TABLE: [(DesignPreference, LayoutFactory); 5] = [
    (DesignPreference::Traditional, traditional),
    (DesignPreference::Anatomical, anatomical),
    (DesignPreference::Interactive, interactive),
    (DesignPreference::Minimalist, minimalist),
    (DesignPreference::Clinical, clinical),
];

fn traditional(settings: &LayoutSettings) -> Layout {
    Layout::Traditional(LinearGrid::new(settings.cell_size))
}

fn anatomical(settings: &LayoutSettings) -> Layout {
    Layout::Anatomical(AnatomicalArc::new(settings.arc))
}

fn interactive(settings: &LayoutSettings) -> Layout {
    Layout::Interactive(CompactRing::new(settings.cell_size, settings.ring_density))
}

fn minimalist(settings: &LayoutSettings) -> Layout {
    Layout::Minimalist(QuadrantBlock::new(settings.cell_size))
}

fn clinical(settings: &LayoutSettings) -> Layout {
    Layout::Clinical(ClinicalGrid::new(settings.cell_size))
}

/// Layout for a design preference
pub fn select(design: DesignPreference, settings: &LayoutSettings) -> Layout {
    let factory = STRATEGY_TABLE
        .iter()
        .find(|(key, _)| *key == design)
        .map(|(_, factory)| *factory)
        .unwrap_or(traditional as LayoutFactory);
    factory(settings)
}

/// Layout for a raw stored identifier; anything unknown gets the traditional grid
pub fn select_raw(raw: &str, settings: &LayoutSettings) -> Layout {
    select(DesignPreference::from_str_lossy(raw), settings)
}

/// Owns the mounted layout of one view
pub struct Dispatcher {
    store: SharedPreferenceStore,
    settings: LayoutSettings,
    active: Layout,
    updates: Receiver<DesignPreference>,
    subscription: SubscriptionId,
}

impl Dispatcher {
    pub fn new(store: SharedPreferenceStore, settings: LayoutSettings) -> Self {
        let (tx, updates) = mpsc::channel();
        let (design, subscription) = {
            let mut guard = preference::lock(&store);
            let design = guard.read();
            let subscription = guard.subscribe(move |design| {
                let _ = tx.send(design);
            });
            (design, subscription)
        };

        info!(design = %design, "Mounting layout");
        Self {
            active: select(design, &settings),
            store,
            settings,
            updates,
            subscription,
        }
    }

    pub fn active(&self) -> &Layout {
        &self.active
    }

    pub fn active_mut(&mut self) -> &mut Layout {
        &mut self.active
    }

    pub fn design(&self) -> DesignPreference {
        self.active.design()
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn store(&self) -> &SharedPreferenceStore {
        &self.store
    }

    /// Local choice: persist, announce and remount. Returns true if the layout changed.
    pub fn set_design(&mut self, design: DesignPreference) -> bool {
        preference::lock(&self.store).write(design);
        self.mount(design)
    }

    /// Pick up changes delivered to the store by other views.
    /// Returns true if the layout changed.
    pub fn sync(&mut self) -> bool {
        // Only the newest change matters
        match self.updates.try_iter().last() {
            Some(design) => self.mount(design),
            None => false,
        }
    }

    fn mount(&mut self, design: DesignPreference) -> bool {
        if self.active.design() == design {
            debug!(design = %design, "Layout already mounted");
            return false;
        }
        info!(from = %self.active.design(), to = %design, "Switching layout");
        self.active = select(design, &self.settings);
        true
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        preference::lock(&self.store).unsubscribe(self.subscription);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::preference::STORAGE_KEY;
    use crate::preference::{MemoryStorage, PreferenceStore, StorageChange, ViewId};

    fn shared_store() -> SharedPreferenceStore {
        PreferenceStore::open(Box::new(MemoryStorage::new()), ViewId::generate()).into_shared()
    }

    #[test]
    fn test_table_covers_every_design() {
        let settings = LayoutSettings::default();
        for design in DesignPreference::ALL {
            assert_eq!(select(design, &settings).design(), design);
        }
    }

    #[test]
    fn test_unknown_values_fall_back_to_traditional() {
        let settings = LayoutSettings::default();
        for raw in ["", "holographic", "TRADITIONAL ", "null", "anatomical-v2"] {
            let expected = DesignPreference::parse(raw).unwrap_or(DesignPreference::Traditional);
            assert_eq!(select_raw(raw, &settings).design(), expected, "{raw:?}");
        }
        assert_eq!(select_raw("holographic", &settings), select(DesignPreference::Traditional, &settings));
    }

    #[test]
    fn test_ring_density_comes_from_settings() {
        let settings = LayoutSettings { ring_density: crate::layout::Density::Detailed, ..LayoutSettings::default() };
        match select(DesignPreference::Interactive, &settings) {
            Layout::Interactive(ring) => assert_eq!(ring.density(), crate::layout::Density::Detailed),
            other => panic!("unexpected layout {:?}", other.design()),
        }
    }

    #[test]
    fn test_mounts_stored_design() {
        let store = shared_store();
        preference::lock(&store).write(DesignPreference::Minimalist);
        let dispatcher = Dispatcher::new(store, LayoutSettings::default());
        assert_eq!(dispatcher.design(), DesignPreference::Minimalist);
    }

    #[test]
    fn test_set_design_persists_and_remounts() {
        let store = shared_store();
        let mut dispatcher = Dispatcher::new(store.clone(), LayoutSettings::default());
        assert!(dispatcher.set_design(DesignPreference::Clinical));
        assert!(!dispatcher.set_design(DesignPreference::Clinical));
        assert_eq!(preference::lock(&store).read(), DesignPreference::Clinical);
    }

    #[test]
    fn test_sync_follows_remote_changes_last_write_wins() {
        let store = shared_store();
        let mut dispatcher = Dispatcher::new(store.clone(), LayoutSettings::default());
        assert!(!dispatcher.sync());

        let other = ViewId::from(99);
        for value in ["anatomical", "clinical"] {
            let change = StorageChange { key: STORAGE_KEY.into(), value: Some(value.into()), origin: other };
            preference::lock(&store).apply_remote(&change);
        }
        assert!(dispatcher.sync());
        assert_eq!(dispatcher.design(), DesignPreference::Clinical);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let store = shared_store();
        let dispatcher = Dispatcher::new(store.clone(), LayoutSettings::default());
        drop(dispatcher);
        let change = StorageChange { key: STORAGE_KEY.into(), value: Some("clinical".into()), origin: ViewId::from(5) };
        // No listener left to send into a dropped channel
        assert_eq!(preference::lock(&store).apply_remote(&change), Some(DesignPreference::Clinical));
    }
}
