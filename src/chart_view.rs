//! One mounted chart view
//!
//! Ties a chart snapshot, the dispatcher's active layout and the view's
//! interaction state together, and applies design changes coming from other
//! views. Remounting a layout starts it with fresh hover/selection.

use std::sync::mpsc::Receiver;
use tracing::{debug, info};

use crate::chart::{ToothNumber, ToothRecordStore};
use crate::dispatcher::Dispatcher;
use crate::interaction::{IntentSink, InteractionState, PointerEvent, ToothAction};
use crate::layout::{ClinicalTab, Density, Layout, LayoutSettings, Point, VisualTree};
use crate::preference::{self, DesignPreference, SharedPreferenceStore, StorageChange};

pub struct ChartView {
    records: ToothRecordStore,
    dispatcher: Dispatcher,
    interaction: InteractionState,
    remote: Option<Receiver<StorageChange>>,
}

impl ChartView {
    pub fn mount(records: ToothRecordStore, store: SharedPreferenceStore, settings: LayoutSettings) -> Self {
        let dispatcher = Dispatcher::new(store, settings);
        info!(design = %dispatcher.design(), records = records.len(), "Chart view mounted");
        Self {
            records,
            dispatcher,
            interaction: InteractionState::new(),
            remote: None,
        }
    }

    /// Receive changes relayed from other views
    pub fn with_remote(mut self, remote: Receiver<StorageChange>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn records(&self) -> &ToothRecordStore {
        &self.records
    }

    /// A fresh snapshot from the owner of the chart data
    pub fn replace_records(&mut self, records: ToothRecordStore) {
        debug!(records = records.len(), "Chart snapshot replaced");
        self.records = records;
    }

    pub fn layout(&self) -> &Layout {
        self.dispatcher.active()
    }

    pub fn design(&self) -> DesignPreference {
        self.dispatcher.design()
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn render(&self) -> VisualTree {
        self.dispatcher.active().render(&self.records, &self.interaction)
    }

    /// Feed resolved pointer input through the active layout
    pub fn pointer(&mut self, event: PointerEvent, sink: &mut dyn IntentSink) {
        self.dispatcher.active().emit(&mut self.interaction, event, sink);
    }

    /// Hit-test a canvas position and feed the result as hover (and click)
    pub fn pointer_at(&mut self, position: Option<Point>, clicked: bool, sink: &mut dyn IntentSink) {
        let Some(position) = position else {
            self.pointer(PointerEvent::LeftCanvas, sink);
            return;
        };
        let target = self.render().hit_test(position);
        self.pointer(PointerEvent::Moved(target), sink);
        if clicked && let Some(tooth) = target {
            self.pointer(PointerEvent::Clicked(tooth), sink);
        }
    }

    pub fn action(&mut self, action: ToothAction, tooth: ToothNumber, sink: &mut dyn IntentSink) {
        self.pointer(PointerEvent::Action(action, tooth), sink);
    }

    /// Local design choice. Returns true if the layout was remounted.
    pub fn set_design(&mut self, design: DesignPreference) -> bool {
        let changed = self.dispatcher.set_design(design);
        if changed {
            self.interaction = InteractionState::new();
        }
        changed
    }

    /// Apply changes from other views. Returns true if the layout was remounted.
    pub fn poll_remote(&mut self) -> bool {
        if let Some(remote) = &self.remote {
            let store = self.dispatcher.store();
            for change in remote.try_iter() {
                preference::lock(store).apply_remote(&change);
            }
        }
        let changed = self.dispatcher.sync();
        if changed {
            self.interaction = InteractionState::new();
        }
        changed
    }

    /// Switch the compact ring between overview and detailed glyphs
    pub fn toggle_density(&mut self) -> Option<Density> {
        match self.dispatcher.active_mut() {
            Layout::Interactive(ring) => Some(ring.toggle_density()),
            _ => None,
        }
    }

    pub fn set_clinical_tab(&mut self, tab: ClinicalTab) -> bool {
        match self.dispatcher.active_mut() {
            Layout::Clinical(grid) => {
                grid.set_tab(tab);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{SurfaceCode, ToothRecord, TreatmentEntry, TreatmentStatus};
    use crate::interaction::ChartIntent;
    use crate::preference::{MemoryStorage, PreferenceStore, ViewId};
    use crate::taxonomy::{style, Condition};
    use chrono::NaiveDate;
    use std::sync::mpsc;

    fn tooth(n: u8) -> ToothNumber {
        ToothNumber::new(n).unwrap()
    }

    fn view_over(storage: &MemoryStorage, records: ToothRecordStore) -> ChartView {
        let store = PreferenceStore::open(Box::new(storage.clone()), ViewId::generate()).into_shared();
        ChartView::mount(records, store, LayoutSettings::default())
    }

    #[test]
    fn test_empty_chart_renders_healthy_everywhere() {
        let storage = MemoryStorage::new();
        let mut view = view_over(&storage, ToothRecordStore::new());
        let mut intents: Vec<ChartIntent> = Vec::new();

        for design in DesignPreference::ALL {
            view.set_design(design);
            let tree = view.render();
            assert_eq!(tree.teeth.len(), 32);
            assert!(tree.teeth.iter().all(|g| g.condition == Condition::Healthy));

            view.pointer(PointerEvent::Clicked(tooth(30)), &mut intents);
            let panel = view.render().panel.unwrap();
            assert_eq!(panel.number, tooth(30));
            assert_eq!(panel.summary, "Healthy tooth");
        }
    }

    #[test]
    fn test_cavity_record_renders_and_lists_surfaces_in_order() {
        let mut records = ToothRecordStore::new();
        records.set(14, ToothRecord::new(tooth(14), Condition::Cavity).with_surfaces([SurfaceCode::M, SurfaceCode::O]));
        let storage = MemoryStorage::new();
        let mut view = view_over(&storage, records);
        let mut intents: Vec<ChartIntent> = Vec::new();

        for design in DesignPreference::ALL {
            view.set_design(design);
            view.pointer(PointerEvent::Clicked(tooth(14)), &mut intents);
            let tree = view.render();
            assert_eq!(tree.glyph(tooth(14)).unwrap().fill, style(Condition::Cavity).color);
            assert_eq!(tree.panel.unwrap().surfaces, vec![SurfaceCode::M, SurfaceCode::O]);
        }
    }

    #[test]
    fn test_second_view_follows_design_change_without_reload() {
        let (tx, rx) = mpsc::channel::<StorageChange>();
        let (relay_tx, relay_rx) = mpsc::channel();

        let store_a = PreferenceStore::open(Box::new(MemoryStorage::new()), ViewId::generate())
            .with_publisher(Box::new(tx))
            .into_shared();
        let store_b = PreferenceStore::open(Box::new(MemoryStorage::new()), ViewId::generate()).into_shared();

        let mut a = ChartView::mount(ToothRecordStore::new(), store_a, LayoutSettings::default());
        let mut b = ChartView::mount(ToothRecordStore::new(), store_b, LayoutSettings::default()).with_remote(relay_rx);
        assert_eq!(b.design(), DesignPreference::Traditional);

        assert!(a.set_design(DesignPreference::Anatomical));
        // Stand-in for the hub: relay A's change to B
        relay_tx.send(rx.try_recv().unwrap()).unwrap();

        assert!(b.poll_remote());
        assert_eq!(b.design(), DesignPreference::Anatomical);
        assert!(matches!(b.layout(), Layout::Anatomical(_)));
        assert!(!b.poll_remote());
        // A does not react to anything
        assert!(!a.poll_remote());
    }

    #[test]
    fn test_treatment_status_update_keeps_history_length() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
        let mut records = ToothRecordStore::new();
        records.set(3, ToothRecord::new(tooth(3), Condition::Cavity));
        records.upsert_treatment(tooth(3), TreatmentEntry::new("D2391", "Composite", date, "Dr. Ortiz", TreatmentStatus::Planned));

        let storage = MemoryStorage::new();
        let mut view = view_over(&storage, records.clone());
        view.set_design(DesignPreference::Clinical);
        assert_eq!(view.render().glyph(tooth(3)).unwrap().badge, Some(1));

        records.upsert_treatment(tooth(3), TreatmentEntry::new("D2391", "Composite", date, "Dr. Ortiz", TreatmentStatus::Completed));
        view.replace_records(records);

        let record = view.records().get(tooth(3));
        assert_eq!(record.treatments.len(), 1);
        assert_eq!(record.treatments[0].status, TreatmentStatus::Completed);
        assert_eq!(view.render().glyph(tooth(3)).unwrap().badge, None);
    }

    #[test]
    fn test_pointer_at_hit_tests_and_selects_once() {
        let storage = MemoryStorage::new();
        let mut view = view_over(&storage, ToothRecordStore::new());
        let center = view.render().glyph(tooth(9)).unwrap().placement.center;
        let mut intents: Vec<ChartIntent> = Vec::new();

        view.pointer_at(Some(center), true, &mut intents);
        view.pointer_at(Some(center), true, &mut intents);
        assert_eq!(
            intents,
            vec![ChartIntent::ToothHovered(Some(tooth(9))), ChartIntent::ToothSelected(tooth(9))]
        );

        view.pointer_at(None, false, &mut intents);
        assert_eq!(intents.last(), Some(&ChartIntent::ToothHovered(None)));
        assert_eq!(view.interaction().selected, Some(tooth(9)));
    }

    #[test]
    fn test_actions_are_reported_not_applied() {
        let storage = MemoryStorage::new();
        let mut view = view_over(&storage, ToothRecordStore::new());
        let mut intents: Vec<ChartIntent> = Vec::new();
        view.action(ToothAction::AddNote, tooth(2), &mut intents);
        assert_eq!(intents, vec![ChartIntent::AddNoteRequested(tooth(2))]);
        assert!(view.records().is_empty());
    }

    #[test]
    fn test_remount_resets_interaction() {
        let storage = MemoryStorage::new();
        let mut view = view_over(&storage, ToothRecordStore::new());
        view.pointer(PointerEvent::Clicked(tooth(5)), &mut Vec::<ChartIntent>::new());
        assert!(view.set_design(DesignPreference::Minimalist));
        assert_eq!(*view.interaction(), InteractionState::new());
    }

    #[test]
    fn test_layout_specific_controls() {
        let storage = MemoryStorage::new();
        let mut view = view_over(&storage, ToothRecordStore::new());
        assert_eq!(view.toggle_density(), None);
        assert!(!view.set_clinical_tab(ClinicalTab::Notes));

        view.set_design(DesignPreference::Interactive);
        assert_eq!(view.toggle_density(), Some(Density::Detailed));

        view.set_design(DesignPreference::Clinical);
        assert!(view.set_clinical_tab(ClinicalTab::Treatments));
        assert_eq!(view.render().clinical.unwrap().tab, ClinicalTab::Treatments);
    }
}
