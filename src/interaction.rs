//! Hover/selection state and outbound intents
//!
//! Every mounted layout owns one [`InteractionState`]. Pointer input is fed
//! through [`InteractionState::handle`], which updates the state and reports
//! user intent to an [`IntentSink`]. The engine never writes clinical data;
//! the sink's owner decides what an intent means.

use serde::Serialize;
use std::sync::mpsc::Sender;
use tracing::{debug, trace};

use crate::chart::{PeriodontalMetrics, SurfaceCode, ToothNumber, ToothRecordStore, TreatmentEntry};
use crate::constants::panel::HEALTHY_SUMMARY;
use crate::taxonomy::{Condition, ConditionStyle};

/// Hover and selection of one mounted layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionState {
    pub hovered: Option<ToothNumber>,
    pub selected: Option<ToothNumber>,
}

/// Pointer-level input, already resolved to a tooth by hit testing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    /// Pointer moved; `None` when it is over no tooth
    Moved(Option<ToothNumber>),
    /// Pointer left the given tooth's region
    Left(ToothNumber),
    /// Pointer left the chart canvas entirely
    LeftCanvas,
    Clicked(ToothNumber),
    /// An action button in the details panel
    Action(ToothAction, ToothNumber),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToothAction {
    AddTreatment,
    ViewHistory,
    AddNote,
}

impl ToothAction {
    /// Every action, in the order the details panels offer them
    pub const ALL: [ToothAction; 3] = [ToothAction::AddTreatment, ToothAction::ViewHistory, ToothAction::AddNote];

    pub fn label(self) -> &'static str {
        match self {
            ToothAction::AddTreatment => "Add treatment",
            ToothAction::ViewHistory => "View history",
            ToothAction::AddNote => "Add note",
        }
    }

    pub fn intent(self, tooth: ToothNumber) -> ChartIntent {
        match self {
            ToothAction::AddTreatment => ChartIntent::AddTreatmentRequested(tooth),
            ToothAction::ViewHistory => ChartIntent::ViewHistoryRequested(tooth),
            ToothAction::AddNote => ChartIntent::AddNoteRequested(tooth),
        }
    }
}

/// What the user asked for, reported to the owner of clinical data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartIntent {
    ToothHovered(Option<ToothNumber>),
    ToothSelected(ToothNumber),
    AddTreatmentRequested(ToothNumber),
    ViewHistoryRequested(ToothNumber),
    AddNoteRequested(ToothNumber),
}

/// Receiver of chart intents
pub trait IntentSink {
    fn emit(&mut self, intent: ChartIntent);
}

impl IntentSink for Vec<ChartIntent> {
    fn emit(&mut self, intent: ChartIntent) {
        self.push(intent);
    }
}

impl IntentSink for Sender<ChartIntent> {
    fn emit(&mut self, intent: ChartIntent) {
        // A dropped receiver means nobody is listening any more
        if self.send(intent).is_err() {
            debug!(intent = ?intent, "Intent receiver gone, dropping intent");
        }
    }
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hovered tooth. Returns true if it changed.
    pub fn hover(&mut self, tooth: Option<ToothNumber>) -> bool {
        let changed = self.hovered != tooth;
        self.hovered = tooth;
        changed
    }

    /// Clear hover if the pointer left the hovered tooth
    pub fn leave(&mut self, tooth: ToothNumber) -> bool {
        if self.hovered == Some(tooth) {
            self.hovered = None;
            true
        } else {
            false
        }
    }

    /// Select a tooth. Selecting the selected tooth again changes nothing.
    pub fn select(&mut self, tooth: ToothNumber) -> bool {
        if self.selected == Some(tooth) {
            return false;
        }
        self.selected = Some(tooth);
        true
    }

    pub fn clear_selection(&mut self) -> bool {
        self.selected.take().is_some()
    }

    /// Tooth the details panel describes: selection wins over hover
    pub fn focus(&self) -> Option<ToothNumber> {
        self.selected.or(self.hovered)
    }

    pub fn is_hovered(&self, tooth: ToothNumber) -> bool {
        self.hovered == Some(tooth)
    }

    pub fn is_selected(&self, tooth: ToothNumber) -> bool {
        self.selected == Some(tooth)
    }

    /// Apply pointer input and report the resulting intents
    pub fn handle(&mut self, event: PointerEvent, sink: &mut dyn IntentSink) {
        trace!(event = ?event, "Interaction event");
        match event {
            PointerEvent::Moved(target) => {
                if self.hover(target) {
                    sink.emit(ChartIntent::ToothHovered(target));
                }
            }
            PointerEvent::Left(tooth) => {
                if self.leave(tooth) {
                    sink.emit(ChartIntent::ToothHovered(None));
                }
            }
            PointerEvent::LeftCanvas => {
                if self.hover(None) {
                    sink.emit(ChartIntent::ToothHovered(None));
                }
            }
            PointerEvent::Clicked(tooth) => {
                if self.select(tooth) {
                    sink.emit(ChartIntent::ToothSelected(tooth));
                }
            }
            PointerEvent::Action(action, tooth) => sink.emit(action.intent(tooth)),
        }
    }
}

/// Content of the details panel for one tooth
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailsPanel {
    pub number: ToothNumber,
    pub name: String,
    pub condition: Condition,
    pub style: ConditionStyle,
    pub summary: String,
    pub surfaces: Vec<SurfaceCode>,
    pub treatments: Vec<TreatmentEntry>,
    pub notes: Vec<String>,
    pub periodontal: Option<PeriodontalMetrics>,
    pub outstanding_treatments: usize,
}

impl DetailsPanel {
    pub fn for_tooth(store: &ToothRecordStore, number: ToothNumber) -> Self {
        let record = store.get(number);
        let summary = if record.is_unremarkable() {
            HEALTHY_SUMMARY.to_string()
        } else if record.surfaces.is_empty() {
            record.condition.to_string()
        } else {
            format!("{} ({})", record.condition, record.surfaces)
        };

        Self {
            number,
            name: number.name(),
            condition: record.condition,
            style: record.condition.style(),
            summary,
            surfaces: record.surfaces.iter().collect(),
            treatments: record.treatments.clone(),
            notes: record.notes.clone(),
            periodontal: record.periodontal.clone(),
            outstanding_treatments: record.outstanding_treatments(),
        }
    }

    /// Panel for whatever the interaction state focuses, if anything
    pub fn for_focus(store: &ToothRecordStore, interaction: &InteractionState) -> Option<Self> {
        interaction.focus().map(|n| Self::for_tooth(store, n))
    }
}
