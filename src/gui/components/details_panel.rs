use eframe::egui;

use dental_chart::chart::{PeriodontalMetrics, ToothNumber, TreatmentEntry};
use dental_chart::interaction::{DetailsPanel, ToothAction};
use dental_chart::layout::{ClinicalPanel, ClinicalTab, VisualTree};
use dental_chart::taxonomy::Condition;

use super::design_selector::clinical_tabs;
use crate::gui::constants::*;
use crate::gui::painter::color32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    None,
    Tooth(ToothAction, ToothNumber),
    Tab(ClinicalTab),
}

/// Side panel for the focused tooth, or the clinical tabs when present
pub fn ui(ui: &mut egui::Ui, tree: &VisualTree) -> PanelAction {
    let mut action = PanelAction::None;

    egui::ScrollArea::vertical().show(ui, |ui| {
        match (&tree.clinical, &tree.panel) {
            (Some(clinical), _) => action = clinical_ui(ui, clinical),
            (None, Some(panel)) => action = tooth_ui(ui, panel),
            (None, None) => {
                ui.add_space(SECTION_SPACING);
                ui.label("Hover or click a tooth to see its details.");
            }
        }
        legend_ui(ui);
    });

    action
}

fn tooth_ui(ui: &mut egui::Ui, panel: &DetailsPanel) -> PanelAction {
    ui.heading(format!("#{} {}", panel.number, panel.name));
    ui.horizontal(|ui| {
        swatch(ui, panel.condition);
        ui.label(egui::RichText::new(&panel.summary).strong());
    });
    ui.add_space(ITEM_SPACING);

    if !panel.surfaces.is_empty() {
        let names: Vec<&str> = panel.surfaces.iter().map(|s| s.name()).collect();
        ui.label(format!("Surfaces: {}", names.join(", ")));
    }

    if panel.outstanding_treatments > 0 {
        ui.label(format!("Outstanding treatments: {}", panel.outstanding_treatments));
    }

    ui.add_space(ITEM_SPACING);
    let action = action_buttons(ui, panel.number);

    if !panel.treatments.is_empty() {
        ui.add_space(SECTION_SPACING);
        ui.label(egui::RichText::new("Treatments").strong());
        treatments_ui(ui, &panel.treatments);
    }

    if !panel.notes.is_empty() {
        ui.add_space(SECTION_SPACING);
        ui.label(egui::RichText::new("Notes").strong());
        for note in &panel.notes {
            ui.label(format!("• {note}"));
        }
    }

    action
}

fn clinical_ui(ui: &mut egui::Ui, clinical: &ClinicalPanel) -> PanelAction {
    let mut action = PanelAction::None;

    let has_periodontal = clinical.tooth.as_ref().is_some_and(|t| t.periodontal.is_some());
    if let Some(tab) = clinical_tabs(ui, clinical.tab, has_periodontal) {
        action = PanelAction::Tab(tab);
    }
    ui.separator();

    match &clinical.tooth {
        None => {
            ui.label("Select a tooth to review it.");
        }
        Some(tooth) => {
            if let PanelAction::Tooth(a, n) = tooth_header_ui(ui, &tooth.details) {
                action = PanelAction::Tooth(a, n);
            }
            ui.add_space(ITEM_SPACING);

            match clinical.tab {
                ClinicalTab::Surfaces => {
                    egui::Grid::new("clinical_surfaces").striped(true).show(ui, |ui| {
                        for (surface, detail) in &tooth.surfaces {
                            ui.label(surface.name());
                            ui.horizontal(|ui| {
                                swatch(ui, detail.condition);
                                ui.label(detail.condition.style().label);
                            });
                            ui.label(detail.treatment.as_deref().unwrap_or(""));
                            ui.end_row();
                        }
                    });
                }
                ClinicalTab::Treatments => {
                    if tooth.treatments.is_empty() {
                        ui.label("No treatments recorded.");
                    } else {
                        treatments_ui(ui, &tooth.treatments);
                    }
                }
                ClinicalTab::Notes => {
                    if tooth.notes.is_empty() {
                        ui.label("No notes.");
                    }
                    for note in &tooth.notes {
                        ui.label(format!("• {note}"));
                    }
                }
                ClinicalTab::Periodontal => match &tooth.periodontal {
                    Some(metrics) => periodontal_ui(ui, metrics),
                    None => {
                        ui.label("No periodontal measurements.");
                    }
                },
            }
        }
    }

    ui.add_space(SECTION_SPACING);
    ui.collapsing("Treatment codes", |ui| {
        egui::Grid::new("treatment_codes").striped(true).show(ui, |ui| {
            for code in clinical.codes {
                ui.monospace(code.code);
                ui.label(code.description);
                ui.end_row();
            }
        });
    });

    action
}

fn tooth_header_ui(ui: &mut egui::Ui, details: &DetailsPanel) -> PanelAction {
    ui.heading(format!("#{} {}", details.number, details.name));
    ui.horizontal(|ui| {
        swatch(ui, details.condition);
        ui.label(&details.summary);
    });
    action_buttons(ui, details.number)
}

/// One button per tooth action, shared by both panels
fn action_buttons(ui: &mut egui::Ui, number: ToothNumber) -> PanelAction {
    let mut action = PanelAction::None;
    ui.horizontal_wrapped(|ui| {
        for tooth_action in ToothAction::ALL {
            if ui.button(tooth_action.label()).clicked() {
                action = PanelAction::Tooth(tooth_action, number);
            }
        }
    });
    action
}

fn treatments_ui(ui: &mut egui::Ui, treatments: &[TreatmentEntry]) {
    egui::Grid::new("treatments").striped(true).show(ui, |ui| {
        for entry in treatments {
            ui.monospace(&entry.code);
            let surface = entry.surface.map(|s| format!(" ({})", s.letter())).unwrap_or_default();
            ui.label(format!("{}{}", entry.description, surface));
            ui.label(entry.status.label());
            ui.label(entry.date.format("%Y-%m-%d").to_string());
            ui.label(&entry.performed_by);
            ui.end_row();
        }
    });
}

fn periodontal_ui(ui: &mut egui::Ui, metrics: &PeriodontalMetrics) {
    egui::Grid::new("periodontal").show(ui, |ui| {
        for (site, depth) in &metrics.probing_depths {
            ui.label(format!("{site:?}"));
            ui.label(format!("{depth:.1} mm"));
            ui.end_row();
        }
    });
    if let Some(deepest) = metrics.deepest_pocket() {
        ui.label(format!("Deepest pocket: {deepest:.1} mm"));
    }
    ui.label(format!("Bleeding on probing: {}", if metrics.bleeding { "yes" } else { "no" }));
    ui.label(format!("Plaque: {}", if metrics.plaque { "yes" } else { "no" }));
    if let Some(mobility) = metrics.mobility {
        ui.label(format!("Mobility: grade {mobility}"));
    }
}

fn swatch(ui: &mut egui::Ui, condition: Condition) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
    ui.painter().rect_filled(rect, 3.0, color32(condition.style().color));
    ui.painter().rect_stroke(rect, 3.0, egui::Stroke::new(OUTLINE_WIDTH, OUTLINE), egui::StrokeKind::Inside);
}

fn legend_ui(ui: &mut egui::Ui) {
    ui.add_space(SECTION_SPACING);
    ui.separator();
    ui.label(egui::RichText::new("Legend").strong());
    for condition in Condition::ALL {
        ui.horizontal(|ui| {
            swatch(ui, condition);
            ui.label(condition.style().label);
        });
    }
}
