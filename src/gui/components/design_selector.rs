use eframe::egui;

use dental_chart::layout::{ClinicalTab, Density, Layout};
use dental_chart::preference::DesignPreference;

use crate::gui::constants::*;

/// What the toolbar asked for this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesignAction {
    None,
    SwitchDesign(DesignPreference),
    ToggleDensity,
}

/// Design dropdown plus the controls specific to the mounted layout
pub fn ui(ui: &mut egui::Ui, layout: &Layout, synced: bool) -> DesignAction {
    let mut action = DesignAction::None;
    let current = layout.design();

    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("Design:").strong());

        let mut selected = current;
        egui::ComboBox::from_id_salt("design_selector")
            .selected_text(current.label())
            .show_ui(ui, |ui| {
                for design in DesignPreference::ALL {
                    if ui.selectable_value(&mut selected, design, design.label()).clicked() && design != current {
                        action = DesignAction::SwitchDesign(design);
                    }
                }
            });

        if let Layout::Interactive(ring) = layout {
            ui.add_space(ITEM_SPACING);
            let next = ring.density().toggled();
            if ui.button(format!("Show {}", next.label())).clicked() {
                action = DesignAction::ToggleDensity;
            }
            if ring.density() == Density::Detailed {
                ui.label("Surfaces colored individually");
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if synced {
                ui.colored_label(STATUS_SYNCED, "\u{25CF}  Synced");
            } else {
                ui.colored_label(STATUS_UNSYNCED, "\u{25CF}  Local only");
            }
        });
    });

    action
}

/// Tab strip of the clinical side panel; the periodontal tab needs metrics
pub fn clinical_tabs(ui: &mut egui::Ui, current: ClinicalTab, has_periodontal: bool) -> Option<ClinicalTab> {
    let mut selected = current;
    ui.horizontal(|ui| {
        for tab in ClinicalTab::ALL {
            if tab == ClinicalTab::Periodontal && !has_periodontal {
                continue;
            }
            ui.selectable_value(&mut selected, tab, tab.label());
        }
    });
    (selected != current).then_some(selected)
}
