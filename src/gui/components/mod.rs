pub mod design_selector;
pub mod details_panel;
