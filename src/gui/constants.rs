//! GUI-specific constants for layout, colors and intervals

use egui;

/// Minimum window dimensions
pub const WINDOW_MIN_WIDTH: f32 = 640.0;
pub const WINDOW_MIN_HEIGHT: f32 = 480.0;

/// Layout spacing
pub const PADDING: f32 = 8.0;
pub const SECTION_SPACING: f32 = 15.0;
pub const ITEM_SPACING: f32 = 8.0;
pub const DETAILS_PANEL_WIDTH: f32 = 320.0;

/// Largest zoom applied to a layout's canvas
pub const MAX_CANVAS_SCALE: f32 = 2.0;

/// Glyph outlines
pub const OUTLINE: egui::Color32 = egui::Color32::from_rgb(75, 85, 99);
pub const OUTLINE_WIDTH: f32 = 1.0;
pub const HOVER_OUTLINE: egui::Color32 = egui::Color32::from_rgb(14, 165, 233);
pub const SELECTED_OUTLINE: egui::Color32 = egui::Color32::from_rgb(2, 132, 199);
pub const HIGHLIGHT_WIDTH: f32 = 3.0;

/// Group backgrounds and guides
pub const GROUP_FILL: egui::Color32 = egui::Color32::from_rgba_premultiplied(100, 116, 139, 20);
pub const GROUP_HIGHLIGHT_FILL: egui::Color32 = egui::Color32::from_rgba_premultiplied(14, 165, 233, 40);
pub const GUIDE: egui::Color32 = egui::Color32::from_rgb(148, 163, 184);

/// Treatment badge
pub const BADGE_FILL: egui::Color32 = egui::Color32::from_rgb(220, 38, 38);
pub const BADGE_RADIUS: f32 = 8.0;

/// Text drawn on glyphs
pub const LABEL_DARK: egui::Color32 = egui::Color32::from_rgb(17, 24, 39);
pub const LABEL_LIGHT: egui::Color32 = egui::Color32::WHITE;
pub const LABEL_SIZE: f32 = 13.0;
pub const TAG_SIZE: f32 = 10.0;

/// Sync status
pub const STATUS_SYNCED: egui::Color32 = egui::Color32::from_rgb(0, 200, 0);
pub const STATUS_UNSYNCED: egui::Color32 = egui::Color32::from_rgb(200, 200, 0);

/// How often remote design changes are picked up
pub const SYNC_POLL_INTERVAL_MS: u64 = 250;

/// Waiting for a freshly spawned hub to accept connections
pub const HUB_CONNECT_ATTEMPTS: u32 = 10;
pub const HUB_CONNECT_RETRY_MS: u64 = 50;
