//! Application-wide constants
//!
//! This module contains the magic numbers and string literals used throughout
//! the engine, providing a single source of truth for constant values.

/// Persisted storage locations
pub mod paths {
    /// Directory under the platform config/runtime dirs
    pub const APP_DIR: &str = "dental-chart";

    /// Application configuration file
    pub const CONFIG_FILENAME: &str = "config.json";

    /// Key/value storage area holding the design preference
    pub const PREFERENCES_FILENAME: &str = "preferences.json";

    /// Sync hub socket file name
    pub const SOCKET_FILENAME: &str = "sync.sock";
}

/// Design preference storage
pub mod preference {
    /// Storage key holding the active layout identifier
    pub const STORAGE_KEY: &str = "dental_chart_design";
}

/// Universal numbering layout of a full adult mouth
pub mod dentition {
    /// Number of teeth in a full-mouth chart
    pub const TOOTH_COUNT: u8 = 32;

    /// Teeth per quadrant
    pub const QUADRANT_SIZE: u8 = 8;

    /// Teeth per jaw
    pub const ARCH_SIZE: u8 = 16;
}

/// Anatomical arc placement
pub mod arc {
    /// Angular step between neighbouring teeth on an arc (degrees)
    pub const STEP_DEGREES: f32 = 22.5;

    /// Quadrant offsets (degrees)
    pub const OFFSET_UPPER_RIGHT: f32 = -90.0;
    pub const OFFSET_UPPER_LEFT: f32 = 90.0;
    pub const OFFSET_LOWER_RIGHT: f32 = 0.0;
    pub const OFFSET_LOWER_LEFT: f32 = 180.0;

    /// Default arc radius in canvas units
    pub const DEFAULT_RADIUS: f32 = 150.0;

    /// Default tooth glyph size on the arc
    pub const DEFAULT_TOOTH_WIDTH: f32 = 34.0;
    pub const DEFAULT_TOOTH_HEIGHT: f32 = 44.0;

    /// Space between the two jaw rings
    pub const DEFAULT_JAW_GAP: f32 = 40.0;
}

/// Grid-based layouts
pub mod grid {
    /// Default cell edge length
    pub const DEFAULT_CELL_SIZE: f32 = 48.0;

    /// Accepted cell edge lengths
    pub const MIN_CELL_SIZE: f32 = 8.0;
    pub const MAX_CELL_SIZE: f32 = 256.0;

    /// Space between cells
    pub const CELL_GAP: f32 = 6.0;

    /// Space between rows/sections
    pub const ROW_GAP: f32 = 24.0;

    /// Columns in a clinical grid section
    pub const CLINICAL_COLUMNS: u8 = 8;

    /// Gap around the crosshair in the quadrant layout
    pub const CROSSHAIR_GAP: f32 = 28.0;

    /// Maximum bow of the compact-ring rows
    pub const RING_BOW: f32 = 36.0;
}

/// Cross-view synchronization
pub mod ipc {
    /// Maximum frame size (64 KiB); preference frames are tiny
    pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;
}

/// Details panel text
pub mod panel {
    /// Summary shown for a tooth without a stored record
    pub const HEALTHY_SUMMARY: &str = "Healthy tooth";
}
