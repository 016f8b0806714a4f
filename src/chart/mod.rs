//! Dental chart data model
//!
//! - **tooth**: universal numbering, quadrants and names
//! - **surface**: surface codes and ordered surface sets
//! - **record**: per-tooth clinical records and treatment history
//! - **store**: the in-memory chart snapshot

pub mod record;
pub mod store;
pub mod surface;
pub mod tooth;

pub use record::{PeriodontalMetrics, ProbingSite, SurfaceDetail, ToothRecord, TreatmentEntry, TreatmentStatus};
pub use store::ToothRecordStore;
pub use surface::{SurfaceCode, SurfaceSet};
pub use tooth::{Arch, Quadrant, ToothNumber};
