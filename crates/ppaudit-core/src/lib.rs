//! # ppaudit-core
//!
//! Reconciles a post-processed model archive against the files it should
//! contain.
//!
//! ## Pipeline
//!
//! ```text
//! layout::resolve        pp root → segment label → directories
//!     │
//! series::build_series   directory → end-year → count (gaps synthesized)
//!     │
//! inventory::assemble    directories of one segment → outer-joined table
//!     │
//! report::report         table → missing (label, component, year) cells
//! ```
//!
//! `date` decodes the fixed-width date tokens used in file names and
//! `metadata` recovers the experiment identity needed to request
//! remediation. Nothing here writes to disk or keeps state between runs.

pub mod audit;
pub mod config;
pub mod date;
pub mod error;
pub mod inventory;
pub mod layout;
pub mod metadata;
pub mod report;
pub mod series;

pub use audit::{AuditRun, SegmentAudit, run_audit};
pub use config::{AuditConfig, OutputKind, YearWindow};
pub use date::{DateResolution, MAX_YEAR, MIN_YEAR, ModelDate, Segment, decode};
pub use error::AuditError;
pub use inventory::{InventoryColumn, InventoryTable, assemble};
pub use layout::{PpDirectory, Taxonomy, resolve, segment_label, segment_years};
pub use metadata::{
    ExperimentMetadata, PathTokens, RunIdentity, directory_label, infer_metadata,
};
pub use report::{MissingCell, MissingSummary, component_from_label, report, summarize};
pub use series::{YearCountSeries, build_series, infer_cadence, observe_directory};
