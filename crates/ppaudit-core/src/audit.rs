//! One full reconciliation pass over a pp root.

use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::inventory::{InventoryTable, assemble};
use crate::layout::{Taxonomy, resolve};
use crate::report::{MissingCell, MissingSummary, report, summarize};
use tracing::info;

/// Reconciliation result for one segment length.
#[derive(Debug, Clone)]
pub struct SegmentAudit {
    pub table: InventoryTable,
    pub summaries: Vec<MissingSummary>,
    pub missing: Vec<MissingCell>,
}

impl SegmentAudit {
    pub fn segment(&self) -> &str {
        self.table.segment()
    }
}

/// Result of `run_audit`, rebuilt from the filesystem on every call.
#[derive(Debug, Clone)]
pub struct AuditRun {
    pub taxonomy: Taxonomy,
    pub segments: Vec<SegmentAudit>,
}

impl AuditRun {
    pub fn missing(&self) -> impl Iterator<Item = &MissingCell> {
        self.segments.iter().flat_map(|s| s.missing.iter())
    }

    pub fn missing_count(&self) -> usize {
        self.segments.iter().map(|s| s.missing.len()).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_count() == 0
    }
}

/// Resolve, assemble and report every segment length under the pp root.
pub fn run_audit(config: &AuditConfig) -> Result<AuditRun, AuditError> {
    config.window().validate()?;
    let accept = config.file_predicate();
    let taxonomy = resolve(&config.pp_root, &config.component, config.kind, &accept)?;

    let mut segments = Vec::new();
    for (segment, directories) in &taxonomy.segments {
        let table = assemble(segment, directories, config)?;
        let summaries = summarize(&table);
        let missing = report(&table);
        info!(
            %segment,
            directories = directories.len(),
            missing = missing.len(),
            "segment reconciled"
        );
        segments.push(SegmentAudit {
            table,
            summaries,
            missing,
        });
    }

    Ok(AuditRun { taxonomy, segments })
}
