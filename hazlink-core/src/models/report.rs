use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::rows::{EscalationRow, PreventedRow, TriangulationRow};

/// Row counts of the four correlation relations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationCounts {
    pub so_inc: usize,
    pub nm_inc: usize,
    pub so_nm_inc: usize,
    pub prevented: usize,
}

/// Per-hazard occurrence counts broken down by source dataset. Every
/// matching tag of every record counts, not just the primary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTally {
    pub so: u32,
    pub nm: u32,
    pub inc: u32,
}

/// The full analysis result handed back to external renderers/exporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Vocabulary tags in precedence order (chart axis).
    pub hazards: Vec<String>,
    pub hazard_counts: BTreeMap<String, SourceTally>,
    pub counts: RelationCounts,
    pub so_inc: Vec<EscalationRow>,
    pub nm_inc: Vec<EscalationRow>,
    pub so_nm_inc: Vec<TriangulationRow>,
    pub prevented: Vec<PreventedRow>,
}
