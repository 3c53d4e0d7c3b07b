//! Report assembler — turns relations and per-hazard tallies into a `Report`
//!
//! The `Report` is the value handed to external collaborators (HTTP
//! rendering, XLSX export). Column schemas and relation display names are
//! fixed here so every exporter agrees on them.

use std::collections::BTreeMap;

use crate::config::HazlinkConfig;
use crate::correlate::{self, CorrelationSet};
use crate::models::{
    EscalationRow, NormalizedRecord, PreventedRow, RawRecord, RecordKind, RelationCounts, Report,
    SourceTally, TriangulationRow,
};
use crate::normalize::normalize_all;
use crate::vocabulary::HazardVocabulary;

/// Relation display names, in summary order.
pub const RELATION_SO_INC: &str = "SO → Incident";
pub const RELATION_NM_INC: &str = "NM → Incident";
pub const RELATION_SO_NM_INC: &str = "SO + NM → Incident";
pub const RELATION_PREVENTED: &str = "Prevented Risks";

pub const SUMMARY_HEADERS: [&str; 2] = ["Metric", "Count"];

pub const SO_INC_HEADERS: [&str; 7] = [
    "SO Plant",
    "SO Zone",
    "Hazard",
    "SO Observation",
    "Incident Plant",
    "Incident Zone",
    "Incident Description",
];

pub const NM_INC_HEADERS: [&str; 7] = [
    "NM Plant",
    "NM Zone",
    "Hazard",
    "NM Observation",
    "Incident Plant",
    "Incident Zone",
    "Incident Description",
];

pub const SO_NM_INC_HEADERS: [&str; 10] = [
    "SO Plant",
    "SO Zone",
    "NM Plant",
    "NM Zone",
    "Hazard",
    "SO Observation",
    "NM Observation",
    "Incident Plant",
    "Incident Zone",
    "Incident Description",
];

pub const PREVENTED_HEADERS: [&str; 8] = [
    "SO Plant",
    "SO Zone",
    "NM Plant",
    "NM Zone",
    "Hazard",
    "SO Observation",
    "NM Observation",
    "Status",
];

/// Per-hazard dataset histogram. Independent of the correlation relations:
/// every matching tag of every record counts, not just the primary. All
/// vocabulary tags are present, zeros kept, so charts get a stable axis.
pub fn tally_hazards(
    so: &[NormalizedRecord],
    nm: &[NormalizedRecord],
    inc: &[NormalizedRecord],
    vocab: &HazardVocabulary,
) -> BTreeMap<String, SourceTally> {
    let mut counts: BTreeMap<String, SourceTally> = vocab
        .tags()
        .map(|t| (t.to_string(), SourceTally::default()))
        .collect();

    let mut bump = |hazards: &[String], pick: fn(&mut SourceTally) -> &mut u32| {
        for tag in hazards {
            if let Some(tally) = counts.get_mut(tag) {
                *pick(tally) += 1;
            }
        }
    };
    for r in so {
        bump(&r.hazards, |t| &mut t.so);
    }
    for r in nm {
        bump(&r.hazards, |t| &mut t.nm);
    }
    for r in inc {
        bump(&r.hazards, |t| &mut t.inc);
    }
    counts
}

/// Assemble the final report from the four relations and the hazard tally.
pub fn assemble(
    so_inc: CorrelationSet<EscalationRow>,
    nm_inc: CorrelationSet<EscalationRow>,
    so_nm_inc: CorrelationSet<TriangulationRow>,
    prevented: CorrelationSet<PreventedRow>,
    hazard_counts: BTreeMap<String, SourceTally>,
    vocab: &HazardVocabulary,
) -> Report {
    let counts = RelationCounts {
        so_inc: so_inc.len(),
        nm_inc: nm_inc.len(),
        so_nm_inc: so_nm_inc.len(),
        prevented: prevented.len(),
    };
    Report {
        hazards: vocab.tags().map(str::to_string).collect(),
        hazard_counts,
        counts,
        so_inc: so_inc.into_rows(),
        nm_inc: nm_inc.into_rows(),
        so_nm_inc: so_nm_inc.into_rows(),
        prevented: prevented.into_rows(),
    }
}

/// The one-call pipeline: normalize → classify → correlate → assemble.
///
/// Pure given its inputs; builds fresh entities per call and shares nothing
/// across calls.
pub fn analyze(
    so_raw: &[RawRecord],
    nm_raw: &[RawRecord],
    inc_raw: &[RawRecord],
    config: &HazlinkConfig,
) -> Report {
    let vocab = config.analysis.vocabulary();
    let policy = config.analysis.match_policy;
    let fields = &config.fields;

    let so = normalize_all(so_raw, RecordKind::Observation, fields, &vocab);
    let nm = normalize_all(nm_raw, RecordKind::NearMiss, fields, &vocab);
    let inc = normalize_all(inc_raw, RecordKind::Incident, fields, &vocab);

    tracing::debug!(
        so = so.len(),
        nm = nm.len(),
        inc = inc.len(),
        policy = ?policy,
        "Running correlation analysis"
    );

    let so_inc = correlate::escalations(&so, &inc, policy);
    let nm_inc = correlate::escalations(&nm, &inc, policy);
    let so_nm_inc = correlate::triangulations(&so, &nm, &inc, policy);
    let prevented = correlate::prevented(&so, &nm, &inc, policy, &vocab);
    let hazard_counts = tally_hazards(&so, &nm, &inc, &vocab);

    assemble(so_inc, nm_inc, so_nm_inc, prevented, hazard_counts, &vocab)
}

// ============================================================================
// TESTS
// ============================================================================
