//! Correlation engine — the four hazard relations over the three datasets
//!
//! All four operations are pure over pre-normalized record slices:
//! - SO→Incident and NM→Incident share one escalation algorithm
//! - SO+NM→Incident triangulates all three datasets via a bucket-join
//!   (group each dataset by hazard tag, then walk per-tag cross products)
//!   instead of the naive `|SO| × |NM| × |INC|` triple loop
//! - Prevented Risks pairs observations with near-misses for every tag
//!   that never produced an incident
//!
//! The escalation relations dedup on `(tag, incident identity key)`; the
//! prevented relation deliberately does not dedup at all. The two scopes
//! differ in output cardinality and must stay separate.
//!
//! Row order follows the iteration order of the outer dataset.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{EscalationRow, NormalizedRecord, PreventedRow, TriangulationRow};
use crate::vocabulary::HazardVocabulary;

/// Status label carried by every prevented-risk row.
pub const PREVENTED_STATUS: &str = "PREVENTED";

/// How two records are judged hazard-equivalent.
///
/// `PrimaryMatch` compares the single highest-precedence hazard of each
/// record; `AnyOverlapMatch` tests full hazard-set intersection and expands
/// one row per shared tag. Both appear in the field; the choice is explicit
/// configuration, never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    #[default]
    PrimaryMatch,
    AnyOverlapMatch,
}

/// Rows of one relation plus the dedup keys already emitted.
#[derive(Debug)]
pub struct CorrelationSet<R> {
    rows: Vec<R>,
    seen: HashSet<(String, String)>,
}

impl<R> CorrelationSet<R> {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Push a row keyed by `(tag, terminal)`, dropping duplicates silently.
    /// Returns whether the row was emitted.
    fn push_keyed(&mut self, tag: &str, terminal: &str, row: impl FnOnce() -> R) -> bool {
        if self.seen.insert((tag.to_string(), terminal.to_string())) {
            self.rows.push(row());
            true
        } else {
            false
        }
    }

    /// Push an unkeyed row (prevented relation only).
    fn push(&mut self, row: R) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }
}

impl<R> Default for CorrelationSet<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// The tags a record contributes under the policy: the primary hazard
/// alone, or every matched hazard.
fn match_tags(rec: &NormalizedRecord, policy: MatchPolicy) -> Vec<&str> {
    match policy {
        MatchPolicy::PrimaryMatch => rec
            .primary_hazard
            .as_deref()
            .map(|t| vec![t])
            .unwrap_or_default(),
        MatchPolicy::AnyOverlapMatch => rec.hazards.iter().map(String::as_str).collect(),
    }
}

fn matches_tag(rec: &NormalizedRecord, tag: &str, policy: MatchPolicy) -> bool {
    match policy {
        MatchPolicy::PrimaryMatch => rec.primary_hazard.as_deref() == Some(tag),
        MatchPolicy::AnyOverlapMatch => rec.hazards.iter().any(|t| t == tag),
    }
}

/// Group records by contributed tag, preserving dataset order per bucket.
fn bucket_by_tag<'a>(
    records: &'a [NormalizedRecord],
    policy: MatchPolicy,
) -> HashMap<&'a str, Vec<&'a NormalizedRecord>> {
    let mut buckets: HashMap<&str, Vec<&NormalizedRecord>> = HashMap::new();
    for rec in records {
        for tag in match_tags(rec, policy) {
            buckets.entry(tag).or_default().push(rec);
        }
    }
    buckets
}

fn terminal_key(inc: &NormalizedRecord) -> &str {
    // Normalization always assigns incidents an identity key.
    inc.identity_key.as_deref().unwrap_or("")
}

/// Escalation relation: source dataset (SO or NM) → incidents.
///
/// One row per matching hazard tag, keyed by `(tag, incident identity)`.
/// Under `PrimaryMatch` a (source, incident) pair yields at most one row.
pub fn escalations(
    sources: &[NormalizedRecord],
    incidents: &[NormalizedRecord],
    policy: MatchPolicy,
) -> CorrelationSet<EscalationRow> {
    let inc_by_tag = bucket_by_tag(incidents, policy);
    let mut set = CorrelationSet::new();

    for src in sources {
        for tag in match_tags(src, policy) {
            let Some(bucket) = inc_by_tag.get(tag) else {
                continue;
            };
            for inc in bucket {
                set.push_keyed(tag, terminal_key(inc), || EscalationRow {
                    source_site: src.site.clone(),
                    hazard: tag.to_string(),
                    source_text: src.text.clone(),
                    incident_site: inc.site.clone(),
                    incident_text: inc.text.clone(),
                });
            }
        }
    }
    set
}

/// Triangulation relation: SO + NM → incidents.
///
/// All three records must share a tag under the policy. NM and INC are
/// pre-bucketed by tag so the cost is per-bucket cross products rather than
/// the full cubic loop; output semantics and SO-major ordering are
/// unchanged. Keyed by `(tag, incident identity)`.
pub fn triangulations(
    so: &[NormalizedRecord],
    nm: &[NormalizedRecord],
    incidents: &[NormalizedRecord],
    policy: MatchPolicy,
) -> CorrelationSet<TriangulationRow> {
    let nm_by_tag = bucket_by_tag(nm, policy);
    let inc_by_tag = bucket_by_tag(incidents, policy);
    let mut set = CorrelationSet::new();

    for so_rec in so {
        for tag in match_tags(so_rec, policy) {
            let (Some(nms), Some(incs)) = (nm_by_tag.get(tag), inc_by_tag.get(tag)) else {
                continue;
            };
            for nm_rec in nms {
                for inc in incs {
                    set.push_keyed(tag, terminal_key(inc), || TriangulationRow {
                        so_site: so_rec.site.clone(),
                        nm_site: nm_rec.site.clone(),
                        hazard: tag.to_string(),
                        so_text: so_rec.text.clone(),
                        nm_text: nm_rec.text.clone(),
                        incident_site: inc.site.clone(),
                        incident_text: inc.text.clone(),
                    });
                }
            }
        }
    }
    set
}

/// Prevented-risks relation: for every vocabulary tag with zero matching
/// incidents, one row per (SO, NM) pair that both match the tag.
///
/// No dedup key — the cross-product cardinality is the contract here,
/// unlike the escalation relations.
pub fn prevented(
    so: &[NormalizedRecord],
    nm: &[NormalizedRecord],
    incidents: &[NormalizedRecord],
    policy: MatchPolicy,
    vocab: &HazardVocabulary,
) -> CorrelationSet<PreventedRow> {
    let mut set = CorrelationSet::new();

    for tag in vocab.tags() {
        let realized = incidents.iter().any(|inc| matches_tag(inc, tag, policy));
        if realized {
            continue;
        }
        for so_rec in so.iter().filter(|r| matches_tag(r, tag, policy)) {
            for nm_rec in nm.iter().filter(|r| matches_tag(r, tag, policy)) {
                set.push(PreventedRow {
                    so_site: so_rec.site.clone(),
                    nm_site: nm_rec.site.clone(),
                    hazard: tag.to_string(),
                    so_text: so_rec.text.clone(),
                    nm_text: nm_rec.text.clone(),
                    status: PREVENTED_STATUS.to_string(),
                });
            }
        }
    }
    set
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordKind;

    fn rec(
        kind: RecordKind,
        text: &str,
        hazards: &[&str],
        identity: Option<&str>,
    ) -> NormalizedRecord {
        let vocab = HazardVocabulary::builtin();
        let hazards: Vec<String> = hazards.iter().map(|s| s.to_string()).collect();
        NormalizedRecord {
            kind,
            text: text.to_string(),
            primary_hazard: vocab.primary(&hazards).map(str::to_string),
            hazards,
            site: vec!["P1".to_string(), "Z1".to_string()],
            identity_key: identity.map(str::to_string),
        }
    }

    fn so(text: &str, hazards: &[&str]) -> NormalizedRecord {
        rec(RecordKind::Observation, text, hazards, None)
    }

    fn nm(text: &str, hazards: &[&str]) -> NormalizedRecord {
        rec(RecordKind::NearMiss, text, hazards, None)
    }

    fn inc(text: &str, hazards: &[&str], identity: &str) -> NormalizedRecord {
        rec(RecordKind::Incident, text, hazards, Some(identity))
    }

    // ========================================================================
    // TEST 1: escalation matches on shared primary hazard
    // ========================================================================
    #[test]
    fn test_escalation_primary_match() {
        let sources = vec![nm("slipped near wet floor", &["slip"])];
        let incidents = vec![inc("worker slipped and fell", &["slip", "fall"], "T100")];
        let set = escalations(&sources, &incidents, MatchPolicy::PrimaryMatch);
        assert_eq!(set.len(), 1);
        let row = &set.rows()[0];
        assert_eq!(row.hazard, "slip");
        assert_eq!(row.incident_text, "worker slipped and fell");
    }

    // ========================================================================
    // TEST 2: primary-match emits nothing when primaries differ
    // ========================================================================
    #[test]
    fn test_escalation_primary_mismatch() {
        // Shared non-primary tag "fall": slip outranks fall on the incident
        let sources = vec![nm("nearly fell", &["fall"])];
        let incidents = vec![inc("slipped and fell", &["slip", "fall"], "T1")];
        let set = escalations(&sources, &incidents, MatchPolicy::PrimaryMatch);
        assert!(set.is_empty());
    }

    // ========================================================================
    // TEST 3: any-overlap matches on shared non-primary tags, row per tag
    // ========================================================================
    #[test]
    fn test_escalation_any_overlap() {
        let sources = vec![nm("slipped and nearly fell", &["slip", "fall"])];
        let incidents = vec![inc("slipped and fell", &["slip", "fall"], "T1")];
        let set = escalations(&sources, &incidents, MatchPolicy::AnyOverlapMatch);
        let tags: Vec<&str> = set.rows().iter().map(|r| r.hazard.as_str()).collect();
        assert_eq!(tags, vec!["slip", "fall"]);
    }

    // ========================================================================
    // TEST 4: duplicate (tag, identity) keys are dropped silently
    // ========================================================================
    #[test]
    fn test_escalation_dedup_shared_identity() {
        let sources = vec![
            nm("slipped in aisle 1", &["slip"]),
            nm("slipped in aisle 2", &["slip"]),
        ];
        // Two incidents sharing treatment number T200
        let incidents = vec![
            inc("slipped at press", &["slip"], "T200"),
            inc("slipped at lathe", &["slip"], "T200"),
        ];
        let set = escalations(&sources, &incidents, MatchPolicy::PrimaryMatch);
        assert_eq!(set.len(), 1, "one row per (tag, identity) key");
        assert_eq!(set.rows()[0].source_text, "slipped in aisle 1");
    }

    // ========================================================================
    // TEST 5: escalation rows are unique under the declared dedup key
    // ========================================================================
    #[test]
    fn test_escalation_rows_unique_under_key() {
        let sources = vec![
            nm("slipped on oil", &["slip"]),
            nm("oily floor", &["slip"]),
            nm("tripped over cable", &["trip"]),
        ];
        let incidents = vec![
            inc("slip injury", &["slip"], "A"),
            inc("slip injury again", &["slip"], "B"),
            inc("trip injury", &["trip"], "A"),
        ];
        let set = escalations(&sources, &incidents, MatchPolicy::PrimaryMatch);
        let mut keys: Vec<(String, String)> = set
            .rows()
            .iter()
            .map(|r| (r.hazard.clone(), r.incident_text.clone()))
            .collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), before);
        assert_eq!(set.len(), 3);
    }

    // ========================================================================
    // TEST 6: triangulation requires all three to share a tag
    // ========================================================================
    #[test]
    fn test_triangulation_all_three_share() {
        let so_recs = vec![so("oil spill on floor", &["slip"])];
        let nm_recs = vec![nm("slipped near wet floor", &["slip"])];
        let incidents = vec![inc("worker slipped and fell", &["slip", "fall"], "T100")];
        let set = triangulations(&so_recs, &nm_recs, &incidents, MatchPolicy::PrimaryMatch);
        assert_eq!(set.len(), 1);
        assert_eq!(set.rows()[0].hazard, "slip");

        // Break the chain: near-miss about something else
        let nm_recs = vec![nm("sharp burr on part", &["cut"])];
        let set = triangulations(&so_recs, &nm_recs, &incidents, MatchPolicy::PrimaryMatch);
        assert!(set.is_empty());
    }

    // ========================================================================
    // TEST 7: triangulation bucket-join dedups by (tag, incident identity)
    // ========================================================================
    #[test]
    fn test_triangulation_dedup() {
        let so_recs = vec![
            so("oil on floor bay 1", &["slip"]),
            so("oil on floor bay 2", &["slip"]),
        ];
        let nm_recs = vec![
            nm("slipped bay 1", &["slip"]),
            nm("slipped bay 2", &["slip"]),
        ];
        let incidents = vec![inc("slip injury", &["slip"], "T1")];
        let set = triangulations(&so_recs, &nm_recs, &incidents, MatchPolicy::PrimaryMatch);
        // 2×2×1 qualifying triples collapse to one row for (slip, T1)
        assert_eq!(set.len(), 1);
        assert_eq!(set.rows()[0].so_text, "oil on floor bay 1");
        assert_eq!(set.rows()[0].nm_text, "slipped bay 1");
    }

    // ========================================================================
    // TEST 8: prevented fires only for tags with zero incidents
    // ========================================================================
    #[test]
    fn test_prevented_zero_incident_tags() {
        let vocab = HazardVocabulary::builtin();
        let so_recs = vec![so("sharp knife left out", &["cut"])];
        let nm_recs = vec![nm("nearly cut by burr", &["cut"])];
        let incidents = vec![inc("slip injury", &["slip"], "T1")];
        let set = prevented(&so_recs, &nm_recs, &incidents, MatchPolicy::PrimaryMatch, &vocab);
        assert_eq!(set.len(), 1);
        assert_eq!(set.rows()[0].hazard, "cut");
        assert_eq!(set.rows()[0].status, PREVENTED_STATUS);

        // A cut incident removes the tag from the relation entirely
        let incidents = vec![inc("cut injury", &["cut"], "T2")];
        let set = prevented(&so_recs, &nm_recs, &incidents, MatchPolicy::PrimaryMatch, &vocab);
        assert!(set.is_empty());
    }

    // ========================================================================
    // TEST 9: prevented keeps the full cross-product (no dedup)
    // ========================================================================
    #[test]
    fn test_prevented_cross_product_not_deduped() {
        let vocab = HazardVocabulary::builtin();
        let so_recs = vec![
            so("knife on bench", &["cut"]),
            so("burr on casting", &["cut"]),
        ];
        let nm_recs = vec![
            nm("nearly cut restocking", &["cut"]),
            nm("sharp edge near grip", &["cut"]),
        ];
        let set = prevented(&so_recs, &nm_recs, &[], MatchPolicy::PrimaryMatch, &vocab);
        assert_eq!(set.len(), 4, "2 SO × 2 NM pairs all kept");
    }

    // ========================================================================
    // TEST 10: empty datasets yield empty relations, never errors
    // ========================================================================
    #[test]
    fn test_empty_datasets() {
        let vocab = HazardVocabulary::builtin();
        assert!(escalations(&[], &[], MatchPolicy::PrimaryMatch).is_empty());
        assert!(triangulations(&[], &[], &[], MatchPolicy::AnyOverlapMatch).is_empty());
        assert!(prevented(&[], &[], &[], MatchPolicy::PrimaryMatch, &vocab).is_empty());
    }

    // ========================================================================
    // TEST 11: rows follow outer-dataset iteration order
    // ========================================================================
    #[test]
    fn test_row_order_follows_outer_dataset() {
        let sources = vec![
            nm("tripped on cable", &["trip"]),
            nm("slipped on oil", &["slip"]),
        ];
        let incidents = vec![
            inc("slip injury", &["slip"], "A"),
            inc("trip injury", &["trip"], "B"),
        ];
        let set = escalations(&sources, &incidents, MatchPolicy::PrimaryMatch);
        let tags: Vec<&str> = set.rows().iter().map(|r| r.hazard.as_str()).collect();
        assert_eq!(tags, vec!["trip", "slip"]);
    }

    // ========================================================================
    // TEST 12: policy B row expansion per tag for one record pair
    // ========================================================================
    #[test]
    fn test_any_overlap_expands_per_tag() {
        let so_recs = vec![so("slipped and fell off ladder", &["slip", "fall"])];
        let nm_recs = vec![nm("fell after slipping", &["slip", "fall"])];
        let incidents = vec![inc("slip and fall injury", &["slip", "fall"], "T9")];
        let set = triangulations(&so_recs, &nm_recs, &incidents, MatchPolicy::AnyOverlapMatch);
        let tags: Vec<&str> = set.rows().iter().map(|r| r.hazard.as_str()).collect();
        assert_eq!(tags, vec!["slip", "fall"]);
    }
}
