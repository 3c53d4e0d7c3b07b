//! End-to-end pipeline invariants for the correlation analysis
//!
//! These run the full normalize → classify → correlate → assemble pipeline
//! through `hazlink_core::analyze` on raw key-value records, the same shape
//! the ingest layer produces.

use hazlink_core::{analyze, HazlinkConfig, MatchPolicy, RawRecord};
use serde_json::{json, Value};

fn raw(pairs: &[(&str, Value)]) -> RawRecord {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn observation(text: &str) -> RawRecord {
    raw(&[
        ("Nearmiss observation", json!(text)),
        ("Plant code", json!("P1")),
        ("Zone code", json!("Z1")),
    ])
}

fn near_miss(text: &str) -> RawRecord {
    raw(&[
        ("Observation", json!(text)),
        ("Plant", json!("P1")),
        ("Zone", json!("Z1")),
    ])
}

fn incident(text: &str, treatment: &str) -> RawRecord {
    raw(&[
        ("incident_description", json!(text)),
        ("plant", json!("P1")),
        ("zone_code", json!("Z1")),
        ("treatment_number", json!(treatment)),
    ])
}

// ===========================================================================
// TEST 1: the escalated scenario — hazard realized in all three datasets
// ===========================================================================
#[test]
fn test_scenario_hazard_escalates() {
    let config = HazlinkConfig::default();
    let so = vec![observation("oil spill on floor")];
    let nm = vec![near_miss("slipped near wet floor")];
    let inc = vec![incident("worker slipped and fell", "T100")];

    let report = analyze(&so, &nm, &inc, &config);

    assert_eq!(report.counts.so_inc, 1);
    assert_eq!(report.counts.nm_inc, 1);
    assert_eq!(report.counts.so_nm_inc, 1);
    assert_eq!(report.so_inc[0].hazard, "slip");
    assert_eq!(report.so_nm_inc[0].incident_text, "worker slipped and fell");

    // slip and fall both escalated, so neither may appear as prevented
    assert!(report
        .prevented
        .iter()
        .all(|r| r.hazard != "slip" && r.hazard != "fall"));
}

// ===========================================================================
// TEST 2: the prevented scenario — no incidents at all
// ===========================================================================
#[test]
fn test_scenario_no_incidents_prevented() {
    let config = HazlinkConfig::default();
    let so = vec![observation("oil spill on floor")];
    let nm = vec![near_miss("slipped near wet floor")];

    let report = analyze(&so, &nm, &[], &config);

    assert_eq!(report.counts.so_inc, 0);
    assert_eq!(report.counts.nm_inc, 0);
    assert_eq!(report.counts.so_nm_inc, 0);
    // Both records' primary hazard is slip, so one prevented row for slip
    assert_eq!(report.counts.prevented, 1);
    assert_eq!(report.prevented[0].hazard, "slip");
    assert_eq!(report.prevented[0].status, "PREVENTED");
}

// ===========================================================================
// TEST 3: shared treatment number — one row per identity key per tag
// ===========================================================================
#[test]
fn test_scenario_shared_treatment_number() {
    let config = HazlinkConfig::default();
    let nm = vec![
        near_miss("slipped near press"),
        near_miss("slipped near lathe"),
        near_miss("oily floor by dock"),
    ];
    let inc = vec![
        incident("slipped on shop floor", "T200"),
        incident("slipped at goods-in", "T200"),
    ];

    let report = analyze(&[], &nm, &inc, &config);
    assert_eq!(report.counts.nm_inc, 1, "one row for (slip, T200)");
}

// ===========================================================================
// TEST 4: idempotence — same inputs, byte-identical report
// ===========================================================================
#[test]
fn test_idempotence() {
    let config = HazlinkConfig::default();
    let so = vec![observation("oil spill on floor"), observation("sharp burr on rail")];
    let nm = vec![near_miss("slipped near wet floor"), near_miss("knife left on bench")];
    let inc = vec![incident("worker slipped and fell", "T100")];

    let a = analyze(&so, &nm, &inc, &config);
    let b = analyze(&so, &nm, &inc, &config);

    let a_json = serde_json::to_vec(&a).expect("serialize");
    let b_json = serde_json::to_vec(&b).expect("serialize");
    assert_eq!(a_json, b_json);
}

// ===========================================================================
// TEST 5: monotonicity — a new matching incident flips prevented → escalated
// ===========================================================================
#[test]
fn test_monotonicity_incident_removes_prevented_tag() {
    let config = HazlinkConfig::default();
    let so = vec![observation("sharp knife on bench")];
    let nm = vec![near_miss("nearly cut by burr")];

    let before = analyze(&so, &nm, &[], &config);
    assert!(before.prevented.iter().any(|r| r.hazard == "cut"));

    let inc = vec![incident("deep cut from sharp edge", "T300")];
    let after = analyze(&so, &nm, &inc, &config);

    // "zero incidents for cut" is now false: the tag vanishes entirely
    assert!(after.prevented.iter().all(|r| r.hazard != "cut"));
    // and no escalation count decreased
    assert!(after.counts.so_inc >= before.counts.so_inc);
    assert!(after.counts.nm_inc >= before.counts.nm_inc);
    assert!(after.counts.so_nm_inc >= before.counts.so_nm_inc);
}

// ===========================================================================
// TEST 6: hazard counts tally every matching tag across datasets
// ===========================================================================
#[test]
fn test_hazard_counts_tally() {
    let config = HazlinkConfig::default();
    let so = vec![observation("oil spill on floor")];
    let nm = vec![near_miss("slipped near wet floor")];
    let inc = vec![incident("worker slipped and fell", "T100")];

    let report = analyze(&so, &nm, &inc, &config);
    assert_eq!(report.hazard_counts["slip"].so, 1);
    assert_eq!(report.hazard_counts["slip"].nm, 1);
    assert_eq!(report.hazard_counts["slip"].inc, 1);
    // "fell" matches fall on the incident only
    assert_eq!(report.hazard_counts["fall"].inc, 1);
    assert_eq!(report.hazard_counts["fall"].so, 0);
    // stable chart axis: all seven tags present
    assert_eq!(report.hazards.len(), 7);
    assert_eq!(report.hazard_counts.len(), 7);
}

// ===========================================================================
// TEST 7: policy divergence — shared non-primary tag only matches under B
// ===========================================================================
#[test]
fn test_policy_divergence() {
    // NM mentions only a fall; the incident's primary hazard is slip but it
    // also matches fall. PrimaryMatch sees no pair; AnyOverlapMatch does.
    let nm = vec![near_miss("nearly fell from ladder")];
    let inc = vec![incident("worker slipped and fell", "T100")];

    let config = HazlinkConfig::default();
    assert_eq!(config.analysis.match_policy, MatchPolicy::PrimaryMatch);
    let report = analyze(&[], &nm, &inc, &config);
    assert_eq!(report.counts.nm_inc, 0);

    let mut config = HazlinkConfig::default();
    config.analysis.match_policy = MatchPolicy::AnyOverlapMatch;
    let report = analyze(&[], &nm, &inc, &config);
    assert_eq!(report.counts.nm_inc, 1);
    assert_eq!(report.nm_inc[0].hazard, "fall");
}

// ===========================================================================
// TEST 8: adversarial substring — keyword inside an unrelated longer word
// ===========================================================================
#[test]
fn test_adversarial_substring_matches() {
    let config = HazlinkConfig::default();
    // "wet" inside "wetland": substring matching is the documented behavior
    let nm = vec![near_miss("surveyed the wetland boundary")];
    let inc = vec![incident("slipped on wet floor", "T400")];

    let report = analyze(&[], &nm, &inc, &config);
    assert_eq!(report.counts.nm_inc, 1);
    assert_eq!(report.nm_inc[0].hazard, "slip");
}

// ===========================================================================
// TEST 9: records missing every mapped field still flow through cleanly
// ===========================================================================
#[test]
fn test_unmapped_records_degrade_gracefully() {
    let config = HazlinkConfig::default();
    let junk = vec![raw(&[("unrelated column", json!("noise"))])];

    let report = analyze(&junk, &junk, &junk, &config);
    assert_eq!(report.counts, hazlink_core::RelationCounts::default());
    assert!(report.hazard_counts.values().all(|t| t.so == 0 && t.nm == 0 && t.inc == 0));
}
