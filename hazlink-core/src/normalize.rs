//! Record normalizer — projects raw dataset rows into `NormalizedRecord`s
//!
//! Pure transformation, no side effects. Missing fields are recovered
//! locally (empty text, `"NA"` site sentinel) and never propagate as
//! failures: a record the classifier cannot read simply matches no hazards.

use serde_json::Value;

use crate::config::{FieldsConfig, IncidentFields};
use crate::models::{NormalizedRecord, RawRecord, RecordKind};
use crate::vocabulary::HazardVocabulary;

/// Sentinel substituted for absent site attributes and dates.
pub const MISSING: &str = "NA";

/// Character length of the text prefix in the identity-key fallback.
pub const IDENTITY_TEXT_PREFIX: usize = 40;

/// Read a cell as a trimmed string. Absent, null, and blank cells are all
/// treated as missing; numeric and boolean cells are coerced.
fn cell_str(raw: &RawRecord, field: &str) -> Option<String> {
    match raw.get(field)? {
        Value::Null => None,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        other => Some(other.to_string()),
    }
}

/// Stable dedup key for an incident: the treatment/ticket number when
/// present, else event date + a 40-char lowercased text prefix.
fn incident_identity(raw: &RawRecord, text: &str, fields: &IncidentFields) -> String {
    if let Some(ticket) = cell_str(raw, &fields.identity) {
        return ticket;
    }
    let date = cell_str(raw, &fields.date).unwrap_or_else(|| MISSING.to_string());
    let prefix: String = text.to_lowercase().chars().take(IDENTITY_TEXT_PREFIX).collect();
    format!("{}-{}", date, prefix)
}

/// Normalize one raw record of the given kind: extract and classify its
/// text, default its site attributes, and (for incidents) derive the
/// identity key.
pub fn normalize(
    raw: &RawRecord,
    kind: RecordKind,
    fields: &FieldsConfig,
    vocab: &HazardVocabulary,
) -> NormalizedRecord {
    let (text_field, site_fields) = match kind {
        RecordKind::Observation => (fields.observation.text.as_str(), &fields.observation.site),
        RecordKind::NearMiss => (fields.near_miss.text.as_str(), &fields.near_miss.site),
        RecordKind::Incident => (fields.incident.text.as_str(), &fields.incident.site),
    };

    let text = cell_str(raw, text_field).unwrap_or_default();
    let hazards = vocab.classify(&text);
    let primary_hazard = vocab.primary(&hazards).map(str::to_string);
    let site = site_fields
        .iter()
        .map(|f| cell_str(raw, f).unwrap_or_else(|| MISSING.to_string()))
        .collect();

    // Only incidents are correlation terminals, so only they carry a key.
    let identity_key = match kind {
        RecordKind::Incident => Some(incident_identity(raw, &text, &fields.incident)),
        _ => None,
    };

    NormalizedRecord {
        kind,
        text,
        hazards,
        primary_hazard,
        site,
        identity_key,
    }
}

/// Normalize a whole dataset in input order.
pub fn normalize_all(
    raws: &[RawRecord],
    kind: RecordKind,
    fields: &FieldsConfig,
    vocab: &HazardVocabulary,
) -> Vec<NormalizedRecord> {
    raws.iter().map(|r| normalize(r, kind, fields, vocab)).collect()
}

// ============================================================================
// TESTS
// ============================================================================
