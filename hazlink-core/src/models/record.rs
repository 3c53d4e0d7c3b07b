use serde::{Deserialize, Serialize};

/// One dataset row as parsed upstream: column name → scalar cell value.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Which of the three source datasets a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Observation,
    NearMiss,
    Incident,
}

/// Derived, immutable view of a raw record after field mapping and
/// classification. `identity_key` is populated only for incidents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub kind: RecordKind,
    pub text: String,
    pub hazards: Vec<String>,
    pub primary_hazard: Option<String>,
    pub site: Vec<String>,
    pub identity_key: Option<String>,
}
