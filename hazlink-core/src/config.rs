use config::{Config, File};
use serde::Deserialize;

use crate::correlate::MatchPolicy;
use crate::error::HazlinkError;
use crate::vocabulary::{HazardVocabulary, VocabEntry};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HazlinkConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub fields: FieldsConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
    pub report_dir: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            report_dir: "reports".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub match_policy: MatchPolicy,
    /// Optional vocabulary override; the built-in hazard map applies when
    /// absent or empty.
    #[serde(default)]
    pub vocabulary: Option<Vec<VocabEntry>>,
}

impl AnalysisConfig {
    pub fn vocabulary(&self) -> HazardVocabulary {
        match &self.vocabulary {
            Some(entries) if !entries.is_empty() => HazardVocabulary::new(entries.clone()),
            _ => HazardVocabulary::builtin(),
        }
    }
}

/// Per-kind field-name mapping. Dataset column names are configuration,
/// never hard-coded at call sites.
#[derive(Debug, Deserialize, Clone)]
pub struct FieldsConfig {
    #[serde(default = "FieldMap::observation_default")]
    pub observation: FieldMap,
    #[serde(default = "FieldMap::near_miss_default")]
    pub near_miss: FieldMap,
    #[serde(default)]
    pub incident: IncidentFields,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            observation: FieldMap::observation_default(),
            near_miss: FieldMap::near_miss_default(),
            incident: IncidentFields::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FieldMap {
    pub text: String,
    pub site: Vec<String>,
}

impl FieldMap {
    fn observation_default() -> Self {
        Self {
            text: "Nearmiss observation".to_string(),
            site: vec!["Plant code".to_string(), "Zone code".to_string()],
        }
    }

    fn near_miss_default() -> Self {
        Self {
            text: "Observation".to_string(),
            site: vec!["Plant".to_string(), "Zone".to_string()],
        }
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        Self::observation_default()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IncidentFields {
    pub text: String,
    pub site: Vec<String>,
    /// Preferred dedup key column (ticket/treatment number).
    pub identity: String,
    /// Event date column, used by the identity-key fallback.
    pub date: String,
}

impl Default for IncidentFields {
    fn default() -> Self {
        Self {
            text: "incident_description".to_string(),
            site: vec!["plant".to_string(), "zone_code".to_string()],
            identity: "treatment_number".to_string(),
            date: "incident_date".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8790,
        }
    }
}

impl HazlinkConfig {
    pub fn load(path: &str) -> Result<Self, HazlinkError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        Ok(s.try_deserialize()?)
    }
}

// ============================================================================
// TESTS
// ============================================================================
