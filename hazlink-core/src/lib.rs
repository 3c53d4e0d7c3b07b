pub mod config;
pub mod correlate;
pub mod error;
pub mod models;
pub mod normalize;
pub mod report;
pub mod vocabulary;

pub use config::HazlinkConfig;
pub use correlate::{CorrelationSet, MatchPolicy, PREVENTED_STATUS};
pub use error::HazlinkError;
pub use models::{NormalizedRecord, RawRecord, RecordKind, RelationCounts, Report, SourceTally};
pub use report::analyze;
pub use vocabulary::{HazardVocabulary, VocabEntry};
