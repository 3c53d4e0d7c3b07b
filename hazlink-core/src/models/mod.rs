pub mod record;
pub mod report;
pub mod rows;

pub use record::{NormalizedRecord, RawRecord, RecordKind};
pub use report::{RelationCounts, Report, SourceTally};
pub use rows::{EscalationRow, PreventedRow, TriangulationRow};
