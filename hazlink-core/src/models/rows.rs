use serde::{Deserialize, Serialize};

/// One SO→Incident or NM→Incident correlation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationRow {
    pub source_site: Vec<String>,
    pub hazard: String,
    pub source_text: String,
    pub incident_site: Vec<String>,
    pub incident_text: String,
}

/// One SO+NM→Incident triangulation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangulationRow {
    pub so_site: Vec<String>,
    pub nm_site: Vec<String>,
    pub hazard: String,
    pub so_text: String,
    pub nm_text: String,
    pub incident_site: Vec<String>,
    pub incident_text: String,
}

/// One prevented-risk row: the hazard was observed and nearly missed but
/// never escalated to an incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreventedRow {
    pub so_site: Vec<String>,
    pub nm_site: Vec<String>,
    pub hazard: String,
    pub so_text: String,
    pub nm_text: String,
    pub status: String,
}

impl EscalationRow {
    /// Flatten to the exported column order: source site, hazard, source
    /// text, incident site, incident text.
    pub fn cells(&self) -> Vec<String> {
        let mut cells = self.source_site.clone();
        cells.push(self.hazard.clone());
        cells.push(self.source_text.clone());
        cells.extend(self.incident_site.iter().cloned());
        cells.push(self.incident_text.clone());
        cells
    }
}

impl TriangulationRow {
    pub fn cells(&self) -> Vec<String> {
        let mut cells = self.so_site.clone();
        cells.extend(self.nm_site.iter().cloned());
        cells.push(self.hazard.clone());
        cells.push(self.so_text.clone());
        cells.push(self.nm_text.clone());
        cells.extend(self.incident_site.iter().cloned());
        cells.push(self.incident_text.clone());
        cells
    }
}

impl PreventedRow {
    pub fn cells(&self) -> Vec<String> {
        let mut cells = self.so_site.clone();
        cells.extend(self.nm_site.iter().cloned());
        cells.push(self.hazard.clone());
        cells.push(self.so_text.clone());
        cells.push(self.nm_text.clone());
        cells.push(self.status.clone());
        cells
    }
}
