//! hazlink-cli — frontend for the Hazlink safety-correlation server
//!
//! Uploads the three event datasets (safety observations, near-misses,
//! incidents) to a running hazlink-server, prints the correlation summary
//! and per-hazard histogram, and optionally downloads the XLSX report.
//!
//! # Subcommands
//! - `analyze --so <file> --nm <file> --inc <file> [--json] [--download <dir>]`
//! - `status` — show server health

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8790";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "hazlink-cli",
    version,
    about = "Hazlink safety-event correlation — dataset upload and report CLI"
)]
struct Cli {
    /// Hazlink HTTP server URL (overrides HAZLINK_HTTP_URL env var)
    #[arg(long, env = "HAZLINK_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Upload the three datasets and print the correlation summary
    Analyze {
        /// Safety-observation dataset (.xlsx or .csv)
        #[arg(long)]
        so: PathBuf,

        /// Near-miss dataset (.xlsx or .csv)
        #[arg(long)]
        nm: PathBuf,

        /// Incident dataset (.xlsx or .csv)
        #[arg(long)]
        inc: PathBuf,

        /// Print the raw JSON response instead of the rendered summary
        #[arg(long)]
        json: bool,

        /// Download the XLSX report workbook into this directory
        #[arg(long)]
        download: Option<PathBuf>,
    },

    /// Show Hazlink server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SourceTally {
    pub so: u32,
    pub nm: u32,
    pub inc: u32,
}

#[derive(Debug, Deserialize)]
pub struct RelationCounts {
    pub so_inc: usize,
    pub nm_inc: usize,
    pub so_nm_inc: usize,
    pub prevented: usize,
}

/// The response body of POST /analyze.
#[derive(Debug, Deserialize)]
pub struct AnalyzeResponse {
    pub hazards: Vec<String>,
    pub hazard_counts: BTreeMap<String, SourceTally>,
    pub counts: RelationCounts,
    pub report_url: String,
    pub took_ms: Option<u64>,
}

// ============================================================================
// Rendering
// ============================================================================

/// Render the four relation counts as an aligned two-column table.
pub fn render_summary(counts: &RelationCounts) -> String {
    let rows = [
        ("SO → Incident", counts.so_inc),
        ("NM → Incident", counts.nm_inc),
        ("SO + NM → Incident", counts.so_nm_inc),
        ("Prevented Risks", counts.prevented),
    ];
    let width = rows.iter().map(|(name, _)| name.chars().count()).max().unwrap_or(0);
    rows.iter()
        .map(|(name, count)| {
            let pad = width - name.chars().count();
            format!("{}{}  {}", name, " ".repeat(pad), count)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the per-hazard histogram, in the server's hazard order.
pub fn render_histogram(
    hazards: &[String],
    counts: &BTreeMap<String, SourceTally>,
) -> String {
    let width = hazards.iter().map(|h| h.chars().count()).max().unwrap_or(0);
    hazards
        .iter()
        .filter_map(|tag| counts.get(tag).map(|t| (tag, t)))
        .map(|(tag, t)| {
            let pad = width - tag.chars().count();
            format!(
                "{}{}  so:{:<4} nm:{:<4} inc:{}",
                tag,
                " ".repeat(pad),
                t.so,
                t.nm,
                t.inc
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

/// Upload the three datasets and render the analysis result.
fn do_analyze(
    server: &str,
    so: &PathBuf,
    nm: &PathBuf,
    inc: &PathBuf,
    json_output: bool,
    download: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()?;

    let form = reqwest::blocking::multipart::Form::new()
        .file("safety_observations", so)?
        .file("near_misses", nm)?
        .file("incidents", inc)?;

    let url = format!("{}/analyze", server);
    let resp = match client.post(&url).multipart(form).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("hazlink-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        eprintln!("hazlink-cli: server returned {}: {}", status, body);
        std::process::exit(1);
    }

    if json_output {
        let body: serde_json::Value = resp.json()?;
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let analysis: AnalyzeResponse = match resp.json() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("hazlink-cli: failed to parse analyze response: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", render_summary(&analysis.counts));
    println!();
    println!("{}", render_histogram(&analysis.hazards, &analysis.hazard_counts));
    if let Some(ms) = analysis.took_ms {
        println!("\nAnalyzed in {} ms", ms);
    }

    if let Some(dir) = download {
        let report_url = format!("{}{}", server, analysis.report_url);
        let bytes = client.get(&report_url).send()?.error_for_status()?.bytes()?;
        let file_name = analysis
            .report_url
            .rsplit('/')
            .next()
            .unwrap_or("safety-report.xlsx");
        std::fs::create_dir_all(dir)?;
        let path = dir.join(file_name);
        std::fs::write(&path, &bytes)?;
        println!("Report saved to {}", path.display());
    } else {
        println!("\nReport: {}{}", server, analysis.report_url);
    }

    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;

    let url = format!("{}/health", server);
    match client.get(&url).send() {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Hazlink server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:        {}", body["version"].as_str().unwrap_or("?"));
            println!("Report dir:     {}", body["report_dir"].as_str().unwrap_or("?"));
        }
        Ok(r) => {
            eprintln!("hazlink-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("hazlink-cli: cannot reach {} — {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Analyze { so, nm, inc, json, download } => {
            do_analyze(&server, &so, &nm, &inc, json, download.as_ref())
        }
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("hazlink-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
