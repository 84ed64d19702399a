//! Report projections
//!
//! Read-only views over a finished component graph, written below one
//! output directory:
//! - `components.tsv` - tabular audit export
//! - `components.yaml` and `components/<group>/<namespace>_<name>.yaml` - dumps
//! - `threat_model.json` - grouped node/edge diagram
//!
//! Artifacts that already exist are left alone unless overwriting is enabled.

pub mod diagram;
pub mod tsv;
pub mod yaml;

use crate::config::paths::ensure_dir;
use crate::topology::ComponentGraph;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};

pub const TSV_FILE: &str = "components.tsv";
pub const YAML_FILE: &str = "components.yaml";
pub const DIAGRAM_FILE: &str = "threat_model.json";

/// What happened to one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    Skipped(PathBuf),
}

/// Counts of one `write_all` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub written: usize,
    pub skipped: usize,
}

impl ReportSummary {
    fn record(&mut self, outcome: &WriteOutcome) {
        match outcome {
            WriteOutcome::Written(_) => self.written += 1,
            WriteOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Writes report artifacts below an output directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
    overwrite: bool,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            overwrite: false,
        }
    }

    /// Replace artifacts that already exist
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write one artifact at a path relative to the output directory
    pub fn write(&self, relative: impl AsRef<Path>, contents: &str) -> Result<WriteOutcome> {
        let path = self.output_dir.join(relative);

        if path.exists() && !self.overwrite {
            tracing::warn!("{} already exists, skipping", path.display());
            return Ok(WriteOutcome::Skipped(path));
        }

        if let Some(parent) = path.parent() {
            ensure_dir(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;

        tracing::debug!("Wrote {}", path.display());
        Ok(WriteOutcome::Written(path))
    }

    /// Write every projection of the graph
    ///
    /// `groups` are the groups that get a diagram, excluded groups removed.
    pub fn write_all(&self, graph: &ComponentGraph, groups: &[String]) -> Result<ReportSummary> {
        let mut summary = ReportSummary::default();

        let outcome = self.write(TSV_FILE, &tsv::render(graph)?)?;
        summary.record(&outcome);

        let outcome = self.write(YAML_FILE, &yaml::render_all(graph)?)?;
        summary.record(&outcome);

        for (_, component) in graph.components() {
            let outcome = self.write(yaml::component_path(component), &yaml::render_one(component)?)?;
            summary.record(&outcome);
        }

        let model = diagram::build(graph, groups, Utc::now());
        let outcome = self.write(DIAGRAM_FILE, &diagram::render(&model)?)?;
        summary.record(&outcome);

        tracing::info!(
            "Reports in {}: {} written, {} skipped",
            self.output_dir.display(),
            summary.written,
            summary.skipped
        );
        Ok(summary)
    }
}
