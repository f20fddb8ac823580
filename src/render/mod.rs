//! Renderer - Report to output files
//!
//! Builds a fixed-template document model from a `Report`, then writes:
//! - `.docx` always (atomic temp file + rename)
//! - `.pdf` best effort through an external converter
//! - `.csv` only when the report carries useful data

pub mod converter;
pub mod csv_export;
pub mod document;
pub mod docx;

pub use converter::{convert_to_pdf, locate_converter, ConverterSettings};
pub use document::{Block, DocumentModel};

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::Report;

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("missing dependency: {0}")]
    MissingDependency(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("document error: {0}")]
    Document(String),
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("conversion failed: {0}")]
    Conversion(String),
}

impl From<csv::Error> for RenderError {
    fn from(err: csv::Error) -> Self {
        RenderError::Csv(err.to_string())
    }
}

/// Output file type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Docx,
    Pdf,
    Csv,
}

impl OutputKind {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputKind::Docx => "docx",
            OutputKind::Pdf => "pdf",
            OutputKind::Csv => "csv",
        }
    }
}

/// A file written to the output directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputArtifact {
    pub kind: OutputKind,
    pub path: PathBuf,
}

impl OutputArtifact {
    /// Bare file name, used for download links
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// What happened to the PDF
#[derive(Debug)]
pub enum PdfStatus {
    Written,
    /// Converter turned off in configuration
    Disabled,
    /// Converter not installed; always `RenderError::MissingDependency`
    Skipped(RenderError),
    Failed(String),
}

impl PdfStatus {
    pub fn describe(&self) -> String {
        match self {
            PdfStatus::Written => "written".to_string(),
            PdfStatus::Disabled => "disabled in configuration".to_string(),
            PdfStatus::Skipped(err) => format!("skipped ({})", err),
            PdfStatus::Failed(reason) => format!("failed ({})", reason),
        }
    }
}

/// What happened to the CSV export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvStatus {
    Written,
    Omitted(String),
}

impl CsvStatus {
    pub fn describe(&self) -> String {
        match self {
            CsvStatus::Written => "written".to_string(),
            CsvStatus::Omitted(reason) => format!("omitted ({})", reason),
        }
    }
}

/// Files produced for one report
#[derive(Debug)]
pub struct RenderOutcome {
    pub artifacts: Vec<OutputArtifact>,
    pub pdf: PdfStatus,
    pub csv: CsvStatus,
}

impl RenderOutcome {
    pub fn artifact(&self, kind: OutputKind) -> Option<&OutputArtifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }
}

/// Writes report files into one output directory
#[derive(Debug, Clone)]
pub struct Renderer {
    output_dir: PathBuf,
    converter: ConverterSettings,
}

impl Renderer {
    pub fn new(output_dir: impl Into<PathBuf>, converter: ConverterSettings) -> Self {
        Self {
            output_dir: output_dir.into(),
            converter,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn converter(&self) -> &ConverterSettings {
        &self.converter
    }

    /// `<output_dir>/report_<identifier>.<ext>`
    pub fn output_path(&self, identifier: &str, kind: OutputKind) -> PathBuf {
        self.output_dir.join(report_file_name(identifier, kind))
    }

    /// Write every output for `report`; only a failed `.docx` is an error
    pub async fn render(&self, report: &Report) -> Result<RenderOutcome, RenderError> {
        std::fs::create_dir_all(&self.output_dir)?;

        let model = DocumentModel::build(report);
        let id = report.identifier.as_str();
        let mut artifacts = Vec::new();

        let docx_path = self.output_path(id, OutputKind::Docx);
        docx::write_docx(&model, &docx_path)?;
        info!("Wrote {}", docx_path.display());
        artifacts.push(OutputArtifact {
            kind: OutputKind::Docx,
            path: docx_path.clone(),
        });

        let csv = if report.has_useful_data() {
            let csv_path = self.output_path(id, OutputKind::Csv);
            csv_export::write_csv(report, &csv_path)?;
            artifacts.push(OutputArtifact {
                kind: OutputKind::Csv,
                path: csv_path,
            });
            CsvStatus::Written
        } else {
            // A CSV left by an earlier run would otherwise be served as this one's
            converter::remove_if_exists(&self.output_path(id, OutputKind::Csv))?;
            CsvStatus::Omitted("no data source returned usable data".to_string())
        };

        converter::remove_if_exists(&self.output_path(id, OutputKind::Pdf))?;
        let pdf = convert_to_pdf(&self.converter, &docx_path, &self.output_dir).await;
        match &pdf {
            PdfStatus::Written => artifacts.push(OutputArtifact {
                kind: OutputKind::Pdf,
                path: self.output_path(id, OutputKind::Pdf),
            }),
            PdfStatus::Skipped(err) => warn!("PDF skipped: {}", err),
            PdfStatus::Failed(reason) => warn!("PDF conversion failed: {}", reason),
            PdfStatus::Disabled => {}
        }

        Ok(RenderOutcome { artifacts, pdf, csv })
    }
}

pub fn report_file_name(identifier: &str, kind: OutputKind) -> String {
    format!("report_{}.{}", identifier, kind.extension())
}
