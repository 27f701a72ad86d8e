// src/reporting/generator.rs
use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::formats::{HtmlRenderer, PageLayout, PaginatedRenderer, ReportFormat, ReportRenderer, TextRenderer};
use super::model::ReportDocument;

/// Directory name used under the system temp dir when a destination is not writable
const FALLBACK_DIR_NAME: &str = "trimurti-reports";

/// Where one rendered artifact ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifact {
    pub format: ReportFormat,
    pub requested: PathBuf,
    pub path: PathBuf,
}

impl WrittenArtifact {
    /// Whether the artifact had to be written to the fallback location
    pub fn fell_back(&self) -> bool {
        self.requested != self.path
    }
}

/// Renders report documents and writes the artifacts to disk
pub struct ReportManager {
    renderers: HashMap<ReportFormat, Box<dyn ReportRenderer>>,
    fallback_dir: PathBuf,
}

impl Default for ReportManager {
    fn default() -> Self {
        Self::new(PageLayout::default())
    }
}

impl ReportManager {
    pub fn new(layout: PageLayout) -> Self {
        let mut manager = Self {
            renderers: HashMap::new(),
            fallback_dir: std::env::temp_dir().join(FALLBACK_DIR_NAME),
        };

        manager.register_renderer(Box::new(TextRenderer));
        manager.register_renderer(Box::new(HtmlRenderer));
        manager.register_renderer(Box::new(PaginatedRenderer::new(layout)));
        manager
    }

    pub fn with_fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = dir.into();
        self
    }

    pub fn register_renderer(&mut self, renderer: Box<dyn ReportRenderer>) {
        let format = renderer.format();
        debug!("Registering report renderer for format: {}", format);
        self.renderers.insert(format, renderer);
    }

    pub fn render(&self, document: &ReportDocument, format: ReportFormat) -> Vec<u8> {
        match self.renderers.get(&format) {
            Some(renderer) => renderer.render(document),
            None => super::formats::renderer_for(format).render(document),
        }
    }

    /// Write one format to `<base>.<ext>`, falling back to the temp directory.
    /// When neither location is writable the primary I/O error is returned as is.
    pub async fn write_report(
        &self,
        document: &ReportDocument,
        base_path: &Path,
        format: ReportFormat,
    ) -> io::Result<WrittenArtifact> {
        let requested = artifact_path(base_path, format);
        let bytes = self.render(document, format);

        info!("Writing {} report to {}", format, requested.display());

        let primary_error = match write_file(&requested, &bytes).await {
            Ok(()) => {
                return Ok(WrittenArtifact {
                    format,
                    path: requested.clone(),
                    requested,
                })
            }
            Err(e) => e,
        };

        let file_name = requested
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| OsString::from(format!("report.{}", format.extension())));
        let fallback = self.fallback_dir.join(file_name);

        warn!(
            "Could not write {}: {}; writing to {} instead",
            requested.display(),
            primary_error,
            fallback.display()
        );

        match write_file(&fallback, &bytes).await {
            Ok(()) => Ok(WrittenArtifact {
                format,
                requested,
                path: fallback,
            }),
            Err(e) => {
                warn!("Fallback location {} is not writable either: {}", fallback.display(), e);
                Err(primary_error)
            }
        }
    }

    /// Write every requested format; fails only if no artifact could be written at all
    pub async fn write_all(
        &self,
        document: &ReportDocument,
        base_path: &Path,
        formats: &[ReportFormat],
    ) -> io::Result<Vec<WrittenArtifact>> {
        let mut artifacts = Vec::new();
        let mut first_error = None;

        for format in formats {
            match self.write_report(document, base_path, *format).await {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => {
                    warn!("Failed to write report in format {}: {}", format, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if artifacts.is_empty() => Err(e),
            _ => Ok(artifacts),
        }
    }
}

fn artifact_path(base_path: &Path, format: ReportFormat) -> PathBuf {
    let mut path = base_path.as_os_str().to_os_string();
    path.push(".");
    path.push(format.extension());
    PathBuf::from(path)
}

async fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}
