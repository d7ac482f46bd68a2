// src/export/mod.rs
//! Document export: single-page PDF and standalone HTML, handed to a download sink

pub mod html;
pub mod pdf;

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

pub use pdf::{LopdfRenderer, PdfRenderer};

use crate::core::FsOps;
use crate::error::ExportError;
use crate::notification::NotificationCenter;
use crate::template_system::TemplateStyle;
use crate::utils::timestamped_filename;

pub const EXPORT_BASENAME: &str = "lettre-de-motivation";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// PDF exports always reuse this name
pub fn pdf_filename() -> String {
    format!("{}.pdf", EXPORT_BASENAME)
}

/// Where exported files end up ("save as")
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Store the file and return its location
    async fn deliver(&self, filename: &str, bytes: &[u8]) -> Result<String, ExportError>;
}

/// Writes downloads into a directory, overwriting files of the same name
pub struct FileDownloads {
    dir: PathBuf,
}

impl FileDownloads {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl DownloadSink for FileDownloads {
    async fn deliver(&self, filename: &str, bytes: &[u8]) -> Result<String, ExportError> {
        let path = self.dir.join(filename);
        FsOps::write_bytes_safe(&path, bytes)
            .await
            .map_err(|e| ExportError::Download(format!("{:#}", e)))?;
        Ok(path.display().to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub filename: String,
    pub location: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub struct ExportPipeline {
    renderer: Arc<dyn PdfRenderer>,
    sink: Arc<dyn DownloadSink>,
    notifications: Arc<NotificationCenter>,
}

impl ExportPipeline {
    pub fn new(
        renderer: Arc<dyn PdfRenderer>,
        sink: Arc<dyn DownloadSink>,
        notifications: Arc<NotificationCenter>,
    ) -> Self {
        Self {
            renderer,
            sink,
            notifications,
        }
    }

    /// Render and download the PDF; failures are reported to the notification surface
    pub async fn export_pdf(&self, html: &str, style: &TemplateStyle) -> Result<ExportedFile, ExportError> {
        let result: Result<ExportedFile, ExportError> = async {
            let bytes = self.renderer.render(html, style).await?;
            let filename = pdf_filename();
            let location = self.sink.deliver(&filename, &bytes).await?;
            Ok(ExportedFile {
                filename,
                location,
                content_type: PDF_CONTENT_TYPE,
                bytes,
            })
        }
        .await;

        self.report("PDF", &result);
        result
    }

    pub async fn export_html(
        &self,
        html: &str,
        style: &TemplateStyle,
        title: &str,
    ) -> Result<ExportedFile, ExportError> {
        let result: Result<ExportedFile, ExportError> = async {
            let document = html::render_standalone(html, style, title);
            let filename = timestamped_filename(EXPORT_BASENAME, "html", Utc::now());
            let location = self.sink.deliver(&filename, document.as_bytes()).await?;
            Ok(ExportedFile {
                filename,
                location,
                content_type: HTML_CONTENT_TYPE,
                bytes: document.into_bytes(),
            })
        }
        .await;

        self.report("HTML", &result);
        result
    }

    fn report(&self, format: &str, result: &Result<ExportedFile, ExportError>) {
        match result {
            Ok(file) => {
                info!("{} export written to {}", format, file.location);
                self.notifications
                    .success(format!("Lettre exportée en {} : {}", format, file.filename));
            }
            Err(e) => {
                error!("{} export failed: {}", format, e);
                self.notifications
                    .error(format!("L'export {} a échoué : {}", format, e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationLevel;

    struct BrokenRenderer;

    #[async_trait]
    impl PdfRenderer for BrokenRenderer {
        async fn render(&self, _html: &str, _style: &TemplateStyle) -> Result<Vec<u8>, ExportError> {
            Err(ExportError::Render("backend unavailable".to_string()))
        }
    }

    fn pipeline(renderer: Arc<dyn PdfRenderer>, dir: &std::path::Path) -> (ExportPipeline, Arc<NotificationCenter>) {
        let notifications = Arc::new(NotificationCenter::default());
        let pipeline = ExportPipeline::new(
            renderer,
            Arc::new(FileDownloads::new(dir.to_path_buf())),
            notifications.clone(),
        );
        (pipeline, notifications)
    }

    #[tokio::test]
    async fn test_pdf_export_overwrites_fixed_name() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, notifications) = pipeline(Arc::new(LopdfRenderer), dir.path());

        let first = pipeline
            .export_pdf("<p>Version 1</p>", &TemplateStyle::default())
            .await
            .unwrap();
        let second = pipeline
            .export_pdf("<p>Version 2</p>", &TemplateStyle::default())
            .await
            .unwrap();

        assert_eq!(first.filename, "lettre-de-motivation.pdf");
        assert_eq!(first.location, second.location);
        let written = std::fs::read(dir.path().join("lettre-de-motivation.pdf")).unwrap();
        assert_eq!(written, second.bytes);
        assert!(written.starts_with(b"%PDF-1.5"));
        assert_eq!(notifications.active().len(), 2);
    }

    #[tokio::test]
    async fn test_html_export_is_timestamped() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, _) = pipeline(Arc::new(LopdfRenderer), dir.path());

        let exported = pipeline
            .export_html("<p>Bonjour</p>", &TemplateStyle::default(), "Lettre")
            .await
            .unwrap();

        assert!(exported.filename.starts_with("lettre-de-motivation-"));
        assert!(exported.filename.ends_with(".html"));
        let written = std::fs::read_to_string(dir.path().join(&exported.filename)).unwrap();
        assert!(written.contains("<p>Bonjour</p>"));
    }

    #[tokio::test]
    async fn test_render_failure_is_notified() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, notifications) = pipeline(Arc::new(BrokenRenderer), dir.path());

        let err = pipeline
            .export_pdf("<p>x</p>", &TemplateStyle::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Render(_)));

        let active = notifications.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].level, NotificationLevel::Error);
        assert!(!dir.path().join("lettre-de-motivation.pdf").exists());
    }
}
