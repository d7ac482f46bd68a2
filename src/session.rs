// src/session.rs
//! One letter-editing session: the editor plus the template registry, draft
//! persistence, export pipeline and notifications it works with

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::editor::RichTextEditor;
use crate::error::{EditorError, ExportError, TemplateError};
use crate::export::{ExportPipeline, ExportedFile};
use crate::notification::NotificationCenter;
use crate::persistence::{SavedSnapshot, SnapshotStore};
use crate::template_processor::LetterFields;
use crate::template_system::{LoadedTemplate, TemplateRegistry, TemplateStyle, DEFAULT_TEMPLATE_ID};

const DEFAULT_TITLE: &str = "Lettre de motivation";

/// Where the content shown at mount time came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MountSource {
    Explicit,
    Snapshot,
    DefaultTemplate,
}

pub struct LetterSession {
    editor: RichTextEditor,
    registry: Arc<TemplateRegistry>,
    snapshots: SnapshotStore,
    exports: ExportPipeline,
    notifications: Arc<NotificationCenter>,
    fields: LetterFields,
}

impl LetterSession {
    pub fn new(
        registry: Arc<TemplateRegistry>,
        snapshots: SnapshotStore,
        exports: ExportPipeline,
        notifications: Arc<NotificationCenter>,
    ) -> Self {
        Self {
            editor: RichTextEditor::new(),
            registry,
            snapshots,
            exports,
            notifications,
            fields: LetterFields::default(),
        }
    }

    /// Initial content: explicit html, else the saved draft, else the default template
    pub fn mount(&mut self, initial: Option<&str>) -> Result<MountSource, EditorError> {
        if let Some(html) = initial.filter(|h| !h.trim().is_empty()) {
            self.editor.set_content(html);
            self.editor.set_template_id(None);
            return Ok(MountSource::Explicit);
        }

        if let Some(snapshot) = self.snapshots.load() {
            info!("Restoring draft saved at {}", snapshot.timestamp);
            self.editor.set_content(&snapshot.content);
            self.editor.set_template_id(snapshot.template_id);
            return Ok(MountSource::Snapshot);
        }

        self.editor
            .load_template(&self.registry, DEFAULT_TEMPLATE_ID, &self.fields)?;
        Ok(MountSource::DefaultTemplate)
    }

    pub fn editor(&self) -> &RichTextEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut RichTextEditor {
        &mut self.editor
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    /// Replace the document with a template; new fields replace the remembered ones
    pub fn load_template(
        &mut self,
        template_id: &str,
        fields: Option<LetterFields>,
    ) -> Result<LoadedTemplate, EditorError> {
        if !self.registry.template_exists(template_id) {
            return Err(TemplateError::NotFound(template_id.to_string()).into());
        }
        if let Some(fields) = fields {
            self.fields = fields;
        }
        let loaded = self
            .editor
            .load_template(&self.registry, template_id, &self.fields)?;

        if let Ok(template) = self.registry.get_template(template_id) {
            self.notifications
                .info(format!("Modèle « {} » chargé", template.name));
        }
        Ok(loaded)
    }

    /// Write the current draft; the store write runs on the blocking pool
    pub async fn save(&self) -> Result<SavedSnapshot> {
        let snapshot = SavedSnapshot::new(
            self.editor.get_content(),
            self.editor.template_id().map(str::to_string),
        );

        let store = self.snapshots.clone();
        let pending = snapshot.clone();
        let written = tokio::task::spawn_blocking(move || store.save(&pending))
            .await
            .context("Draft save task aborted")
            .and_then(|result| result);

        match written {
            Ok(()) => {
                self.notifications.success("Lettre sauvegardée");
                Ok(snapshot)
            }
            Err(e) => {
                warn!("Draft save failed: {:#}", e);
                self.notifications
                    .error("Impossible de sauvegarder la lettre");
                Err(e)
            }
        }
    }

    /// Style of the current template, or the default style for free content
    pub fn current_style(&self) -> TemplateStyle {
        self.editor
            .template_id()
            .and_then(|id| self.registry.get_template(id).ok())
            .map(|t| t.style.clone())
            .unwrap_or_default()
    }

    fn title(&self) -> String {
        self.editor
            .template_id()
            .and_then(|id| self.registry.get_template(id).ok())
            .map(|t| format!("{} ({})", DEFAULT_TITLE, t.name))
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }

    pub async fn export_pdf(&self) -> Result<ExportedFile, ExportError> {
        self.exports
            .export_pdf(&self.editor.get_content(), &self.current_style())
            .await
    }

    pub async fn export_html(&self) -> Result<ExportedFile, ExportError> {
        self.exports
            .export_html(&self.editor.get_content(), &self.current_style(), &self.title())
            .await
    }
}
