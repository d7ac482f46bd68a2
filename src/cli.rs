// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::core::service_client::API_KEY_SETTING;
use crate::core::{ConfigManager, FileKeyValueStore, KeyValueStore};
use crate::export::{ExportPipeline, ExportedFile, FileDownloads, LopdfRenderer};
use crate::notification::NotificationCenter;
use crate::template_processor::LetterFields;
use crate::template_system::TemplateRegistry;
use crate::web::start_web_server;

#[derive(Parser)]
#[command(name = "cv-studio")]
#[command(about = "Cover letter editor, exporter and skills library")]
pub struct StudioCli {
    #[command(subcommand)]
    pub command: StudioCommand,

    /// Write JSON log lines to this file instead of stdout
    #[arg(long, global = true)]
    pub json_log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum StudioCommand {
    /// Start the HTTP API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// List available letter templates
    Templates,
    /// Render a template to a file without starting the server
    Render {
        template: String,
        /// Template field as key=value, repeatable
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
        #[arg(long, value_enum, default_value_t = RenderFormat::Pdf)]
        format: RenderFormat,
        /// Output directory, defaults to the configured download directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Store the generation API key in the settings file
    SetApiKey { key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderFormat {
    Html,
    Pdf,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

pub fn letter_fields(pairs: Vec<(String, String)>) -> Result<LetterFields> {
    let mut fields = LetterFields::default();
    for (key, value) in pairs {
        if !fields.set(&key, value) {
            anyhow::bail!("Unknown template field: {}", key);
        }
    }
    Ok(fields)
}

pub async fn handle_command(command: StudioCommand, mut config: ConfigManager) -> Result<()> {
    match command {
        StudioCommand::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            start_web_server(config).await
        }

        StudioCommand::Templates => {
            let registry = TemplateRegistry::new();
            for template in registry.list_templates() {
                println!("{:<12} {} - {}", template.id, template.name, template.description);
            }
            Ok(())
        }

        StudioCommand::Render {
            template,
            fields,
            format,
            out,
        } => {
            let out_dir = out.unwrap_or_else(|| config.environment.download_path.clone());
            let file = render_template(&template, letter_fields(fields)?, format, out_dir).await?;
            println!("{}", file.location);
            Ok(())
        }

        StudioCommand::SetApiKey { key } => {
            config.ensure_directories().await?;
            let settings = FileKeyValueStore::new(config.settings_path());
            settings
                .set(API_KEY_SETTING, key.trim())
                .context("Failed to store API key")?;
            info!("API key stored in {}", config.settings_path().display());
            Ok(())
        }
    }
}

pub async fn render_template(
    template_id: &str,
    fields: LetterFields,
    format: RenderFormat,
    out_dir: PathBuf,
) -> Result<ExportedFile> {
    let registry = TemplateRegistry::new();
    let loaded = registry.load(template_id, &fields)?;
    let name = registry.get_template(template_id)?.name.clone();

    let pipeline = ExportPipeline::new(
        Arc::new(LopdfRenderer),
        Arc::new(FileDownloads::new(out_dir)),
        Arc::new(NotificationCenter::default()),
    );

    let file = match format {
        RenderFormat::Pdf => pipeline.export_pdf(&loaded.html, &loaded.style).await?,
        RenderFormat::Html => {
            let title = format!("Lettre de motivation ({})", name);
            pipeline.export_html(&loaded.html, &loaded.style, &title).await?
        }
    };
    Ok(file)
}
