//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::domain::options::{ConversionOptions, RenderOptions};

mod cli;

pub use cli::{CliArgs, Command, PreviewArgs, RenderArgs, RenderOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "markview";
const ENV_PREFIX: &str = "MARKVIEW";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub render: RenderSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub open_links_externally: bool,
    pub writable_staging: bool,
    /// `None` means the system temporary directory.
    pub staging_root: Option<PathBuf>,
    /// `None` means the built-in template bundle.
    pub template_dir: Option<PathBuf>,
    pub conversion: ConversionOptions,
}

impl RenderSettings {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::default()
            .with_open_links_externally(self.open_links_externally)
            .with_writable_staging(self.writable_staging)
            .with_conversion(self.conversion.clone())
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(cli.command.overrides());

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    render: RawRenderSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &RenderOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(enabled) = overrides.open_links_externally {
            self.render.open_links_externally = Some(enabled);
        }
        if let Some(enabled) = overrides.writable_staging {
            self.render.writable_staging = Some(enabled);
        }
        if let Some(root) = overrides.staging_root.as_ref() {
            self.render.staging_root = Some(root.clone());
        }
        if let Some(dir) = overrides.template_dir.as_ref() {
            self.render.template_dir = Some(dir.clone());
        }
        if let Some(enabled) = overrides.gfm {
            self.render.gfm = Some(enabled);
        }
        if let Some(enabled) = overrides.unsafe_html {
            self.render.unsafe_html = Some(enabled);
        }
        if let Some(enabled) = overrides.hard_breaks {
            self.render.hard_breaks = Some(enabled);
        }
        if let Some(enabled) = overrides.sanitize {
            self.render.sanitize = Some(enabled);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { logging, render } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            render: build_render_settings(render)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let staging_root = non_empty_path(render.staging_root, "render.staging_root")?;
    let template_dir = non_empty_path(render.template_dir, "render.template_dir")?;

    let header_ids = match render.header_ids {
        Some(prefix) if prefix.chars().any(char::is_whitespace) => {
            return Err(LoadError::invalid(
                "render.header_ids",
                "prefix must not contain whitespace",
            ));
        }
        other => other,
    };

    let defaults = ConversionOptions::default();
    let conversion = ConversionOptions {
        gfm: render.gfm.unwrap_or(defaults.gfm),
        unsafe_html: render.unsafe_html.unwrap_or(defaults.unsafe_html),
        hard_breaks: render.hard_breaks.unwrap_or(defaults.hard_breaks),
        sanitize: render.sanitize.unwrap_or(defaults.sanitize),
        header_ids,
    };

    let options = RenderOptions::default();
    Ok(RenderSettings {
        open_links_externally: render
            .open_links_externally
            .unwrap_or(options.open_links_externally),
        writable_staging: render.writable_staging.unwrap_or(options.writable_staging),
        staging_root,
        template_dir,
        conversion,
    })
}

fn non_empty_path(
    path: Option<PathBuf>,
    key: &'static str,
) -> Result<Option<PathBuf>, LoadError> {
    match path {
        Some(path) if path.as_os_str().is_empty() => {
            Err(LoadError::invalid(key, "path must not be empty"))
        }
        other => Ok(other),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    open_links_externally: Option<bool>,
    writable_staging: Option<bool>,
    staging_root: Option<PathBuf>,
    template_dir: Option<PathBuf>,
    gfm: Option<bool>,
    unsafe_html: Option<bool>,
    hard_breaks: Option<bool>,
    sanitize: Option<bool>,
    header_ids: Option<String>,
}
