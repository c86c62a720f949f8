use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the markview binary.
#[derive(Debug, Parser)]
#[command(name = "markview", version, about = "Render Markdown into a hosted HTML page")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MARKVIEW_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render a Markdown file and print the page document to stdout.
    Render(RenderArgs),
    /// Stage a Markdown file and keep it on disk until interrupted.
    Preview(PreviewArgs),
}

impl Command {
    pub fn overrides(&self) -> &RenderOverrides {
        match self {
            Command::Render(args) => &args.overrides,
            Command::Preview(args) => &args.overrides,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Markdown file to render; `-` reads standard input.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    #[command(flatten)]
    pub overrides: RenderOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct PreviewArgs {
    /// Markdown file to stage.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    #[command(flatten)]
    pub overrides: RenderOverrides,
}

#[derive(Debug, Args, Clone, Default)]
pub struct RenderOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Hand activated links to the system opener instead of following them.
    #[arg(
        long = "open-links-externally",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub open_links_externally: Option<bool>,

    /// Write the page into a staging directory next to a copy of the template assets.
    #[arg(
        long = "writable-staging",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub writable_staging: Option<bool>,

    /// Parent directory for staging directories.
    #[arg(long = "staging-root", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub staging_root: Option<PathBuf>,

    /// Use a template bundle from disk instead of the built-in one.
    #[arg(long = "template-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub template_dir: Option<PathBuf>,

    /// Toggle GitHub-flavoured Markdown extensions.
    #[arg(long = "gfm", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub gfm: Option<bool>,

    /// Pass raw HTML in the Markdown through unchanged.
    #[arg(
        long = "unsafe-html",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub unsafe_html: Option<bool>,

    /// Render soft line breaks as `<br>`.
    #[arg(
        long = "hard-breaks",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub hard_breaks: Option<bool>,

    /// Sanitize converted HTML against the built-in allow-list.
    #[arg(long = "sanitize", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub sanitize: Option<bool>,
}
