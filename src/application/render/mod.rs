//! Markdown conversion and page templating.
//!
//! Both stages are pure: they accept Markdown (or an HTML fragment) and return
//! deterministic output. Loading the result into a surface and managing any
//! files it needs happen in the caller.

mod config;
mod converter;
mod template;

pub use converter::{ComrakConverter, MarkdownConverter, default_converter};
pub use template::{CONTENT_PLACEHOLDER, PageDocument, TemplateRenderer};
