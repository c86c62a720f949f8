use std::sync::Arc;

use comrak::{Arena, format_html, parse_document};
use once_cell::sync::Lazy;

use crate::application::error::ConversionError;
use crate::domain::options::ConversionOptions;

use super::config::{build_sanitizer, comrak_options};

/// Converts Markdown into an HTML fragment.
///
/// Implementations must be pure: identical input and options yield identical
/// output.
pub trait MarkdownConverter: Send + Sync {
    fn convert(&self, markdown: &str, options: &ConversionOptions)
    -> Result<String, ConversionError>;
}

/// Default converter backed by Comrak, with optional Ammonia sanitisation.
pub struct ComrakConverter {
    sanitizer: ammonia::Builder<'static>,
}

impl ComrakConverter {
    pub fn new() -> Self {
        Self {
            sanitizer: build_sanitizer(),
        }
    }
}

impl Default for ComrakConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownConverter for ComrakConverter {
    fn convert(
        &self,
        markdown: &str,
        options: &ConversionOptions,
    ) -> Result<String, ConversionError> {
        let comrak_options = comrak_options(options);
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &comrak_options);

        let mut html = String::new();
        format_html(root, &comrak_options, &mut html).map_err(|err| {
            ConversionError::Markdown {
                message: err.to_string(),
            }
        })?;

        if options.sanitize {
            html = self.sanitizer.clean(&html).to_string();
        }

        Ok(html)
    }
}

static DEFAULT_CONVERTER: Lazy<Arc<ComrakConverter>> =
    Lazy::new(|| Arc::new(ComrakConverter::new()));

/// Shared Comrak converter, initialised on first use.
pub fn default_converter() -> Arc<dyn MarkdownConverter> {
    Arc::clone(&DEFAULT_CONVERTER) as Arc<dyn MarkdownConverter>
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_heading() {
        let html = ComrakConverter::new()
            .convert("# Hi", &ConversionOptions::default())
            .expect("conversion succeeds");
        assert_eq!(html.trim_end(), "<h1>Hi</h1>");
    }

    #[test]
    fn raw_html_is_omitted_by_default() {
        let converter = ComrakConverter::new();
        let html = converter
            .convert("<b>raw</b>", &ConversionOptions::default())
            .expect("conversion succeeds");
        assert!(!html.contains("<b>raw</b>"), "unexpected raw html: {html}");

        let permissive = ConversionOptions {
            unsafe_html: true,
            ..ConversionOptions::default()
        };
        let html = converter
            .convert("<b>raw</b>", &permissive)
            .expect("conversion succeeds");
        assert!(html.contains("<b>raw</b>"), "raw html missing: {html}");
    }

    #[test]
    fn sanitize_removes_script_even_when_raw_html_allowed() {
        let options = ConversionOptions {
            unsafe_html: true,
            sanitize: true,
            ..ConversionOptions::default()
        };
        let html = ComrakConverter::new()
            .convert("text\n\n<script>alert(1)</script>", &options)
            .expect("conversion succeeds");
        assert!(!html.contains("<script>"), "script survived: {html}");
        assert!(html.contains("<p>text</p>"));
    }

    #[test]
    fn gfm_tables_render() {
        let html = ComrakConverter::new()
            .convert("| a |\n|---|\n| b |", &ConversionOptions::default())
            .expect("conversion succeeds");
        assert!(html.contains("<table>"), "table missing: {html}");
    }

    #[test]
    fn header_ids_use_prefix() {
        let options = ConversionOptions {
            header_ids: Some("mv-".into()),
            ..ConversionOptions::default()
        };
        let html = ComrakConverter::new()
            .convert("## Getting started", &options)
            .expect("conversion succeeds");
        assert!(
            html.contains("mv-getting-started"),
            "anchor id missing: {html}"
        );
    }

    #[test]
    fn conversion_is_deterministic() {
        let converter = default_converter();
        let options = ConversionOptions::default();
        let first = converter.convert("*a* **b**", &options).expect("first");
        let second = converter.convert("*a* **b**", &options).expect("second");
        assert_eq!(first, second);
    }
}
