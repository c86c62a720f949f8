use std::sync::Arc;

use markview::{
    ContentHost, ConversionOptions, HeadlessSurface, HostOptions, RenderOptions,
    application::render::{ComrakConverter, MarkdownConverter},
};
use tempfile::TempDir;

fn load_markdown() -> &'static str {
    include_str!("fixtures/gfm_features.md")
}

fn convert(options: &ConversionOptions) -> String {
    ComrakConverter::new()
        .convert(load_markdown(), options)
        .expect("conversion succeeds")
}

#[test]
fn gfm_extensions_are_rendered_by_default() {
    let html = convert(&ConversionOptions::default());

    assert!(html.contains("<h1>Release notes</h1>"));
    assert!(html.contains("<del>old</del>"));
    assert!(html.contains("<table>"));
    assert!(html.contains("type=\"checkbox\""));
    assert!(html.contains("href=\"https://example.com/changelog\""));
    assert!(html.contains("class=\"footnotes\""));
}

#[test]
fn raw_script_is_never_emitted() {
    for options in [
        ConversionOptions::default(),
        ConversionOptions {
            unsafe_html: true,
            ..ConversionOptions::default()
        },
        ConversionOptions {
            unsafe_html: true,
            sanitize: true,
            ..ConversionOptions::default()
        },
    ] {
        let html = convert(&options);
        assert!(!html.contains("<script>"), "script leaked with {options:?}");
    }
}

#[test]
fn commonmark_only_when_gfm_disabled() {
    let html = convert(&ConversionOptions {
        gfm: false,
        ..ConversionOptions::default()
    });

    assert!(!html.contains("<table>"));
    assert!(!html.contains("<del>"));
    assert!(html.contains("~~old~~"));
}

#[test]
fn heading_ids_use_configured_prefix() {
    let html = convert(&ConversionOptions {
        header_ids: Some("doc-".into()),
        ..ConversionOptions::default()
    });

    assert!(html.contains("id=\"doc-release-notes\""));
}

#[test]
fn sanitized_output_keeps_task_list_checkboxes() {
    let html = convert(&ConversionOptions {
        sanitize: true,
        ..ConversionOptions::default()
    });

    assert!(html.contains("type=\"checkbox\""));
    assert!(html.contains("<del>old</del>"));
}

#[test]
fn staged_page_embeds_converted_fixture() {
    let root = TempDir::new().expect("root");
    let surface = Arc::new(HeadlessSurface::new());

    let host = ContentHost::render(
        surface,
        load_markdown(),
        HostOptions::default()
            .without_opener()
            .with_staging_root(root.path())
            .with_render_options(RenderOptions::default().with_writable_staging(true)),
    )
    .expect("render");

    let staging = host.staging_dir().expect("staging");
    let index = std::fs::read_to_string(staging.join("index.html")).expect("index");

    assert_eq!(index, host.page_document().as_str());
    assert!(index.contains("<del>old</del>"));
    assert!(index.contains("css/markview.css"));
    assert!(!index.contains("{{markview:content}}"));
}
