use ammonia::Builder as AmmoniaBuilder;
use comrak::options::{ListStyleType, Options};

use crate::domain::options::ConversionOptions;
use crate::infra::assets::BUNDLE_SCHEME;

pub(crate) fn comrak_options(conversion: &ConversionOptions) -> Options<'static> {
    let mut options = Options::default();
    if conversion.gfm {
        configure_gfm(&mut options);
    }

    options.extension.header_ids = conversion.header_ids.clone();

    let render = &mut options.render;
    render.r#unsafe = conversion.unsafe_html;
    render.hardbreaks = conversion.hard_breaks;
    render.list_style = ListStyleType::Dash;
    render.sourcepos = false;

    options
}

pub(crate) fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    builder.add_tags(&["input", "section", "sup", "del"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);
    builder.add_tag_attributes("th", &["align"]);
    builder.add_tag_attributes("td", &["align"]);
    builder.add_generic_attributes(&[
        "id",
        "data-footnotes",
        "data-footnote-ref",
        "data-footnote-backref",
    ]);

    builder.add_url_schemes([BUNDLE_SCHEME].iter().copied());

    builder
}

fn configure_gfm(options: &mut Options<'static>) {
    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.tagfilter = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;

    options.render.github_pre_lang = true;
    options.render.tasklist_classes = true;
}
