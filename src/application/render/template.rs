use std::fmt;

use crate::application::error::TemplateError;
use crate::infra::assets::{INDEX_TEMPLATE, TemplateAssets};

/// Token in the index template replaced by the converted HTML.
pub const CONTENT_PLACEHOLDER: &str = "{{markview:content}}";

/// A complete page: the template with the converted fragment substituted in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDocument(String);

impl PageDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pure substitution of converted HTML into the index template.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    template: String,
}

impl TemplateRenderer {
    /// Read and validate the index template of `assets`.
    pub fn from_assets(assets: &TemplateAssets) -> Result<Self, TemplateError> {
        let template = assets.read_index()?;
        Self::new(INDEX_TEMPLATE, template)
    }

    pub fn new(name: &str, template: String) -> Result<Self, TemplateError> {
        let count = template.matches(CONTENT_PLACEHOLDER).count();
        if count != 1 {
            return Err(TemplateError::Placeholder {
                name: name.to_string(),
                count,
            });
        }
        Ok(Self { template })
    }

    pub fn render(&self, html: &str) -> PageDocument {
        PageDocument(self.template.replace(CONTENT_PLACEHOLDER, html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_at_placeholder_position() {
        let template = "<main>{{markview:content}}</main>".to_string();
        let renderer = TemplateRenderer::new("inline", template.clone()).expect("valid template");

        let page = renderer.render("<h1>Hi</h1>\n");

        assert_eq!(page.as_str(), "<main><h1>Hi</h1>\n</main>");
        assert_eq!(
            page.as_str(),
            template.replace(CONTENT_PLACEHOLDER, "<h1>Hi</h1>\n")
        );
    }

    #[test]
    fn fragment_containing_placeholder_text_is_not_expanded_again() {
        let renderer = TemplateRenderer::new("inline", "[{{markview:content}}]".to_string())
            .expect("valid template");
        let page = renderer.render("{{markview:content}}");
        assert_eq!(page.as_str(), "[{{markview:content}}]");
    }

    #[test]
    fn rejects_template_without_placeholder() {
        let err = TemplateRenderer::new("broken.html", "<main></main>".to_string())
            .expect_err("placeholder missing");
        assert!(matches!(
            err,
            TemplateError::Placeholder { count: 0, ref name } if name == "broken.html"
        ));
    }

    #[test]
    fn rejects_template_with_duplicate_placeholder() {
        let err = TemplateRenderer::new(
            "twice.html",
            "{{markview:content}}{{markview:content}}".to_string(),
        )
        .expect_err("duplicate placeholder");
        assert!(matches!(err, TemplateError::Placeholder { count: 2, .. }));
    }

    #[test]
    fn bundled_template_is_valid() {
        let renderer =
            TemplateRenderer::from_assets(&TemplateAssets::bundled()).expect("bundled template");
        let page = renderer.render("<p>body</p>");
        assert!(page.as_str().contains("<p>body</p>"));
        assert!(!page.as_str().contains(CONTENT_PLACEHOLDER));
    }

    #[test]
    fn rendering_is_idempotent() {
        let renderer = TemplateRenderer::new("inline", "<b>{{markview:content}}</b>".to_string())
            .expect("valid template");
        assert_eq!(renderer.render("x"), renderer.render("x"));
    }
}
