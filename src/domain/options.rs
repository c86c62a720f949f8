//! Caller-facing rendering options.

/// Options handed to the Markdown converter. The host never inspects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    /// GitHub-flavoured extensions: tables, strikethrough, autolinks, task lists, footnotes.
    pub gfm: bool,
    /// Pass raw HTML embedded in the Markdown through to the output.
    pub unsafe_html: bool,
    /// Render soft line breaks as `<br>`.
    pub hard_breaks: bool,
    /// Run the converted HTML through the allow-list sanitizer.
    pub sanitize: bool,
    /// Emit `id` attributes on headings using this prefix.
    pub header_ids: Option<String>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            unsafe_html: false,
            hard_breaks: false,
            sanitize: false,
            header_ids: None,
        }
    }
}

/// Rendering configuration owned by a content host.
///
/// Replaced wholesale when a caller supplies a new value on update; fields are
/// never merged individually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Cancel user link activations in the surface and hand them to the external opener.
    pub open_links_externally: bool,
    /// Materialize the page into a staging directory so relative asset URLs resolve.
    pub writable_staging: bool,
    pub conversion: ConversionOptions,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            open_links_externally: true,
            writable_staging: false,
            conversion: ConversionOptions::default(),
        }
    }
}

impl RenderOptions {
    pub fn with_open_links_externally(mut self, enabled: bool) -> Self {
        self.open_links_externally = enabled;
        self
    }

    pub fn with_writable_staging(mut self, enabled: bool) -> Self {
        self.writable_staging = enabled;
        self
    }

    pub fn with_conversion(mut self, conversion: ConversionOptions) -> Self {
        self.conversion = conversion;
        self
    }
}
