//! Navigation events delivered by a content surface and the decisions taken on them.

use url::Url;

/// Generation number of a load issued by the host.
///
/// Tickets increase monotonically per host; the surface echoes the ticket back
/// when it reports completion or failure so stale notifications can be told
/// apart from the latest load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub const fn new(generation: u64) -> Self {
        Self(generation)
    }

    pub fn generation(self) -> u64 {
        self.0
    }
}

/// What caused a navigation request inside the hosted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// The user activated a link.
    LinkActivation,
    /// The host's own document load (string or file).
    DocumentLoad,
    FormSubmission,
    Reload,
    BackForward,
    Other,
}

impl NavigationKind {
    pub fn is_link_activation(self) -> bool {
        matches!(self, NavigationKind::LinkActivation)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NavigationKind::LinkActivation => "link_activation",
            NavigationKind::DocumentLoad => "document_load",
            NavigationKind::FormSubmission => "form_submission",
            NavigationKind::Reload => "reload",
            NavigationKind::BackForward => "back_forward",
            NavigationKind::Other => "other",
        }
    }
}

/// A navigation action reported by the surface before it loads anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    pub kind: NavigationKind,
    /// `None` when the surface could not resolve the target into a URL.
    pub url: Option<Url>,
}

impl NavigationEvent {
    pub fn new(kind: NavigationKind, url: Option<Url>) -> Self {
        Self { kind, url }
    }

    /// Build an event from a raw target string; unparseable targets carry no URL.
    pub fn parse(kind: NavigationKind, raw: &str) -> Self {
        Self {
            kind,
            url: Url::parse(raw.trim()).ok(),
        }
    }

    pub fn link(url: Url) -> Self {
        Self::new(NavigationKind::LinkActivation, Some(url))
    }
}

/// A response-classification step: the surface received headers for a resource
/// and asks whether to continue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseEvent {
    pub url: Option<Url>,
    pub mime: Option<String>,
    pub main_frame: bool,
}

/// Outcome of mediating a single navigation or response event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Let the surface proceed normally.
    Allow,
    /// Let the surface proceed; a registered custom scheme handler services the URL.
    AllowViaHandler,
    /// Cancel the in-surface navigation; the URL was handed to the external opener.
    CancelAndOpenExternally,
}

impl NavigationDecision {
    pub fn permits_load(self) -> bool {
        !matches!(self, NavigationDecision::CancelAndOpenExternally)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NavigationDecision::Allow => "allow",
            NavigationDecision::AllowViaHandler => "allow_via_handler",
            NavigationDecision::CancelAndOpenExternally => "cancel_open_externally",
        }
    }
}
