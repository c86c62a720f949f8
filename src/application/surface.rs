//! Interfaces the host expects from its collaborators.
//!
//! The embedding view framework implements [`ContentSurface`]; the host
//! implements [`NavigationObserver`] and installs it on the surface. The
//! platform "open externally" action sits behind [`ExternalOpener`], and an
//! application-termination notification behind [`TerminationNotifier`].

use std::{collections::BTreeMap, fmt, path::PathBuf, sync::Arc};

use bytes::Bytes;
use mime_guess::Mime;
use url::Url;

use crate::application::error::{OpenError, SurfaceError};
use crate::domain::navigation::{LoadTicket, NavigationDecision, NavigationEvent, ResponseEvent};

/// Body and content type produced by a custom scheme handler.
#[derive(Debug, Clone)]
pub struct SchemeResponse {
    pub body: Bytes,
    pub mime: Mime,
}

/// Services URLs of a non-standard scheme from inside the surface.
pub trait SchemeHandler: Send + Sync {
    /// Returns `None` when the URL does not name a resource the handler knows.
    fn respond(&self, url: &Url) -> Option<SchemeResponse>;
}

/// Surface configuration visible to navigation observers.
#[derive(Clone, Default)]
pub struct SurfaceConfiguration {
    scheme_handlers: BTreeMap<String, Arc<dyn SchemeHandler>>,
}

impl SurfaceConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `scheme`. Scheme names are matched case-insensitively.
    pub fn with_scheme_handler(
        mut self,
        scheme: impl Into<String>,
        handler: Arc<dyn SchemeHandler>,
    ) -> Self {
        self.scheme_handlers
            .insert(scheme.into().to_ascii_lowercase(), handler);
        self
    }

    pub fn scheme_handler(&self, scheme: &str) -> Option<&Arc<dyn SchemeHandler>> {
        self.scheme_handlers.get(&scheme.to_ascii_lowercase())
    }

    pub fn has_scheme_handler(&self, scheme: &str) -> bool {
        self.scheme_handler(scheme).is_some()
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.scheme_handlers.keys().map(String::as_str)
    }
}

impl fmt::Debug for SurfaceConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceConfiguration")
            .field("schemes", &self.schemes().collect::<Vec<_>>())
            .finish()
    }
}

/// What the surface is asked to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadTarget {
    /// Load a document from memory; relative URLs resolve against `base_url`.
    Html { document: String, base_url: Url },
    /// Load a file from disk, granting read access to `read_access` and nothing broader.
    File { url: Url, read_access: PathBuf },
}

impl LoadTarget {
    pub fn strategy_label(&self) -> &'static str {
        match self {
            LoadTarget::Html { .. } => "in_memory",
            LoadTarget::File { .. } => "staged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub target: LoadTarget,
}

/// Receives navigation and load notifications from a surface.
///
/// Calls may arrive on the surface's own event loop, concurrently with host
/// updates.
pub trait NavigationObserver: Send + Sync {
    fn decide_navigation(
        &self,
        event: &NavigationEvent,
        configuration: &SurfaceConfiguration,
    ) -> NavigationDecision;

    fn decide_response(&self, response: &ResponseEvent) -> NavigationDecision;

    fn load_finished(&self, ticket: LoadTicket);

    fn load_failed(&self, ticket: LoadTicket, reason: &str);
}

/// The embedded browser-engine view the host renders into.
pub trait ContentSurface: Send + Sync {
    fn configuration(&self) -> &SurfaceConfiguration;

    fn load(&self, request: LoadRequest) -> Result<(), SurfaceError>;

    /// Install or remove the navigation observer. `None` restores default handling.
    fn set_navigation_observer(&self, observer: Option<Arc<dyn NavigationObserver>>);

    /// Whether string loads cannot resolve local assets on this surface, forcing staging.
    fn requires_file_staging(&self) -> bool {
        false
    }
}

/// Platform capability to open a URL outside the hosted content.
pub trait ExternalOpener: Send + Sync {
    fn open(&self, url: &Url) -> Result<(), OpenError>;
}

pub type TerminationCallback = Box<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Application-termination notification source.
pub trait TerminationNotifier: Send + Sync {
    fn subscribe(&self, callback: TerminationCallback) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}
