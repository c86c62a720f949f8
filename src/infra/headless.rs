//! An in-process content surface with no rendering engine behind it.
//!
//! Records every load request, holds the installed navigation observer and
//! lets callers drive the events a real browser view would emit. The CLI
//! renders through it and the integration tests use it as the surface double.

use std::sync::{Arc, Mutex};

use tracing::debug;
use url::Url;

use crate::application::error::SurfaceError;
use crate::application::surface::{
    ContentSurface, LoadRequest, NavigationObserver, SchemeResponse, SurfaceConfiguration,
};
use crate::domain::navigation::{
    LoadTicket, NavigationDecision, NavigationEvent, NavigationKind, ResponseEvent,
};
use crate::infra::assets::{BUNDLE_SCHEME, BundleSchemeHandler};
use crate::infra::lock::mutex_lock;

const LOG_TARGET: &str = "infra::headless";

#[derive(Default)]
struct SurfaceState {
    observer: Option<Arc<dyn NavigationObserver>>,
    loads: Vec<LoadRequest>,
    reject_loads: Option<String>,
}

pub struct HeadlessSurface {
    configuration: SurfaceConfiguration,
    requires_file_staging: bool,
    state: Mutex<SurfaceState>,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    /// A surface with the compiled-in bundle registered under its custom scheme.
    pub fn new() -> Self {
        Self::with_configuration(
            SurfaceConfiguration::new()
                .with_scheme_handler(BUNDLE_SCHEME, Arc::new(BundleSchemeHandler)),
        )
    }

    pub fn with_configuration(configuration: SurfaceConfiguration) -> Self {
        Self {
            configuration,
            requires_file_staging: false,
            state: Mutex::new(SurfaceState::default()),
        }
    }

    /// Behave like a surface whose string loads cannot reach local files.
    pub fn requiring_file_staging(mut self) -> Self {
        self.requires_file_staging = true;
        self
    }

    /// Make every subsequent load fail with `message`; `None` accepts loads again.
    pub fn reject_loads(&self, message: Option<&str>) {
        mutex_lock(&self.state, LOG_TARGET, "headless::reject_loads").reject_loads =
            message.map(str::to_string);
    }

    pub fn loads(&self) -> Vec<LoadRequest> {
        mutex_lock(&self.state, LOG_TARGET, "headless::loads")
            .loads
            .clone()
    }

    pub fn last_load(&self) -> Option<LoadRequest> {
        mutex_lock(&self.state, LOG_TARGET, "headless::last_load")
            .loads
            .last()
            .cloned()
    }

    pub fn has_observer(&self) -> bool {
        self.observer().is_some()
    }

    /// Report that the load identified by `ticket` finished.
    pub fn finish(&self, ticket: LoadTicket) {
        if let Some(observer) = self.observer() {
            observer.load_finished(ticket);
        }
    }

    /// Report completion of the most recent load, if any.
    pub fn finish_latest(&self) -> Option<LoadTicket> {
        let ticket = self.last_load()?.ticket;
        self.finish(ticket);
        Some(ticket)
    }

    pub fn fail(&self, ticket: LoadTicket, reason: &str) {
        if let Some(observer) = self.observer() {
            observer.load_failed(ticket, reason);
        }
    }

    /// Ask the observer about a navigation. Without an observer the surface
    /// applies its default handling, which is to proceed.
    pub fn navigate(&self, event: &NavigationEvent) -> NavigationDecision {
        match self.observer() {
            Some(observer) => observer.decide_navigation(event, &self.configuration),
            None => NavigationDecision::Allow,
        }
    }

    /// Simulate the user activating a link whose `href` resolved to `raw`.
    pub fn activate_link(&self, raw: &str) -> NavigationDecision {
        self.navigate(&NavigationEvent::parse(NavigationKind::LinkActivation, raw))
    }

    pub fn classify_response(&self, response: &ResponseEvent) -> NavigationDecision {
        match self.observer() {
            Some(observer) => observer.decide_response(response),
            None => NavigationDecision::Allow,
        }
    }

    /// Resolve `url` through the registered custom scheme handlers.
    pub fn fetch(&self, url: &Url) -> Option<SchemeResponse> {
        self.configuration
            .scheme_handler(url.scheme())
            .and_then(|handler| handler.respond(url))
    }

    // Cloned out so observer callbacks never run under the surface lock.
    fn observer(&self) -> Option<Arc<dyn NavigationObserver>> {
        mutex_lock(&self.state, LOG_TARGET, "headless::observer")
            .observer
            .clone()
    }
}

impl ContentSurface for HeadlessSurface {
    fn configuration(&self) -> &SurfaceConfiguration {
        &self.configuration
    }

    fn load(&self, request: LoadRequest) -> Result<(), SurfaceError> {
        let mut state = mutex_lock(&self.state, LOG_TARGET, "headless::load");
        if let Some(message) = state.reject_loads.as_ref() {
            return Err(SurfaceError::rejected(message.clone()));
        }

        debug!(
            target = LOG_TARGET,
            op = "headless::load",
            result = "accepted",
            ticket = request.ticket.generation(),
            strategy = request.target.strategy_label(),
            "Load request recorded"
        );
        state.loads.push(request);
        Ok(())
    }

    fn set_navigation_observer(&self, observer: Option<Arc<dyn NavigationObserver>>) {
        mutex_lock(&self.state, LOG_TARGET, "headless::set_observer").observer = observer;
    }

    fn requires_file_staging(&self) -> bool {
        self.requires_file_staging
    }
}
