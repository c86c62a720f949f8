//! Navigation mediation between hosted content and the host.
//!
//! Every navigation moves `Idle → AwaitingDecision → {Allowed, Cancelled} →
//! Idle` inside a single [`NavigationObserver::decide_navigation`] call; the
//! only state that survives between events is the current load generation and
//! the callback waiting for it.

use std::{
    mem,
    sync::{Arc, Mutex},
};

use metrics::counter;
use tracing::{debug, info, warn};
use url::Url;

use crate::application::surface::{ExternalOpener, NavigationObserver, SurfaceConfiguration};
use crate::domain::navigation::{LoadTicket, NavigationDecision, NavigationEvent, ResponseEvent};
use crate::infra::lock::mutex_lock;

const LOG_TARGET: &str = "application::navigation";

/// Callback invoked once the hosted document finishes loading.
pub type OnLoaded = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadPhase {
    Pending,
    Finished,
    Failed,
}

struct MediatorState {
    generation: u64,
    phase: LoadPhase,
    on_loaded: Option<OnLoaded>,
    open_links_externally: bool,
}

/// A load generation the surface has not yet accepted.
///
/// Holds what the mediator tracked before the load began so that a rejected
/// load can be rolled back with [`NavigationMediator::abandon`].
#[must_use]
pub struct PendingLoad {
    ticket: LoadTicket,
    previous_phase: LoadPhase,
    previous_on_loaded: Option<OnLoaded>,
    previous_open_links_externally: bool,
}

impl PendingLoad {
    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }
}

/// Classifies navigation events and tracks which load may fire `on_loaded`.
pub struct NavigationMediator {
    state: Mutex<MediatorState>,
    opener: Option<Arc<dyn ExternalOpener>>,
}

impl NavigationMediator {
    pub fn new(open_links_externally: bool, opener: Option<Arc<dyn ExternalOpener>>) -> Self {
        Self {
            state: Mutex::new(MediatorState {
                generation: 0,
                phase: LoadPhase::Finished,
                on_loaded: None,
                open_links_externally,
            }),
            opener,
        }
    }

    /// Start a new load generation, superseding any load still in flight.
    ///
    /// The link policy takes effect immediately so that navigations the
    /// surface reports while accepting the load are classified under it.
    pub fn begin_load(
        &self,
        on_loaded: Option<OnLoaded>,
        open_links_externally: bool,
    ) -> PendingLoad {
        let mut state = mutex_lock(&self.state, LOG_TARGET, "navigation::begin_load");
        let previous_phase = mem::replace(&mut state.phase, LoadPhase::Pending);
        let previous_on_loaded = mem::replace(&mut state.on_loaded, on_loaded);
        let previous_open_links_externally =
            mem::replace(&mut state.open_links_externally, open_links_externally);
        state.generation += 1;

        PendingLoad {
            ticket: LoadTicket::new(state.generation),
            previous_phase,
            previous_on_loaded,
            previous_open_links_externally,
        }
    }

    /// Roll back a load the surface never accepted.
    ///
    /// The generation that was current before it becomes current again, with
    /// its phase, callback and link policy, so a still-pending earlier load
    /// can complete normally. A newer load started in the meantime wins and is
    /// left untouched.
    pub fn abandon(&self, pending: PendingLoad) {
        let mut state = mutex_lock(&self.state, LOG_TARGET, "navigation::abandon");
        if state.generation != pending.ticket.generation() {
            return;
        }
        state.generation -= 1;
        state.phase = pending.previous_phase;
        state.on_loaded = pending.previous_on_loaded;
        state.open_links_externally = pending.previous_open_links_externally;
        debug!(
            target = LOG_TARGET,
            op = "navigation::abandon",
            result = "restored",
            ticket = pending.ticket.generation(),
            current = state.generation,
            "Rejected load rolled back"
        );
    }

    pub fn current_ticket(&self) -> LoadTicket {
        LoadTicket::new(mutex_lock(&self.state, LOG_TARGET, "navigation::current_ticket").generation)
    }

    /// Whether the latest load finished successfully.
    pub fn is_loaded(&self) -> bool {
        let state = mutex_lock(&self.state, LOG_TARGET, "navigation::is_loaded");
        state.generation > 0 && state.phase == LoadPhase::Finished
    }

    /// Decide a navigation action without side effects.
    pub fn classify(
        &self,
        event: &NavigationEvent,
        configuration: &SurfaceConfiguration,
    ) -> NavigationDecision {
        let open_links_externally =
            mutex_lock(&self.state, LOG_TARGET, "navigation::classify").open_links_externally;
        classify_navigation(event, configuration, open_links_externally)
    }

    fn dispatch_external(&self, url: &Url) {
        let Some(opener) = self.opener.as_ref() else {
            debug!(
                target = LOG_TARGET,
                op = "navigation::dispatch_external",
                result = "no_opener",
                url = %url,
                "No external opener available; link dropped"
            );
            return;
        };

        match opener.open(url) {
            Ok(()) => {
                counter!("markview_external_open_total").increment(1);
                info!(
                    target = LOG_TARGET,
                    op = "navigation::dispatch_external",
                    result = "opened",
                    url = %url,
                    "Link opened externally"
                );
            }
            Err(err) => {
                warn!(
                    target = LOG_TARGET,
                    op = "navigation::dispatch_external",
                    result = "error",
                    url = %url,
                    error = %err,
                    "External opener failed"
                );
            }
        }
    }
}

impl NavigationObserver for NavigationMediator {
    fn decide_navigation(
        &self,
        event: &NavigationEvent,
        configuration: &SurfaceConfiguration,
    ) -> NavigationDecision {
        let decision = self.classify(event, configuration);

        debug!(
            target = LOG_TARGET,
            op = "navigation::decide",
            kind = event.kind.as_str(),
            url = event.url.as_ref().map(Url::as_str).unwrap_or(""),
            decision = decision.as_str(),
            "Navigation mediated"
        );

        if decision == NavigationDecision::CancelAndOpenExternally {
            if let Some(url) = event.url.as_ref() {
                self.dispatch_external(url);
            }
        }

        decision
    }

    fn decide_response(&self, _response: &ResponseEvent) -> NavigationDecision {
        NavigationDecision::Allow
    }

    fn load_finished(&self, ticket: LoadTicket) {
        let callback = {
            let mut state = mutex_lock(&self.state, LOG_TARGET, "navigation::load_finished");
            if state.generation != ticket.generation() || state.phase != LoadPhase::Pending {
                counter!("markview_stale_completion_total").increment(1);
                debug!(
                    target = LOG_TARGET,
                    op = "navigation::load_finished",
                    result = "stale",
                    ticket = ticket.generation(),
                    current = state.generation,
                    "Ignoring completion for superseded load"
                );
                return;
            }
            state.phase = LoadPhase::Finished;
            state.on_loaded.clone()
        };

        debug!(
            target = LOG_TARGET,
            op = "navigation::load_finished",
            result = "finished",
            ticket = ticket.generation(),
            has_callback = callback.is_some(),
            "Document load finished"
        );

        // Run outside the lock so the callback may call back into the host.
        if let Some(callback) = callback {
            callback();
        }
    }

    fn load_failed(&self, ticket: LoadTicket, reason: &str) {
        let mut state = mutex_lock(&self.state, LOG_TARGET, "navigation::load_failed");
        if state.generation != ticket.generation() || state.phase != LoadPhase::Pending {
            return;
        }
        state.phase = LoadPhase::Failed;
        warn!(
            target = LOG_TARGET,
            op = "navigation::load_failed",
            result = "failed",
            ticket = ticket.generation(),
            reason,
            "Document load failed"
        );
    }
}

fn classify_navigation(
    event: &NavigationEvent,
    configuration: &SurfaceConfiguration,
    open_links_externally: bool,
) -> NavigationDecision {
    let Some(url) = event.url.as_ref() else {
        return NavigationDecision::Allow;
    };

    if !event.kind.is_link_activation() {
        return NavigationDecision::Allow;
    }

    if configuration.has_scheme_handler(url.scheme()) {
        return NavigationDecision::AllowViaHandler;
    }

    if !open_links_externally {
        return NavigationDecision::Allow;
    }

    NavigationDecision::CancelAndOpenExternally
}
