//! Render Markdown into an embedded content surface.
//!
//! [`ContentHost`] converts Markdown with comrak, substitutes the result into a
//! template page, and loads it into a [`ContentSurface`] either from memory or
//! from a staging directory holding a copy of the template assets. A
//! [`NavigationMediator`] installed on the surface decides which navigations
//! proceed in place and which are handed to the system opener.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;

pub use application::error::RenderError;
pub use application::host::{ContentHost, HostOptions};
pub use application::navigation::{NavigationMediator, OnLoaded, PendingLoad};
pub use application::staging::LoadStrategy;
pub use application::surface::{
    ContentSurface, ExternalOpener, LoadRequest, LoadTarget, NavigationObserver,
    TerminationNotifier,
};
pub use domain::navigation::{
    LoadTicket, NavigationDecision, NavigationEvent, NavigationKind, ResponseEvent,
};
pub use domain::options::{ConversionOptions, RenderOptions};
pub use infra::assets::TemplateAssets;
pub use infra::headless::HeadlessSurface;
pub use infra::termination::TerminationHub;
