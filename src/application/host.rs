//! The content host: converts Markdown, templates it, and loads it into a surface.

use std::{
    env,
    path::PathBuf,
    sync::Arc,
    time::Instant,
};

use metrics::counter;
use tracing::{info, warn};

use crate::application::error::RenderError;
use crate::application::lifecycle::LifecycleManager;
use crate::application::navigation::{NavigationMediator, OnLoaded};
use crate::application::render::{
    MarkdownConverter, PageDocument, TemplateRenderer, default_converter,
};
use crate::application::staging::{LoadStrategy, ResourceMaterializer};
use crate::application::surface::{
    ContentSurface, ExternalOpener, LoadRequest, NavigationObserver, TerminationNotifier,
};
use crate::domain::navigation::LoadTicket;
use crate::domain::options::{ConversionOptions, RenderOptions};
use crate::infra::assets::TemplateAssets;
use crate::infra::opener::SystemOpener;

const LOG_TARGET: &str = "application::host";

/// Construction-time options and collaborators for [`ContentHost::render`].
#[derive(Clone)]
pub struct HostOptions {
    pub open_links_externally: bool,
    pub template_assets: TemplateAssets,
    pub writable_staging: bool,
    pub conversion: ConversionOptions,
    pub on_loaded: Option<OnLoaded>,
    /// Parent directory for staging directories.
    pub staging_root: PathBuf,
    pub converter: Arc<dyn MarkdownConverter>,
    pub opener: Option<Arc<dyn ExternalOpener>>,
    pub termination: Option<Arc<dyn TerminationNotifier>>,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            open_links_externally: true,
            template_assets: TemplateAssets::default(),
            writable_staging: false,
            conversion: ConversionOptions::default(),
            on_loaded: None,
            staging_root: env::temp_dir(),
            converter: default_converter(),
            opener: Some(Arc::new(SystemOpener)),
            termination: None,
        }
    }
}

impl HostOptions {
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.open_links_externally = options.open_links_externally;
        self.writable_staging = options.writable_staging;
        self.conversion = options.conversion;
        self
    }

    pub fn with_template_assets(mut self, assets: TemplateAssets) -> Self {
        self.template_assets = assets;
        self
    }

    pub fn with_on_loaded(mut self, on_loaded: OnLoaded) -> Self {
        self.on_loaded = Some(on_loaded);
        self
    }

    pub fn with_staging_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.staging_root = root.into();
        self
    }

    pub fn with_converter(mut self, converter: Arc<dyn MarkdownConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_opener(mut self, opener: Arc<dyn ExternalOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn without_opener(mut self) -> Self {
        self.opener = None;
        self
    }

    pub fn with_termination(mut self, notifier: Arc<dyn TerminationNotifier>) -> Self {
        self.termination = Some(notifier);
        self
    }

    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            open_links_externally: self.open_links_externally,
            writable_staging: self.writable_staging,
            conversion: self.conversion.clone(),
        }
    }
}

/// Displays rendered Markdown inside a [`ContentSurface`].
///
/// The host is the single owner of its staging directory and its navigation
/// mediator. Dropping it (or calling [`ContentHost::close`]) detaches the
/// mediator from the surface and removes the staging directory.
pub struct ContentHost {
    surface: Arc<dyn ContentSurface>,
    converter: Arc<dyn MarkdownConverter>,
    renderer: TemplateRenderer,
    materializer: ResourceMaterializer,
    mediator: Arc<NavigationMediator>,
    lifecycle: LifecycleManager,
    options: RenderOptions,
    on_loaded: Option<OnLoaded>,
    observer_installed: bool,
    document: PageDocument,
    strategy: LoadStrategy,
}

impl ContentHost {
    /// Build a host and issue its first load.
    ///
    /// Nothing is left behind on failure: a partially created staging
    /// directory is removed and the surface keeps no observer.
    pub fn render(
        surface: Arc<dyn ContentSurface>,
        markdown: &str,
        options: HostOptions,
    ) -> Result<Self, RenderError> {
        let render_options = options.render_options();
        let HostOptions {
            template_assets,
            on_loaded,
            staging_root,
            converter,
            opener,
            termination,
            ..
        } = options;

        let renderer = TemplateRenderer::from_assets(&template_assets)?;
        let materializer = ResourceMaterializer::new(template_assets, staging_root);
        let lifecycle = LifecycleManager::new(materializer.slot(), termination);
        let mediator = Arc::new(NavigationMediator::new(
            render_options.open_links_externally,
            opener,
        ));

        let mut host = Self {
            surface,
            converter,
            renderer,
            materializer,
            mediator,
            lifecycle,
            options: render_options.clone(),
            on_loaded: on_loaded.clone(),
            observer_installed: false,
            document: PageDocument::default(),
            strategy: LoadStrategy::InMemory,
        };

        host.present(markdown, &render_options, on_loaded)?;
        Ok(host)
    }

    /// Re-render in place.
    ///
    /// `options` and `on_loaded` replace the stored values only when supplied,
    /// and only once the new load was accepted. On error the surface keeps
    /// showing the previous document.
    pub fn update(
        &mut self,
        markdown: &str,
        options: Option<RenderOptions>,
        on_loaded: Option<OnLoaded>,
    ) -> Result<(), RenderError> {
        let options = options.unwrap_or_else(|| self.options.clone());
        let on_loaded = on_loaded.or_else(|| self.on_loaded.clone());

        self.present(markdown, &options, on_loaded.clone())?;

        self.options = options;
        self.on_loaded = on_loaded;
        Ok(())
    }

    pub fn page_document(&self) -> &PageDocument {
        &self.document
    }

    pub fn strategy(&self) -> LoadStrategy {
        self.strategy
    }

    pub fn staging_dir(&self) -> Option<PathBuf> {
        self.materializer.staging_dir()
    }

    /// Whether the surface has reported completion of the latest load.
    pub fn is_loaded(&self) -> bool {
        self.mediator.is_loaded()
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn current_ticket(&self) -> LoadTicket {
        self.mediator.current_ticket()
    }

    pub fn close(mut self) {
        self.shutdown();
    }

    fn present(
        &mut self,
        markdown: &str,
        options: &RenderOptions,
        on_loaded: Option<OnLoaded>,
    ) -> Result<(), RenderError> {
        let started_at = Instant::now();

        let html = self.converter.convert(markdown, &options.conversion)?;
        let document = self.renderer.render(&html);

        let strategy = if options.writable_staging || self.surface.requires_file_staging() {
            LoadStrategy::Staged
        } else {
            LoadStrategy::InMemory
        };

        let target = match strategy {
            LoadStrategy::InMemory => self.materializer.in_memory(&document)?,
            LoadStrategy::Staged => {
                let (target, _outcome) = self.materializer.staged(&document)?;
                self.lifecycle.watch_termination();
                target
            }
        };

        self.sync_observer(options.open_links_externally || on_loaded.is_some());

        let pending = self
            .mediator
            .begin_load(on_loaded, options.open_links_externally);
        let ticket = pending.ticket();
        if let Err(err) = self.surface.load(LoadRequest { ticket, target }) {
            self.mediator.abandon(pending);
            warn!(
                target = LOG_TARGET,
                op = "host::load",
                result = "rejected",
                ticket = ticket.generation(),
                strategy = strategy.as_str(),
                error = %err,
                "Content surface rejected load"
            );
            return Err(err.into());
        }

        counter!("markview_load_total", "strategy" => strategy.as_str()).increment(1);
        info!(
            target = LOG_TARGET,
            op = "host::load",
            result = "issued",
            ticket = ticket.generation(),
            strategy = strategy.as_str(),
            bytes = document.as_str().len(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Page document handed to surface"
        );

        self.document = document;
        self.strategy = strategy;
        Ok(())
    }

    fn sync_observer(&mut self, needed: bool) {
        if !needed || self.observer_installed {
            return;
        }
        let observer: Arc<dyn NavigationObserver> = self.mediator.clone();
        self.surface.set_navigation_observer(Some(observer));
        self.observer_installed = true;
    }

    fn shutdown(&mut self) {
        if self.observer_installed {
            self.surface.set_navigation_observer(None);
            self.observer_installed = false;
        }
        self.lifecycle.teardown();
    }
}

impl Drop for ContentHost {
    fn drop(&mut self) {
        self.shutdown();
    }
}
