//! Loading strategies and the staging directory behind the file-backed one.
//!
//! An in-memory load hands the page straight to the surface. A staged load
//! copies the template bundle into a private directory once, then rewrites only
//! `index.html` on each update so relative asset URLs resolve from disk.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Instant,
};

use metrics::counter;
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};
use url::Url;

use crate::application::error::{RenderError, StagingError, TemplateError, WriteError};
use crate::application::render::PageDocument;
use crate::application::surface::LoadTarget;
use crate::infra::assets::{INDEX_TEMPLATE, TemplateAssets};
use crate::infra::lock::mutex_lock;

const STAGING_PREFIX: &str = "markview-";
const LOG_TARGET: &str = "application::staging";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    InMemory,
    Staged,
}

impl LoadStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadStrategy::InMemory => "in_memory",
            LoadStrategy::Staged => "staged",
        }
    }
}

/// What [`ResourceMaterializer::ensure_staging`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingOutcome {
    /// A new directory was created and populated.
    Created,
    /// The existing directory already held the bundle.
    Reused,
    /// The existing directory had lost part of the bundle and was refilled in place.
    Repopulated,
}

/// A private directory holding a copy of the template bundle and the generated page.
#[derive(Debug)]
pub struct StagingLocation {
    dir: TempDir,
}

impl StagingLocation {
    fn create(root: &Path) -> Result<Self, StagingError> {
        fs::create_dir_all(root).map_err(|source| StagingError::Create {
            root: root.to_path_buf(),
            source,
        })?;
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(root)
            .map_err(|source| StagingError::Create {
                root: root.to_path_buf(),
                source,
            })?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.path().join(INDEX_TEMPLATE)
    }

    fn is_populated(&self, assets: &TemplateAssets) -> bool {
        match assets.top_level_entries() {
            Ok(entries) => entries.iter().all(|entry| self.path().join(entry).exists()),
            Err(_) => false,
        }
    }

    /// Delete the directory. Consumes the location so deletion happens once.
    pub(crate) fn remove(self) -> io::Result<()> {
        self.dir.close()
    }
}

/// Shared ownership of a host's staging location.
///
/// The host and its termination subscription both hold the slot; whichever
/// tears down first takes the location out, so deletion happens exactly once.
pub type StagingSlot = Arc<Mutex<Option<StagingLocation>>>;

/// Turns a page document into something a surface can load.
#[derive(Debug)]
pub struct ResourceMaterializer {
    assets: TemplateAssets,
    staging_root: PathBuf,
    slot: StagingSlot,
}

impl ResourceMaterializer {
    pub fn new(assets: TemplateAssets, staging_root: PathBuf) -> Self {
        Self {
            assets,
            staging_root,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn slot(&self) -> StagingSlot {
        Arc::clone(&self.slot)
    }

    pub fn staging_dir(&self) -> Option<PathBuf> {
        mutex_lock(&self.slot, LOG_TARGET, "staging::dir")
            .as_ref()
            .map(|location| location.path().to_path_buf())
    }

    /// Load the document from memory against the bundle's base URL.
    pub fn in_memory(&self, document: &PageDocument) -> Result<LoadTarget, TemplateError> {
        Ok(LoadTarget::Html {
            document: document.as_str().to_string(),
            base_url: self.assets.base_url()?,
        })
    }

    /// Write the document into the staging directory and point the surface at it.
    pub fn staged(
        &self,
        document: &PageDocument,
    ) -> Result<(LoadTarget, StagingOutcome), RenderError> {
        let (dir, outcome) = self.ensure_staging()?;
        let index = dir.join(INDEX_TEMPLATE);
        write_index(&dir, &index, document)?;

        let url = Url::from_file_path(&index)
            .map_err(|()| StagingError::Url { path: index.clone() })?;

        Ok((
            LoadTarget::File {
                url,
                read_access: dir,
            },
            outcome,
        ))
    }

    /// Make sure the staging directory exists and holds the full bundle.
    ///
    /// Safe to call repeatedly: the bundle is copied only when the directory is
    /// new or has lost part of its contents.
    pub fn ensure_staging(&self) -> Result<(PathBuf, StagingOutcome), StagingError> {
        let started_at = Instant::now();
        let mut slot = mutex_lock(&self.slot, LOG_TARGET, "staging::ensure");

        if let Some(location) = slot.as_ref() {
            let path = location.path().to_path_buf();
            if location.is_populated(&self.assets) {
                debug!(
                    target = LOG_TARGET,
                    op = "staging::ensure",
                    result = "reused",
                    staging_dir = %path.display(),
                    "Staging directory already populated"
                );
                return Ok((path, StagingOutcome::Reused));
            }

            self.copy_assets(&path)?;
            info!(
                target = LOG_TARGET,
                op = "staging::ensure",
                result = "repopulated",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                staging_dir = %path.display(),
                "Staging directory refilled after external modification"
            );
            return Ok((path, StagingOutcome::Repopulated));
        }

        let location = StagingLocation::create(&self.staging_root)?;
        let path = location.path().to_path_buf();
        // On copy failure `location` drops here and removes the partial directory.
        self.copy_assets(&path)?;
        *slot = Some(location);

        info!(
            target = LOG_TARGET,
            op = "staging::ensure",
            result = "created",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            staging_dir = %path.display(),
            "Staging directory created"
        );
        Ok((path, StagingOutcome::Created))
    }

    fn copy_assets(&self, destination: &Path) -> Result<(), StagingError> {
        self.assets
            .copy_into(destination)
            .map_err(|source| StagingError::Copy {
                destination: destination.to_path_buf(),
                source,
            })?;
        counter!("markview_staging_copy_total").increment(1);
        Ok(())
    }
}

/// Replace `index` atomically so a failed write leaves the previous page intact.
fn write_index(dir: &Path, index: &Path, document: &PageDocument) -> Result<(), WriteError> {
    let to_write_error = |source: io::Error| WriteError {
        path: index.to_path_buf(),
        source,
    };

    let mut staged = NamedTempFile::new_in(dir).map_err(to_write_error)?;
    staged
        .write_all(document.as_str().as_bytes())
        .map_err(to_write_error)?;
    staged.flush().map_err(to_write_error)?;
    staged
        .persist(index)
        .map_err(|err| to_write_error(err.error))?;

    debug!(
        target = LOG_TARGET,
        op = "staging::write_index",
        result = "written",
        index = %index.display(),
        bytes = document.as_str().len(),
        "Page document written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render::TemplateRenderer;

    fn document(body: &str) -> PageDocument {
        TemplateRenderer::new("inline", "<main>{{markview:content}}</main>".to_string())
            .expect("template")
            .render(body)
    }

    fn directory_assets(root: &Path) -> TemplateAssets {
        fs::create_dir_all(root.join("css")).expect("css dir");
        fs::write(root.join(INDEX_TEMPLATE), "<main>{{markview:content}}</main>").expect("index");
        fs::write(root.join("css/site.css"), "body{}").expect("css");
        TemplateAssets::directory(root).expect("assets")
    }

    #[test]
    fn in_memory_strategy_creates_nothing_on_disk() {
        let root = TempDir::new().expect("root");
        let materializer = ResourceMaterializer::new(
            TemplateAssets::bundled(),
            root.path().to_path_buf(),
        );

        let target = materializer.in_memory(&document("x")).expect("target");

        match target {
            LoadTarget::Html { document, base_url } => {
                assert_eq!(document, "<main>x</main>");
                assert_eq!(base_url.scheme(), "markview-bundle");
            }
            other => panic!("unexpected target: {other:?}"),
        }
        assert!(materializer.staging_dir().is_none());
        assert_eq!(fs::read_dir(root.path()).expect("read root").count(), 0);
    }

    #[test]
    fn staged_strategy_writes_index_and_scopes_read_access() {
        let source = TempDir::new().expect("source");
        let root = TempDir::new().expect("root");
        let materializer =
            ResourceMaterializer::new(directory_assets(source.path()), root.path().to_path_buf());

        let (target, outcome) = materializer.staged(&document("<p>one</p>")).expect("staged");
        assert_eq!(outcome, StagingOutcome::Created);

        let staging = materializer.staging_dir().expect("staging dir");
        assert!(staging.starts_with(root.path()));
        match target {
            LoadTarget::File { url, read_access } => {
                assert_eq!(read_access, staging);
                assert_eq!(url.to_file_path().expect("file url"), staging.join(INDEX_TEMPLATE));
            }
            other => panic!("unexpected target: {other:?}"),
        }
        assert_eq!(
            fs::read_to_string(staging.join(INDEX_TEMPLATE)).expect("index"),
            "<main><p>one</p></main>"
        );
        assert!(staging.join("css/site.css").is_file());
    }

    #[test]
    fn second_stage_reuses_directory_without_recopying() {
        let source = TempDir::new().expect("source");
        let root = TempDir::new().expect("root");
        let materializer =
            ResourceMaterializer::new(directory_assets(source.path()), root.path().to_path_buf());

        materializer.staged(&document("first")).expect("first");
        let staging = materializer.staging_dir().expect("staging dir");
        // A re-copy would restore the original stylesheet.
        fs::write(staging.join("css/site.css"), "edited").expect("edit");

        let (_, outcome) = materializer.staged(&document("second")).expect("second");

        assert_eq!(outcome, StagingOutcome::Reused);
        assert_eq!(materializer.staging_dir().as_deref(), Some(staging.as_path()));
        assert_eq!(
            fs::read_to_string(staging.join("css/site.css")).expect("css"),
            "edited"
        );
        assert_eq!(
            fs::read_to_string(staging.join(INDEX_TEMPLATE)).expect("index"),
            "<main>second</main>"
        );
    }

    #[test]
    fn missing_assets_are_restored_in_place() {
        let source = TempDir::new().expect("source");
        let root = TempDir::new().expect("root");
        let materializer =
            ResourceMaterializer::new(directory_assets(source.path()), root.path().to_path_buf());

        materializer.staged(&document("first")).expect("first");
        let staging = materializer.staging_dir().expect("staging dir");
        fs::remove_dir_all(staging.join("css")).expect("remove css");

        let (_, outcome) = materializer.staged(&document("second")).expect("second");

        assert_eq!(outcome, StagingOutcome::Repopulated);
        assert!(staging.join("css/site.css").is_file());
    }

    #[test]
    fn unwritable_root_reports_staging_error() {
        let root = TempDir::new().expect("root");
        let blocker = root.path().join("file");
        fs::write(&blocker, "not a directory").expect("blocker");

        let materializer = ResourceMaterializer::new(TemplateAssets::bundled(), blocker);
        let err = materializer
            .staged(&document("x"))
            .expect_err("staging under a file must fail");

        assert!(matches!(err, RenderError::Staging(StagingError::Create { .. })));
        assert!(materializer.staging_dir().is_none());
    }

    #[test]
    fn failed_index_write_keeps_previous_page() {
        let source = TempDir::new().expect("source");
        let root = TempDir::new().expect("root");
        let materializer =
            ResourceMaterializer::new(directory_assets(source.path()), root.path().to_path_buf());

        materializer.staged(&document("kept")).expect("first");
        let staging = materializer.staging_dir().expect("staging dir");
        let index = staging.join(INDEX_TEMPLATE);

        // The sibling temp file cannot be created in a missing directory.
        let err = write_index(&staging.join("missing-subdir"), &index, &document("lost"))
            .expect_err("write into missing dir fails");
        assert_eq!(err.path, index);
        assert_eq!(
            fs::read_to_string(&index).expect("index"),
            "<main>kept</main>"
        );
    }

    #[test]
    fn removing_location_deletes_directory() {
        let root = TempDir::new().expect("root");
        let location = StagingLocation::create(root.path()).expect("location");
        let path = location.path().to_path_buf();
        assert!(path.is_dir());

        location.remove().expect("remove");
        assert!(!path.exists());
    }
}
