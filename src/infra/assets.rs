//! Template asset bundles and the custom scheme that serves the compiled-in one.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use bytes::Bytes;
use include_dir::{Dir, include_dir};
use tracing::debug;
use url::Url;
use walkdir::WalkDir;

use crate::application::error::TemplateError;
use crate::application::surface::{SchemeHandler, SchemeResponse};

static TEMPLATE_BUNDLE: Dir<'_> = include_dir!("$OUT_DIR/template_bundle");

/// File name of the page template inside every bundle.
pub const INDEX_TEMPLATE: &str = "index.html";
/// Custom scheme under which the compiled-in bundle is served.
pub const BUNDLE_SCHEME: &str = "markview-bundle";
const BUNDLE_BASE_URL: &str = "markview-bundle://assets/";

/// Read-only set of template assets: an `index.html` template plus whatever
/// stylesheets, scripts and images it references by relative URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateAssets {
    /// The bundle compiled into the binary.
    #[default]
    Bundled,
    /// A caller-supplied directory, stored as an absolute path.
    Directory(PathBuf),
}

impl TemplateAssets {
    pub fn bundled() -> Self {
        Self::Bundled
    }

    /// Use `root` as the asset bundle. The path is canonicalised so it can be
    /// expressed as a `file://` base URL.
    pub fn directory(root: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root).map_err(|_| TemplateError::InvalidRoot {
            path: root.to_path_buf(),
        })?;
        if !canonical.is_dir() {
            return Err(TemplateError::InvalidRoot { path: canonical });
        }
        Ok(Self::Directory(canonical))
    }

    pub fn read_index(&self) -> Result<String, TemplateError> {
        match self {
            TemplateAssets::Bundled => {
                let file = TEMPLATE_BUNDLE.get_file(INDEX_TEMPLATE).ok_or_else(|| {
                    TemplateError::Missing {
                        name: INDEX_TEMPLATE.to_string(),
                    }
                })?;
                file.contents_utf8()
                    .map(str::to_string)
                    .ok_or_else(|| TemplateError::Encoding {
                        name: INDEX_TEMPLATE.to_string(),
                    })
            }
            TemplateAssets::Directory(root) => {
                let path = root.join(INDEX_TEMPLATE);
                let bytes = fs::read(&path).map_err(|source| {
                    if source.kind() == io::ErrorKind::NotFound {
                        TemplateError::Missing {
                            name: path.display().to_string(),
                        }
                    } else {
                        TemplateError::Read {
                            path: path.clone(),
                            source,
                        }
                    }
                })?;
                String::from_utf8(bytes).map_err(|_| TemplateError::Encoding {
                    name: path.display().to_string(),
                })
            }
        }
    }

    /// Base URL for in-memory loads so relative references resolve against the bundle.
    pub fn base_url(&self) -> Result<Url, TemplateError> {
        match self {
            TemplateAssets::Bundled => {
                Url::parse(BUNDLE_BASE_URL).map_err(|_| TemplateError::InvalidRoot {
                    path: PathBuf::from(BUNDLE_BASE_URL),
                })
            }
            TemplateAssets::Directory(root) => {
                Url::from_directory_path(root).map_err(|()| TemplateError::InvalidRoot {
                    path: root.clone(),
                })
            }
        }
    }

    /// Names of the bundle's top-level entries, relative to its root.
    pub fn top_level_entries(&self) -> io::Result<Vec<PathBuf>> {
        match self {
            TemplateAssets::Bundled => Ok(TEMPLATE_BUNDLE
                .entries()
                .iter()
                .map(|entry| entry.path().to_path_buf())
                .collect()),
            TemplateAssets::Directory(root) => fs::read_dir(root)?
                .map(|entry| entry.map(|entry| PathBuf::from(entry.file_name())))
                .collect(),
        }
    }

    /// Copy the whole bundle into `destination`, creating it when needed.
    pub fn copy_into(&self, destination: &Path) -> io::Result<()> {
        fs::create_dir_all(destination)?;
        match self {
            TemplateAssets::Bundled => TEMPLATE_BUNDLE.extract(destination),
            TemplateAssets::Directory(root) => copy_tree(root, destination),
        }
    }
}

fn copy_tree(source: &Path, destination: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let target_path = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target_path)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target_path)?;
        }
    }

    Ok(())
}

/// Serves the compiled-in bundle under `markview-bundle://assets/<path>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundleSchemeHandler;

impl SchemeHandler for BundleSchemeHandler {
    fn respond(&self, url: &Url) -> Option<SchemeResponse> {
        if !url.scheme().eq_ignore_ascii_case(BUNDLE_SCHEME) {
            return None;
        }

        let Some(candidate) = resolve_asset_path(url.path()) else {
            debug!(
                target = "infra::assets",
                op = "bundle::respond",
                result = "rejected",
                url = %url,
                "Bundle asset request rejected"
            );
            return None;
        };

        let file = TEMPLATE_BUNDLE.get_file(candidate)?;
        let mime = mime_guess::from_path(candidate).first_or_octet_stream();
        Some(SchemeResponse {
            body: Bytes::from_static(file.contents()),
            mime,
        })
    }
}

fn resolve_asset_path(path: &str) -> Option<&str> {
    let candidate = path.trim_start_matches('/');

    if candidate.is_empty() || candidate.ends_with('/') || candidate.contains("..") {
        // Avoid directory traversal and disallow directory listings.
        return None;
    }

    Some(candidate)
}
