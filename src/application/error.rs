use std::{io, path::PathBuf};

use thiserror::Error;

use crate::infra::error::InfraError;

/// Failure reported by a Markdown converter.
#[derive(Debug, Clone, Error)]
pub enum ConversionError {
    #[error("markdown conversion failed: {message}")]
    Markdown { message: String },
}

/// The template bundle is missing, unreadable, or malformed.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template `{name}` not found in asset bundle")]
    Missing { name: String },
    #[error("failed to read template {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("template `{name}` is not valid UTF-8")]
    Encoding { name: String },
    #[error("template `{name}` must contain the content placeholder exactly once, found {count}")]
    Placeholder { name: String, count: usize },
    #[error("asset bundle root {} is not a usable directory", .path.display())]
    InvalidRoot { path: PathBuf },
}

/// The staging directory could not be created or populated.
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("failed to create staging directory under {}: {source}", .root.display())]
    Create {
        root: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to copy template assets into {}: {source}", .destination.display())]
    Copy {
        destination: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("staged path {} cannot be expressed as a file URL", .path.display())]
    Url { path: PathBuf },
}

/// The page document could not be written into the staging directory.
#[derive(Debug, Error)]
#[error("failed to write page document to {}: {source}", .path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// The content surface refused a load request.
#[derive(Debug, Clone, Error)]
pub enum SurfaceError {
    #[error("content surface rejected load: {message}")]
    Rejected { message: String },
}

impl SurfaceError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// The external opener could not hand a URL to the platform.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("failed to launch external opener for {url}: {source}")]
    Spawn {
        url: String,
        #[source]
        source: io::Error,
    },
}

/// Error surfaced by `ContentHost::render` and `ContentHost::update`.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Top-level error for the command-line front end.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("failed to read {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

impl From<TemplateError> for AppError {
    fn from(error: TemplateError) -> Self {
        Self::Render(RenderError::Template(error))
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn render_error_is_transparent_over_cause() {
        let error = RenderError::from(TemplateError::Placeholder {
            name: "index.html".into(),
            count: 0,
        });
        assert_eq!(
            error.to_string(),
            "template `index.html` must contain the content placeholder exactly once, found 0"
        );
    }

    #[test]
    fn write_error_exposes_io_source() {
        let error = WriteError {
            path: PathBuf::from("/tmp/markview/index.html"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(error.to_string().contains("/tmp/markview/index.html"));
        assert_eq!(
            error.source().map(ToString::to_string).as_deref(),
            Some("denied")
        );
    }
}
