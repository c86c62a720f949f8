//! Platform "open externally" action.

use tracing::debug;
use url::Url;

use crate::application::error::OpenError;
use crate::application::surface::ExternalOpener;

/// Hands URLs to the desktop's default handler without waiting for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl ExternalOpener for SystemOpener {
    fn open(&self, url: &Url) -> Result<(), OpenError> {
        open::that_detached(url.as_str()).map_err(|source| OpenError::Spawn {
            url: url.to_string(),
            source,
        })?;

        debug!(
            target = "infra::opener",
            op = "opener::open",
            result = "spawned",
            url = %url,
            "External opener launched"
        );
        Ok(())
    }
}
