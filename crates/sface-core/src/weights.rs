//! On-disk cache of model weights.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::fetch::{FetchError, Fetcher};

#[derive(Error, Debug)]
pub enum ProvisioningError {
    #[error("failed to fetch weights from {url}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to prepare weights directory {path}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("fetch of {url} reported success but {path} does not exist")]
    Missing { url: String, path: PathBuf },
}

/// Guarantees a weights file exists before the engine is built.
///
/// A file that is present is trusted as-is; nothing is verified or replaced.
pub struct WeightsCache<'a> {
    fetcher: &'a dyn Fetcher,
}

impl<'a> WeightsCache<'a> {
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        Self { fetcher }
    }

    /// Make sure `path` exists, downloading it from `url` if it does not.
    ///
    /// Returns without touching the network when the file is already there.
    /// No retries: a failed fetch is reported and the next call tries again.
    pub fn ensure(&self, path: &Path, url: &str) -> Result<(), ProvisioningError> {
        if path.is_file() {
            tracing::debug!(path = %path.display(), "weights already cached");
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ProvisioningError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        tracing::info!(path = %path.display(), url, "weights will be downloaded");

        self.fetcher
            .fetch(url, path)
            .map_err(|source| ProvisioningError::Fetch {
                url: url.to_string(),
                source,
            })?;

        if !path.is_file() {
            return Err(ProvisioningError::Missing {
                url: url.to_string(),
                path: path.to_path_buf(),
            });
        }

        tracing::info!(path = %path.display(), "weights cached");
        Ok(())
    }
}
