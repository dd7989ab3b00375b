//! Remote file transport used to provision weights.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Capability to copy a remote resource to a local path.
///
/// Implementations must not leave a partial file at `dest` when they fail.
pub trait Fetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Blocking HTTP(S) fetcher.
///
/// Streams the body into `<dest>.part` and renames it into place once the
/// transfer completed.
pub struct HttpFetcher {
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let resp = ureq::get(url)
            .timeout(self.timeout)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(status, _) => FetchError::Status {
                    url: url.to_string(),
                    status,
                },
                other => FetchError::Transport {
                    url: url.to_string(),
                    message: other.to_string(),
                },
            })?;

        let partial = partial_path(dest);
        let written = copy_to(&mut resp.into_reader(), &partial).and_then(|bytes| {
            fs::rename(&partial, dest)?;
            Ok(bytes)
        });

        match written {
            Ok(bytes) => {
                tracing::debug!(url, dest = %dest.display(), bytes, "download complete");
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&partial);
                Err(e.into())
            }
        }
    }
}

fn copy_to(reader: &mut impl io::Read, path: &Path) -> io::Result<u64> {
    let mut file = File::create(path)?;
    let bytes = io::copy(reader, &mut file)?;
    file.flush()?;
    file.sync_all()?;
    Ok(bytes)
}

/// Sibling path used while a download is in flight.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
