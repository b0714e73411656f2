// src/repository/client.rs

//! HTTP client for repository downloads.
//!
//! Wraps reqwest with retry support and streams response bodies straight to
//! the destination file so an archive is never buffered in memory. The
//! timeout, redirect, retry and connection limits are fixed engineering
//! constants chosen to bound resource use under repository flakiness; they
//! are not user-configurable.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Request timeout for archive downloads (5 minutes)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Maximum number of redirects to follow
const MAX_REDIRECTS: usize = 3;

/// Maximum attempts on transient transport failure
const MAX_ATTEMPTS: u32 = 5;

/// Cap on connections per repository host
const MAX_CONNECTIONS_PER_HOST: usize = 3;

/// Retry delay in milliseconds, scaled by attempt number
const RETRY_DELAY_MS: u64 = 1000;

/// Buffer size for streaming downloads (8 KiB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// HTTP client wrapper with retry support
pub struct RepositoryClient {
    client: Client,
    credentials: Option<(String, String)>,
}

impl RepositoryClient {
    /// Create a new repository client, optionally with basic-auth
    /// credentials applied to every request.
    pub fn new(credentials: Option<(String, String)>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .pool_max_idle_per_host(MAX_CONNECTIONS_PER_HOST)
            .build()
            .map_err(|e| Error::DownloadError(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            credentials,
        })
    }

    /// Download `url` into `dest`, creating parent directories as needed.
    ///
    /// Returns the HTTP status code. On a non-200 status the destination
    /// file is not left behind; on transient transport failure the request
    /// is retried up to the attempt limit before reporting an error.
    pub fn download_file(&self, url: &str, dest: &Path) -> Result<u16> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_download(url, dest) {
                Ok(status) => return Ok(status),
                Err(e) => {
                    // Anything that got this far produced no usable file.
                    let _ = fs::remove_file(dest);
                    if attempt >= MAX_ATTEMPTS {
                        return Err(Error::DownloadError(format!(
                            "failed to fetch {url} after {attempt} attempts: {e}"
                        )));
                    }
                    warn!("download attempt {} for {} failed: {}, retrying...", attempt, url, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }

    /// One download attempt. A non-success status is a result, not an
    /// error; transport and stream failures are errors and retried by the
    /// caller.
    fn try_download(&self, url: &str, dest: &Path) -> Result<u16> {
        let mut request = self.client.get(url);
        if let Some((user, pass)) = &self.credentials {
            request = request.basic_auth(user, Some(pass));
        }

        let mut response = request.send()?;
        let status = response.status();

        if !status.is_success() {
            warn!("download failed, status = {} for {}", status.as_u16(), url);
            // Nothing was written for this URL, but an earlier attempt may
            // have left junk behind.
            let _ = fs::remove_file(dest);
            return Ok(status.as_u16());
        }

        let mut file = File::create(dest)?;
        let written = stream_response_to_file(&mut response, &mut file)?;
        debug!("downloaded {} bytes from {} to {}", written, url, dest.display());

        Ok(status.as_u16())
    }
}

/// Stream an HTTP response body to a file in fixed-size chunks
fn stream_response_to_file(
    response: &mut reqwest::blocking::Response,
    file: &mut File,
) -> Result<u64> {
    let mut written: u64 = 0;
    let mut buffer = [0u8; STREAM_BUFFER_SIZE];

    loop {
        let n = response
            .read(&mut buffer)
            .map_err(|e| Error::DownloadError(format!("failed to read response: {e}")))?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])
            .map_err(|e| Error::DownloadError(format!("failed to write download: {e}")))?;
        written += n as u64;
    }

    Ok(written)
}
