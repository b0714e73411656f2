// src/install.rs

//! Package installation pipeline: download, unpack, atomic placement.
//!
//! Installation never exposes a half-extracted package at the canonical
//! install path. The archive is unpacked into a disposable staging directory
//! next to the final directory and then moved into place with a single
//! rename, so the only states ever observable at the install path are
//! "absent" and "fully installed". The existence of the final directory is
//! the sole signal that a package is installed.
//!
//! Concurrent installs of the same coordinate are serialized with an
//! advisory file lock next to the install directory; concurrent installs of
//! different coordinates do not contend.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::archive;
use crate::config::{Configuration, DOWNLOAD_DIR};
use crate::coordinate::Coordinate;
use crate::error::{Error, Result};
use crate::repository::RepositoryClient;

/// Suffix of the staging directory an archive is unpacked into
const UNPACK_DIR_SUFFIX: &str = "---unpack";

/// Suffix of the per-coordinate advisory lock file
const LOCK_FILE_SUFFIX: &str = "---lock";

/// Subdirectory that marks an installed package and holds its lifecycle
/// scripts
pub const SCRIPT_DIR: &str = "script.d";

/// What an install call actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The package was downloaded, unpacked and moved into place
    Installed,
    /// The install directory already existed; nothing was done
    AlreadyInstalled,
}

/// Package installer: downloads, unpacks and places packages under the
/// configured install root.
pub struct Installer {
    config: Configuration,
    client: RepositoryClient,
}

impl Installer {
    /// Create an installer for the given configuration
    pub fn new(config: Configuration) -> Result<Self> {
        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        };
        let client = RepositoryClient::new(credentials)?;
        Ok(Self { config, client })
    }

    /// The configuration this installer operates under
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Download the archive for a coordinate into the download cache.
    ///
    /// Returns the HTTP status code; a non-200 status leaves no file at the
    /// download path.
    pub fn download(&self, coordinate: &Coordinate) -> Result<u16> {
        let dest = self.config.download_path_for(coordinate);
        let url = coordinate.download_url(&self.config.package_base_url);

        info!("downloading {} from {}", coordinate, url);
        debug!("destination file = {}", dest.display());

        self.client.download_file(&url, &dest)
    }

    /// Install a package: download, unpack into staging, move into place.
    ///
    /// Idempotent at the directory level: if the install directory already
    /// exists the package is considered installed and nothing is re-verified
    /// or re-downloaded.
    pub fn install(&self, coordinate: &Coordinate) -> Result<InstallOutcome> {
        let final_dir = self.config.install_path_for(coordinate);

        if final_dir.exists() {
            info!("{} already installed at {}", coordinate, final_dir.display());
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        let _lock = CoordinateLock::acquire(&final_dir)?;

        // Another invocation may have completed while we waited for the lock.
        if final_dir.exists() {
            info!("{} already installed at {}", coordinate, final_dir.display());
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        let status = self.download(coordinate)?;
        if status != 200 {
            return Err(Error::DownloadError(format!(
                "HTTP status {status} for {coordinate}"
            )));
        }

        // Guard against a short-circuited download.
        let archive_file = self.config.download_path_for(coordinate);
        if !archive_file.exists() {
            return Err(Error::NotFound(archive_file));
        }

        let staging_dir = suffixed(&final_dir, UNPACK_DIR_SUFFIX);
        if staging_dir.exists() {
            // Residue from an earlier failed install.
            warn!("removing stale staging directory {}", staging_dir.display());
            fs::remove_dir_all(&staging_dir)?;
        }

        archive::extract(&archive_file, &staging_dir)?;

        // Single atomic move; on failure the destination state is unknown,
        // so no retry is attempted.
        fs::rename(&staging_dir, &final_dir).map_err(|e| {
            Error::PlacementError(format!(
                "unable to move {} to {}: {e}",
                staging_dir.display(),
                final_dir.display()
            ))
        })?;

        info!("installed {} at {}", coordinate, final_dir.display());
        Ok(InstallOutcome::Installed)
    }

    /// Remove an installed package tree. Idempotent: removing a package
    /// that is not installed is not an error.
    pub fn uninstall(&self, coordinate: &Coordinate) -> Result<bool> {
        let final_dir = self.config.install_path_for(coordinate);
        if !final_dir.exists() {
            info!("{} not installed, nothing to remove", coordinate);
            return Ok(false);
        }

        fs::remove_dir_all(&final_dir)?;
        info!("uninstalled {} from {}", coordinate, final_dir.display());
        Ok(true)
    }

    /// Enumerate installed packages.
    ///
    /// A directory under the install root counts as an installed package
    /// when it carries a `script.d` subdirectory and sits at least three
    /// levels deep (group path, artifact, version). The download cache and
    /// staging/lock residue are skipped.
    pub fn list(&self) -> Result<Vec<Coordinate>> {
        let root = &self.config.package_dir;
        let mut found = Vec::new();

        if !root.exists() {
            return Ok(found);
        }

        let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            name != DOWNLOAD_DIR && !name.contains("---")
        });

        for entry in walker {
            let entry = entry.map_err(|e| Error::ConfigError(format!("walk failed: {e}")))?;
            if !entry.file_type().is_dir() || !entry.path().join(SCRIPT_DIR).is_dir() {
                continue;
            }
            if let Some(coordinate) = coordinate_from_install_path(root, entry.path()) {
                found.push(coordinate);
            }
        }

        found.sort_by_key(|c| c.to_string());
        Ok(found)
    }
}

/// Map an install directory back to its coordinate: the last two path
/// components are artifact and version, everything above them is the
/// dot-separated group.
fn coordinate_from_install_path(root: &Path, dir: &Path) -> Option<Coordinate> {
    let relative = dir.strip_prefix(root).ok()?;
    let components: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if components.len() < 3 {
        return None;
    }

    let version = components[components.len() - 1].clone();
    let artifact = components[components.len() - 2].clone();
    let group = components[..components.len() - 2].join(".");
    Some(Coordinate::new(group, artifact, version))
}

/// Append a suffix to the final path component
fn suffixed(dir: &Path, suffix: &str) -> PathBuf {
    let mut s = dir.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

/// Advisory per-coordinate lock held for the duration of an install.
///
/// The lock file lives next to the install directory and stays on disk
/// after release; only the advisory lock itself is dropped.
struct CoordinateLock {
    file: File,
    path: PathBuf,
}

impl CoordinateLock {
    fn acquire(final_dir: &Path) -> Result<Self> {
        let path = suffixed(final_dir, LOCK_FILE_SUFFIX);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&path)?;
        debug!("acquiring install lock {}", path.display());
        file.lock_exclusive()?;
        Ok(Self { file, path })
    }
}

impl Drop for CoordinateLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!("unable to release install lock {}: {e}", self.path.display());
        }
    }
}
