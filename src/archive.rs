// src/archive.rs

//! Zip archive extraction for package installation.
//!
//! Unpacks a downloaded package archive into a destination directory with a
//! minimum of fuss: intermediate directories are created as needed, the
//! executable bit and modification time of each entry are propagated to the
//! destination file, and entry names are checked against path traversal.
//!
//! Entries are processed once, in archive order, with no rollback on partial
//! failure. A failed extraction leaves a partially populated destination
//! behind, which is why the installer always extracts into a disposable
//! staging directory and never into the final install path.

use std::fs::{self, File};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use filetime::FileTime;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Unpack a zip archive into the destination directory.
///
/// Creates the destination directory tree if it is absent. A mismatch
/// between an entry's declared size and the bytes actually present is logged
/// and tolerated; the zip format does not guarantee declared sizes are
/// authoritative.
pub fn extract(source: &Path, destination: &Path) -> Result<()> {
    if !source.exists() {
        return Err(Error::NotFound(source.to_path_buf()));
    }

    fs::create_dir_all(destination).map_err(|e| {
        Error::ExtractionError(format!(
            "unable to create directory {}: {e}",
            destination.display()
        ))
    })?;

    // Invariant: source exists and destination directory exists

    let file = File::open(source)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| Error::ExtractionError(format!("unreadable archive {}: {e}", source.display())))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| {
            Error::ExtractionError(format!("corrupt entry #{index} in {}: {e}", source.display()))
        })?;

        // Refuse entries whose names escape the destination directory.
        let Some(relative) = entry.enclosed_name() else {
            return Err(Error::ExtractionError(format!(
                "entry '{}' escapes the destination directory",
                entry.name()
            )));
        };
        let dest_path = destination.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest_path).map_err(|e| {
                Error::ExtractionError(format!(
                    "unable to create directory {}: {e}",
                    dest_path.display()
                ))
            })?;
            debug!("created dir {}", dest_path.display());
            continue;
        }

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::ExtractionError(format!(
                    "unable to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let mut out = File::create(&dest_path).map_err(|e| {
            Error::ExtractionError(format!("unable to write {}: {e}", dest_path.display()))
        })?;
        let written = io::copy(&mut entry, &mut out).map_err(|e| {
            Error::ExtractionError(format!("unable to write {}: {e}", dest_path.display()))
        })?;

        // Tolerated: declared entry sizes are advisory.
        if written != entry.size() {
            warn!(
                "expected {} bytes, got {} for {}",
                entry.size(),
                written,
                dest_path.display()
            );
        }

        propagate_mode(entry.unix_mode(), &dest_path)?;
        propagate_mtime(entry.last_modified(), &dest_path);

        debug!("extracted {} [{}]", dest_path.display(), written);
    }

    Ok(())
}

/// Carry an entry's permission bits over to the destination file when any
/// execute bit is set. Entries without unix metadata keep default perms.
fn propagate_mode(mode: Option<u32>, dest: &Path) -> Result<()> {
    if let Some(mode) = mode {
        if mode & 0o111 != 0 {
            fs::set_permissions(dest, fs::Permissions::from_mode(mode & 0o777)).map_err(|e| {
                Error::ExtractionError(format!(
                    "unable to set permissions on {}: {e}",
                    dest.display()
                ))
            })?;
        }
    }
    Ok(())
}

/// Carry an entry's modification time over to the destination file.
/// Missing or unrepresentable timestamps are tolerated.
fn propagate_mtime(modified: Option<zip::DateTime>, dest: &Path) {
    let Some(modified) = modified else {
        return;
    };
    match time::OffsetDateTime::try_from(modified) {
        Ok(when) => {
            let mtime = FileTime::from_unix_time(when.unix_timestamp(), 0);
            if let Err(e) = filetime::set_file_mtime(dest, mtime) {
                warn!("unable to set mtime on {}: {e}", dest.display());
            }
        }
        Err(e) => warn!("unrepresentable timestamp on {}: {e}", dest.display()),
    }
}
