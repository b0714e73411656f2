// src/lib.rs

//! Stevedore Package Manager
//!
//! Infrastructure package manager: resolves versioned package coordinates,
//! downloads and atomically installs their archives into a local directory
//! tree, and supervises the lifecycle scripts bundled inside an installed
//! package under strict output and time bounds.
//!
//! # Architecture
//!
//! - Coordinates: `group:artifact:version` identity, all paths and URLs
//!   derived from it
//! - Atomic placement: archives unpack into a staging directory that is
//!   renamed into place in one filesystem operation
//! - Bounded supervision: lifecycle scripts run as subprocesses with their
//!   output drained concurrently under a byte ceiling and a wall-clock
//!   timeout

pub mod archive;
pub mod config;
pub mod coordinate;
mod error;
pub mod install;
pub mod job;
pub mod repository;

pub use config::{ConfigField, ConfigOverlay, Configuration};
pub use coordinate::Coordinate;
pub use error::{Error, Result};
pub use install::{InstallOutcome, Installer};
pub use job::runner::{JobRunner, ScriptKind};
pub use job::{Job, JobResult, JobStatus};
pub use repository::RepositoryClient;
