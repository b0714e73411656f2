// src/repository/mod.rs

//! Package repository access.
//!
//! The repository is a plain HTTP file server: a GET to
//! `<base>/<group-path>/<artifact>/<version>/<artifact>-<version>-pkg.zip`
//! returns the archive with status 200, and any non-200 status is understood
//! as "not found / error" with no further status-specific handling.

mod client;

pub use client::RepositoryClient;
