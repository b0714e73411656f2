// src/cli.rs
//! CLI definitions for the stevedore package manager
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use stevedore::config::ConfigOverlay;

#[derive(Parser)]
#[command(name = "stevedore")]
#[command(version)]
#[command(about = "Infrastructure package manager with atomic installs and bounded lifecycle script execution", long_about = None)]
pub struct Cli {
    /// Explicit configuration file, applied on top of the standard locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConfigArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Configuration overrides; these win over every configuration file
#[derive(Args, Default)]
pub struct ConfigArgs {
    /// Root directory under which packages are installed
    #[arg(long, global = true)]
    pub package_dir: Option<PathBuf>,

    /// Base URL of the package repository
    #[arg(long, global = true)]
    pub package_base_url: Option<String>,

    /// Base directory for per-service runtime directories
    #[arg(long, global = true)]
    pub runtime_base_dir: Option<PathBuf>,
}

impl ConfigArgs {
    /// Turn the flag overrides into the highest-priority overlay layer
    pub fn into_overlay(self) -> ConfigOverlay {
        ConfigOverlay {
            package_dir: self.package_dir,
            package_base_url: self.package_base_url,
            runtime_base_dir: self.runtime_base_dir,
            ..ConfigOverlay::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a package
    Install {
        /// Package coordinate (group:artifact:version)
        coordinate: String,
    },

    /// Uninstall a package
    Uninstall {
        /// Package coordinate (group:artifact:version)
        coordinate: String,
    },

    /// Download a package archive into the download cache without installing
    Download {
        /// Package coordinate (group:artifact:version)
        coordinate: String,
    },

    /// List installed packages
    List,

    /// Show the derived paths and download URL for a coordinate
    Resolve {
        /// Package coordinate (group:artifact:version)
        coordinate: String,
    },

    /// Run a package's start script
    Start {
        /// Package coordinate (group:artifact:version)
        coordinate: String,

        /// Runtime directory handed to the script; derived from the
        /// configured runtime base dir when omitted
        #[arg(long)]
        runtime_dir: Option<PathBuf>,

        /// Extra parameters passed to the script verbatim, in order,
        /// given after `--`
        #[arg(last = true)]
        params: Vec<String>,
    },

    /// Run a package's stop script
    Stop {
        /// Package coordinate (group:artifact:version)
        coordinate: String,

        /// Runtime directory handed to the script; derived from the
        /// configured runtime base dir when omitted
        #[arg(long)]
        runtime_dir: Option<PathBuf>,

        /// Extra parameters passed to the script verbatim, in order,
        /// given after `--`
        #[arg(last = true)]
        params: Vec<String>,
    },

    /// Print the effective configuration in its on-disk TOML form
    Config,
}
