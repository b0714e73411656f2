// src/commands.rs
//! Command handlers for the stevedore CLI

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use tracing::info;

use stevedore::config::Configuration;
use stevedore::coordinate::Coordinate;
use stevedore::install::{InstallOutcome, Installer};
use stevedore::job::runner::{JobRunner, ScriptKind};
use stevedore::job::{Job, JobStatus};

/// Refuse to run against an incomplete configuration. Checked before any
/// destructive or network operation.
fn require_complete(config: &Configuration) -> Result<()> {
    let missing = config.missing_fields();
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(|f| f.to_string()).collect();
        bail!(
            "configuration is missing mandatory fields: {}",
            names.join(", ")
        );
    }
    Ok(())
}

pub fn install(config: Configuration, coordinate: &str) -> Result<()> {
    require_complete(&config)?;
    let coordinate = Coordinate::parse(coordinate)?;
    let installer = Installer::new(config)?;

    match installer.install(&coordinate)? {
        InstallOutcome::Installed => println!("installed {coordinate}"),
        InstallOutcome::AlreadyInstalled => println!("{coordinate} is already installed"),
    }
    Ok(())
}

pub fn uninstall(config: Configuration, coordinate: &str) -> Result<()> {
    require_complete(&config)?;
    let coordinate = Coordinate::parse(coordinate)?;
    let installer = Installer::new(config)?;

    if installer.uninstall(&coordinate)? {
        println!("uninstalled {coordinate}");
    } else {
        println!("{coordinate} is not installed");
    }
    Ok(())
}

pub fn download(config: Configuration, coordinate: &str) -> Result<()> {
    require_complete(&config)?;
    let coordinate = Coordinate::parse(coordinate)?;
    let installer = Installer::new(config)?;

    let status = installer.download(&coordinate)?;
    if status != 200 {
        bail!("download failed with HTTP status {status} for {coordinate}");
    }
    println!(
        "downloaded {} to {}",
        coordinate,
        installer.config().download_path_for(&coordinate).display()
    );
    Ok(())
}

pub fn list(config: Configuration) -> Result<()> {
    require_complete(&config)?;
    let installer = Installer::new(config)?;
    for coordinate in installer.list()? {
        println!("{coordinate}");
    }
    Ok(())
}

pub fn resolve(config: Configuration, coordinate: &str) -> Result<()> {
    require_complete(&config)?;
    let coordinate = Coordinate::parse(coordinate)?;

    println!(
        "installDir       = {}",
        config.install_path_for(&coordinate).display()
    );
    println!(
        "downloadFilename = {}",
        config.download_path_for(&coordinate).display()
    );
    println!(
        "downloadUrl      = {}",
        coordinate.download_url(&config.package_base_url)
    );
    Ok(())
}

pub fn run_script(
    config: Configuration,
    coordinate: &str,
    runtime_dir: Option<PathBuf>,
    params: Vec<String>,
    kind: ScriptKind,
) -> Result<()> {
    require_complete(&config)?;
    let parsed = Coordinate::parse(coordinate)?;

    let runtime_dir = match runtime_dir {
        Some(dir) => dir,
        None => match &config.runtime_base_dir {
            Some(base) => base.join(parsed.path_fragment()),
            None => bail!("no --runtime-dir given and runtimeBaseDir is not configured"),
        },
    };

    let job = Job::new(
        runtime_dir.to_string_lossy().into_owned(),
        coordinate.to_string(),
        params,
    );

    info!("running {:?} script for {}", kind, parsed);
    let result = JobRunner::new(config).run(&job, kind);

    // Forward whatever the script said before reporting the outcome.
    print!("{}", result.stdout);
    let _ = std::io::stderr().write_all(result.stderr.as_bytes());

    match result.status {
        JobStatus::Success => Ok(()),
        JobStatus::ErrorCodeReturned => bail!(
            "script failed with exit code {}: {}",
            result.exit_code,
            result.message
        ),
        _ => bail!("{}", result.message),
    }
}

pub fn show_config(config: Configuration) -> Result<()> {
    print!("{}", config.to_toml());
    Ok(())
}
