// tests/install.rs

//! Integration tests for the download/install/uninstall pipeline, run
//! against a static HTTP fixture server.

mod common;

use std::fs;
use std::os::unix::fs::PermissionsExt;

use common::{StaticHttpServer, write_package_archive};
use stevedore::{Configuration, Coordinate, Error, InstallOutcome, Installer};
use tempfile::TempDir;

const COORDINATE: &str = "com.example:artifact:1.2.3";

struct Fixture {
    // Held for cleanup; the server and config borrow paths inside it.
    _temp: TempDir,
    _server: StaticHttpServer,
    config: Configuration,
}

/// Serve one packaged artifact (`com.example:artifact:1.2.3`) from a fresh
/// repository root, installing into a fresh package dir.
fn setup() -> Fixture {
    let temp = tempfile::tempdir().unwrap();
    let repo_root = temp.path().join("repo");
    let package_dir = temp.path().join("packages");

    write_package_archive(
        &repo_root.join("com/example/artifact/1.2.3/artifact-1.2.3-pkg.zip"),
    );

    let server = StaticHttpServer::start(repo_root);
    let config = Configuration::new(&package_dir, server.base_url());

    Fixture {
        _temp: temp,
        _server: server,
        config,
    }
}

#[test]
fn test_download_ok() {
    let fixture = setup();
    let coordinate = Coordinate::parse(COORDINATE).unwrap();
    let installer = Installer::new(fixture.config.clone()).unwrap();

    let status = installer.download(&coordinate).unwrap();
    assert_eq!(status, 200);

    let downloaded = fixture.config.download_path_for(&coordinate);
    assert!(downloaded.exists(), "file did not exist");
    assert!(downloaded.metadata().unwrap().len() > 0, "file was empty");
}

#[test]
fn test_download_404() {
    let fixture = setup();
    let coordinate = Coordinate::parse("com.example:nonexist:1.2.3").unwrap();
    let installer = Installer::new(fixture.config.clone()).unwrap();

    let status = installer.download(&coordinate).unwrap();
    assert_eq!(status, 404);

    assert!(
        !fixture.config.download_path_for(&coordinate).exists(),
        "junk file left behind after failed download"
    );
}

#[test]
fn test_install_unpacks_into_place() {
    let fixture = setup();
    let coordinate = Coordinate::parse(COORDINATE).unwrap();
    let installer = Installer::new(fixture.config.clone()).unwrap();

    assert_eq!(
        installer.install(&coordinate).unwrap(),
        InstallOutcome::Installed
    );

    let install_dir = fixture.config.install_path_for(&coordinate);
    assert_eq!(
        fs::read_to_string(install_dir.join("data.txt")).unwrap(),
        "package payload\n"
    );

    // Executable bits survive extraction.
    let mode = fs::metadata(install_dir.join("script.d/start.py"))
        .unwrap()
        .permissions()
        .mode();
    assert_ne!(mode & 0o111, 0, "start script lost its executable bit");

    let plain = fs::metadata(install_dir.join("data.txt"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(plain & 0o111, 0, "data file became executable");

    // No staging residue at the canonical path's side.
    assert!(!install_dir.with_file_name("1.2.3---unpack").exists());
}

#[test]
fn test_install_is_idempotent() {
    let fixture = setup();
    let coordinate = Coordinate::parse(COORDINATE).unwrap();
    let installer = Installer::new(fixture.config.clone()).unwrap();

    assert_eq!(
        installer.install(&coordinate).unwrap(),
        InstallOutcome::Installed
    );

    // Second install sees the directory and does nothing; the tree is
    // untouched.
    let marker = fixture
        .config
        .install_path_for(&coordinate)
        .join("marker-from-first-install");
    fs::write(&marker, b"untouched").unwrap();

    assert_eq!(
        installer.install(&coordinate).unwrap(),
        InstallOutcome::AlreadyInstalled
    );
    assert!(marker.exists());
}

#[test]
fn test_install_missing_package_aborts_cleanly() {
    let fixture = setup();
    let coordinate = Coordinate::parse("com.example:nonexist:9.9.9").unwrap();
    let installer = Installer::new(fixture.config.clone()).unwrap();

    let err = installer.install(&coordinate).unwrap_err();
    assert!(matches!(err, Error::DownloadError(_)), "got {err:?}");

    // Nothing ever appears at the install path.
    assert!(!fixture.config.install_path_for(&coordinate).exists());
}

#[test]
fn test_uninstall_is_idempotent() {
    let fixture = setup();
    let coordinate = Coordinate::parse(COORDINATE).unwrap();
    let installer = Installer::new(fixture.config.clone()).unwrap();

    installer.install(&coordinate).unwrap();
    assert!(installer.uninstall(&coordinate).unwrap());
    assert!(!fixture.config.install_path_for(&coordinate).exists());

    // Removing a package that is not installed is not an error.
    assert!(!installer.uninstall(&coordinate).unwrap());
}

#[test]
fn test_list_installed() {
    let fixture = setup();
    let coordinate = Coordinate::parse(COORDINATE).unwrap();
    let installer = Installer::new(fixture.config.clone()).unwrap();

    assert!(installer.list().unwrap().is_empty());

    installer.install(&coordinate).unwrap();
    assert_eq!(installer.list().unwrap(), vec![coordinate]);
}
