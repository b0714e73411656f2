// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use zip::write::SimpleFileOptions;

/// Write a package archive at `path` containing a data file, an executable
/// tool, and executable `script.d/start.py` / `script.d/stop.py` scripts.
pub fn write_package_archive(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let plain = SimpleFileOptions::default().unix_permissions(0o644);
    let exec = SimpleFileOptions::default().unix_permissions(0o755);

    writer.start_file("data.txt", plain).unwrap();
    writer.write_all(b"package payload\n").unwrap();

    writer.start_file("bin/tool", exec).unwrap();
    writer.write_all(b"#!/bin/sh\nexit 0\n").unwrap();

    writer.start_file("script.d/start.py", exec).unwrap();
    writer.write_all(b"#!/bin/sh\necho started\nexit 0\n").unwrap();

    writer.start_file("script.d/stop.py", exec).unwrap();
    writer.write_all(b"#!/bin/sh\necho stopped\nexit 0\n").unwrap();

    writer.finish().unwrap();
}

/// Minimal static file server for exercising the downloader against a real
/// HTTP endpoint. Serves GET requests from a root directory; anything else
/// is a 404.
pub struct StaticHttpServer {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StaticHttpServer {
    /// Bind an ephemeral port and start serving `root`
    pub fn start(root: PathBuf) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&shutdown);
        let handle = std::thread::spawn(move || {
            for stream in listener.incoming() {
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                if let Ok(stream) = stream {
                    serve_one(stream, &root);
                }
            }
        });

        Self {
            addr,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for StaticHttpServer {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // Poke the listener so the accept loop notices the flag.
        let _ = TcpStream::connect(self.addr);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve_one(stream: TcpStream, root: &Path) {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    // Drain the headers; we only care about the request line.
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) if line == "\r\n" || line == "\n" => break,
            Ok(_) => continue,
            Err(_) => return,
        }
    }

    let mut stream = reader.into_inner();
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .trim_start_matches('/');

    let file_path = root.join(path);
    let response = match fs::File::open(&file_path) {
        Ok(mut file) if file_path.is_file() => {
            let mut body = Vec::new();
            file.read_to_end(&mut body).unwrap();
            let mut response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .into_bytes();
            response.extend_from_slice(&body);
            response
        }
        _ => b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec(),
    };

    let _ = stream.write_all(&response);
}
