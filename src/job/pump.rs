// src/job/pump.rs

//! Stream pump: drains one byte stream into a sink under a byte ceiling.
//!
//! A pump is a unit of concurrent work bound to exactly one (source, sink)
//! pair. It reads fixed-size chunks until the source is exhausted, counting
//! cumulative bytes, and publishes terminal events on a channel:
//!
//! - [`PumpEvent::OverLimit`] the first time the cumulative byte count
//!   exceeds the ceiling. The pump keeps draining so the subprocess on the
//!   far end is never blocked on a full pipe buffer; the event just tells
//!   the supervisor that output is excessive.
//! - [`PumpEvent::Finished`] when the source reaches end of stream.
//! - [`PumpEvent::Failed`] on any I/O failure reading or writing; the pump
//!   stops.
//!
//! Source and sink are dropped on every exit path. A receiver that has gone
//! away never stops the pump; events are published best-effort.

use std::io::{Read, Write};
use std::sync::mpsc::Sender;

use tracing::warn;

/// Read buffer and chunk size for pumping (64 KiB)
pub const PUMP_BUFFER_SIZE: usize = 64 * 1024;

/// Which subprocess stream a pump is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Terminal and overflow events published by a pump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpEvent {
    /// Cumulative bytes exceeded the ceiling; draining continues
    OverLimit(StreamKind),
    /// Source exhausted
    Finished(StreamKind),
    /// Read or write failed; the pump stopped
    Failed(StreamKind),
}

/// Drains a source into a sink with a maximum-byte ceiling.
///
/// A ceiling of 0 disables the limit.
pub struct StreamPump<R, W> {
    kind: StreamKind,
    source: R,
    sink: W,
    ceiling: u64,
}

impl<R: Read, W: Write> StreamPump<R, W> {
    /// Bind a pump to a (source, sink) pair
    pub fn new(kind: StreamKind, source: R, sink: W, ceiling: u64) -> Self {
        Self {
            kind,
            source,
            sink,
            ceiling,
        }
    }

    /// Run the pump to completion and hand the sink back.
    ///
    /// Consumes the pump; the source is dropped when this returns, whatever
    /// the exit path was.
    pub fn run(mut self, events: &Sender<PumpEvent>) -> W {
        let mut buffer = vec![0u8; PUMP_BUFFER_SIZE];
        let mut bytes_read: u64 = 0;
        let mut over_limit = false;

        loop {
            let n = match self.source.read(&mut buffer) {
                Ok(0) => {
                    let _ = events.send(PumpEvent::Finished(self.kind));
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    warn!("pump read failed on {:?}: {e}", self.kind);
                    let _ = events.send(PumpEvent::Failed(self.kind));
                    break;
                }
            };

            if let Err(e) = self.sink.write_all(&buffer[..n]) {
                warn!("pump write failed on {:?}: {e}", self.kind);
                let _ = events.send(PumpEvent::Failed(self.kind));
                break;
            }

            bytes_read += n as u64;
            if self.ceiling > 0 && bytes_read > self.ceiling && !over_limit {
                over_limit = true;
                let _ = events.send(PumpEvent::OverLimit(self.kind));
            }
        }

        self.sink
    }
}
