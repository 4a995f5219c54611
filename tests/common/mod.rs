//! Shared helpers for integration tests.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// Error kinds a probe target can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ProbeError {
    #[error("bad value: {0}")]
    Value(String),
    #[error("unexpected end of file")]
    Eof,
    #[error("runtime failure: {0}")]
    Runtime(String),
}

/// Target that returns the scripted results in order and counts its calls.
/// Panics if called more often than scripted.
pub fn scripted<T: Clone, E: Clone>(
    script: Vec<Result<T, E>>,
) -> (impl FnMut() -> Result<T, E>, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let target = move || {
        let i = counter.get();
        counter.set(i + 1);
        script
            .get(i)
            .cloned()
            .unwrap_or_else(|| panic!("target called {} times, scripted {}", i + 1, script.len()))
    };
    (target, calls)
}

/// In-memory log sink for a scoped `tracing` subscriber.
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    pub fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with every event at TRACE and above written to the returned buffer.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Captured) {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .without_time()
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, captured)
}
