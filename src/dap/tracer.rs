//! Adapter diagnostics written into a log file.

use crate::dap::transport::DapTransport;
use anyhow::Context;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Append-only log file shared between sessions.
#[derive(Clone)]
pub struct FileTracer {
    file: Arc<Mutex<File>>,
}

impl FileTracer {
    pub fn new(path: &Path) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file {}", path.display()))?;
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn line(&self, text: &str) {
        if let Ok(mut file) = self.file.lock() {
            crate::muted_error!(writeln!(file, "{text}"), "trace write:");
        }
    }

    fn message(&self, direction: &str, message: &Value) {
        if let Ok(json) = serde_json::to_string(message) {
            self.line(&format!("{direction} {json}"));
        }
    }
}

/// Transport decorator that copies every message into a [`FileTracer`].
pub struct Traced<T> {
    inner: T,
    tracer: FileTracer,
}

impl<T: DapTransport> Traced<T> {
    pub fn new(inner: T, tracer: FileTracer) -> Self {
        Self { inner, tracer }
    }
}

impl<T: DapTransport> DapTransport for Traced<T> {
    fn read_message(&mut self) -> anyhow::Result<Value> {
        let message = self.inner.read_message()?;
        self.tracer.message("<-", &message);
        Ok(message)
    }

    fn write_message(&mut self, message: &Value) -> anyhow::Result<()> {
        self.tracer.message("->", message);
        self.inner.write_message(message)
    }
}
