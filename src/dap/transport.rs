//! DAP transport abstraction layer.
//! Supports both stdio (for embedded mode) and TCP (for server mode).

use anyhow::anyhow;
use serde_json::Value;
use std::io::{BufRead, BufReader, Read, Stdin, Stdout, Write};
use std::net::TcpStream;

/// Trait for DAP message transport (stdio or TCP).
pub trait DapTransport: Send {
    /// Read a single DAP message (with Content-Length framing).
    fn read_message(&mut self) -> anyhow::Result<Value>;

    /// Write a single DAP message (with Content-Length framing).
    fn write_message(&mut self, message: &Value) -> anyhow::Result<()>;
}

/// Error returned when peer closes the connection between messages.
#[derive(Debug, thiserror::Error)]
#[error("DAP connection closed")]
pub struct ConnectionClosed;

/// Upper bound for a single message body.
const MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

fn read_frame(reader: &mut impl BufRead) -> anyhow::Result<Value> {
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        let read_n = reader.read_line(&mut line)?;
        if read_n == 0 {
            return Err(ConnectionClosed.into());
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            if content_length.is_some() {
                break;
            }
            continue;
        }
        if let Some(v) = line.strip_prefix("Content-Length:") {
            content_length = Some(v.trim().parse()?);
        }
    }

    let len = content_length.ok_or_else(|| anyhow!("Missing Content-Length header"))?;
    if len > MAX_CONTENT_LENGTH {
        return Err(anyhow!(
            "Content-Length {len} exceeds the {MAX_CONTENT_LENGTH} bytes limit"
        ));
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    let msg: Value = serde_json::from_slice(&buf)?;
    Ok(msg)
}

fn write_frame(writer: &mut impl Write, message: &Value) -> anyhow::Result<()> {
    let payload = serde_json::to_vec(message)?;
    write!(writer, "Content-Length: {}\r\n\r\n", payload.len())?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// Stdio-based DAP transport (client runs the adapter as a child process).
pub struct StdioTransport {
    reader: BufReader<Stdin>,
    writer: Stdout,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(std::io::stdin()),
            writer: std::io::stdout(),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl DapTransport for StdioTransport {
    fn read_message(&mut self) -> anyhow::Result<Value> {
        read_frame(&mut self.reader)
    }

    fn write_message(&mut self, message: &Value) -> anyhow::Result<()> {
        write_frame(&mut self.writer, message)
    }
}

/// TCP-based DAP transport (for server mode).
pub struct TcpTransport {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> anyhow::Result<Self> {
        stream.set_nodelay(true)?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self { stream, reader })
    }
}

impl DapTransport for TcpTransport {
    fn read_message(&mut self) -> anyhow::Result<Value> {
        read_frame(&mut self.reader)
    }

    fn write_message(&mut self, message: &Value) -> anyhow::Result<()> {
        write_frame(&mut self.stream, message)
    }
}

/// In-memory transport, replays prepared requests and collects everything written.
#[cfg(test)]
pub(crate) struct MemoryTransport {
    incoming: std::collections::VecDeque<Value>,
    pub outgoing: Vec<Value>,
}

#[cfg(test)]
impl MemoryTransport {
    pub fn new(incoming: Vec<Value>) -> Self {
        Self {
            incoming: incoming.into(),
            outgoing: vec![],
        }
    }
}

#[cfg(test)]
impl DapTransport for MemoryTransport {
    fn read_message(&mut self) -> anyhow::Result<Value> {
        self.incoming
            .pop_front()
            .ok_or_else(|| ConnectionClosed.into())
    }

    fn write_message(&mut self, message: &Value) -> anyhow::Result<()> {
        self.outgoing.push(message.clone());
        Ok(())
    }
}
