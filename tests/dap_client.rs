#![allow(dead_code)]

use anyhow::{anyhow, Context};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const READ_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(50);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub const SEED: &str = r#"
[[register]]
name = "creg"
size = 3

[[variable]]
name = "counter[0]"
type = "int"
value = "7"

[[variable]]
name = "phase[0]"
type = "float"
value = "0.0"
"#;

pub fn adapter_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_qsim-dap"))
}

/// Write a state file into the temporary directory, file removed on drop.
pub struct SeedFile {
    pub path: PathBuf,
}

impl SeedFile {
    pub fn new(content: &str) -> anyhow::Result<Self> {
        let path = std::env::temp_dir().join(format!("qsim-dap-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, content).context("write seed file")?;
        Ok(Self { path })
    }
}

impl Drop for SeedFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

pub struct DapClient {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
    next_seq: i64,
    pending_events: VecDeque<Value>,
}

impl DapClient {
    pub fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let start = Instant::now();
        let stream = loop {
            match TcpStream::connect(addr) {
                Ok(stream) => break stream,
                Err(err) => {
                    if start.elapsed() > CONNECT_TIMEOUT {
                        return Err(anyhow!("failed to connect to {addr}: {err}"));
                    }
                    thread::sleep(CONNECT_RETRY_DELAY);
                }
            }
        };
        stream
            .set_read_timeout(Some(READ_TIMEOUT))
            .context("set DAP read timeout")?;
        stream
            .set_write_timeout(Some(READ_TIMEOUT))
            .context("set DAP write timeout")?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            stream,
            reader,
            next_seq: 1,
            pending_events: VecDeque::new(),
        })
    }

    pub fn send_request(&mut self, command: &str, arguments: Value) -> anyhow::Result<i64> {
        let seq = self.next_seq;
        self.next_seq += 1;
        let request = json!({
            "seq": seq,
            "type": "request",
            "command": command,
            "arguments": arguments,
        });
        self.write_message(&request)?;
        Ok(seq)
    }

    pub fn request(&mut self, command: &str, arguments: Value) -> anyhow::Result<Value> {
        let seq = self.send_request(command, arguments)?;
        self.read_response(seq)
    }

    pub fn read_response(&mut self, request_seq: i64) -> anyhow::Result<Value> {
        loop {
            let msg = self.read_message()?;
            match msg.get("type").and_then(Value::as_str) {
                Some("event") => self.pending_events.push_back(msg),
                Some("response") => {
                    if msg.get("request_seq").and_then(Value::as_i64) == Some(request_seq) {
                        return Ok(msg);
                    }
                }
                _ => {}
            }
        }
    }

    pub fn wait_for_event(&mut self, name: &str) -> anyhow::Result<Value> {
        while let Some(event) = self.pending_events.pop_front() {
            if event.get("event").and_then(Value::as_str) == Some(name) {
                return Ok(event);
            }
        }
        loop {
            let msg = self.read_message()?;
            if msg.get("type").and_then(Value::as_str) == Some("event")
                && msg.get("event").and_then(Value::as_str) == Some(name)
            {
                return Ok(msg);
            }
        }
    }

    fn read_message(&mut self) -> anyhow::Result<Value> {
        let mut content_length = None;
        loop {
            let mut line = String::new();
            let read_n = self.reader.read_line(&mut line)?;
            if read_n == 0 {
                return Err(anyhow!("DAP connection closed"));
            }
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                break;
            }
            if let Some(value) = line.strip_prefix("Content-Length:") {
                content_length = Some(value.trim().parse::<usize>()?);
            }
        }

        let len = content_length.ok_or_else(|| anyhow!("Missing Content-Length"))?;
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf)?;
        let msg = serde_json::from_slice(&buf)?;
        Ok(msg)
    }

    fn write_message(&mut self, message: &Value) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(message)?;
        write!(self.stream, "Content-Length: {}\r\n\r\n", payload.len())?;
        self.stream.write_all(&payload)?;
        self.stream.flush()?;
        Ok(())
    }
}

/// Adapter process in `--oneshot` mode plus a connected client.
pub struct DapSession {
    pub client: DapClient,
    process: Child,
    closed: bool,
    _seed: SeedFile,
}

impl DapSession {
    pub fn start(seed: &str) -> anyhow::Result<Self> {
        let seed = SeedFile::new(seed)?;
        let listener = TcpListener::bind("127.0.0.1:0").context("bind test TCP port")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let process = Command::new(adapter_bin())
            .arg("--listen")
            .arg(addr.to_string())
            .arg("--oneshot")
            .arg("--state")
            .arg(&seed.path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("spawn qsim-dap")?;
        let client = DapClient::connect(addr)?;
        Ok(Self {
            client,
            process,
            closed: false,
            _seed: seed,
        })
    }

    pub fn initialize(&mut self) -> anyhow::Result<Value> {
        let response = self
            .client
            .request("initialize", json!({ "adapterID": "qsim" }))?;
        self.client.wait_for_event("initialized")?;
        Ok(response)
    }

    pub fn disconnect(&mut self) -> anyhow::Result<Value> {
        let response = self.client.request("disconnect", json!({}))?;
        self.closed = true;
        Ok(response)
    }

    /// Wait until the adapter exits by itself.
    pub fn wait_exit(&mut self) -> anyhow::Result<()> {
        wait_for_exit(&mut self.process, SHUTDOWN_TIMEOUT)
    }
}

impl Drop for DapSession {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.disconnect();
        }
        if wait_for_exit(&mut self.process, SHUTDOWN_TIMEOUT).is_err() {
            let _ = self.process.kill();
        }
    }
}

pub fn wait_for_exit(child: &mut Child, timeout: Duration) -> anyhow::Result<()> {
    let start = Instant::now();
    loop {
        if let Some(_status) = child.try_wait()? {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(anyhow!("process did not exit in time"));
        }
        thread::sleep(Duration::from_millis(50));
    }
}
