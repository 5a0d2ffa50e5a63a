//! qsim-dap - Debug Adapter Protocol server of a circuit simulation session.
//!
//! Exposes the classical state of a simulation to an IDE and lets the user
//! edit single classical variables (`setVariable`).

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use qsim_dap::dap::args::Args;
use qsim_dap::dap::session::DebugSession;
use qsim_dap::dap::tracer::{FileTracer, Traced};
use qsim_dap::dap::transport::{DapTransport, StdioTransport, TcpTransport};
use qsim_dap::state::config::StateConfig;
use qsim_dap::state::ClassicalState;
use qsim_dap::weak_error;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

fn run_session(
    io: impl DapTransport,
    tracer: Option<&FileTracer>,
    state: Arc<ClassicalState>,
) -> anyhow::Result<()> {
    match tracer {
        Some(tracer) => DebugSession::new(Traced::new(io, tracer.clone()), state).run(),
        None => DebugSession::new(io, state).run(),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let state = match &args.state {
        Some(path) => StateConfig::from_file(path)?.build()?,
        None => {
            warn!(target: "dap", "no --state given, classical state is empty");
            ClassicalState::new()
        }
    };
    let state = Arc::new(state);

    let log_file = match &args.log_file {
        Some(path) => Some(FileTracer::new(path)?),
        None => None,
    };
    if args.trace_dap && log_file.is_none() {
        warn!(target: "dap", "--trace-dap requires --log-file; tracing disabled");
    }
    let tracer = log_file.as_ref().filter(|_| args.trace_dap);

    if args.stdio {
        info!(target: "dap", "serving DAP over stdio");
        return run_session(StdioTransport::new(), tracer, state);
    }

    let addr: SocketAddr = args.listen.parse().context("Invalid listen address")?;
    let listener = TcpListener::bind(addr).with_context(|| format!("bind {addr}"))?;
    info!(target: "dap", "listening on {addr}");

    // One client == one session, clients are served sequentially.
    loop {
        let Some((stream, peer)) = weak_error!(listener.accept(), "accept failed:") else {
            continue;
        };
        info!(target: "dap", "DAP client connected: {peer}");
        if let Some(log) = &log_file {
            log.line(&format!("client connected: {peer}"));
        }

        let Some(io) = weak_error!(TcpTransport::new(stream), "failed to init DAP I/O:") else {
            continue;
        };

        let res = run_session(io, tracer, state.clone());
        match (&res, &log_file) {
            (Err(err), Some(log)) => log.line(&format!("session error: {err:#}")),
            (Ok(()), Some(log)) => log.line("session finished OK"),
            _ => {}
        }
        weak_error!(res, "session ended with error:");

        if args.oneshot {
            break;
        }
    }
    Ok(())
}
