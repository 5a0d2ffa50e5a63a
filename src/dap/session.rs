use crate::dap::protocol::{
    DapEvent, DapRequest, DapResponse, Scope, SetVariableArguments, SetVariableResponseBody,
    Variable, VariablesArguments,
};
use crate::dap::set_variable::{set_variable, SetVariableResponse};
use crate::dap::transport::{ConnectionClosed, DapTransport};
use crate::state::ClassicalState;
use crate::variable::target::CLASSICAL_REGISTERS_SCOPE;
use anyhow::Context;
use itertools::Itertools;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// What to do after a request is handled.
#[derive(Debug, PartialEq)]
enum ControlFlow {
    Continue,
    Disconnect,
}

/// Debug session state for a single client.
pub struct DebugSession<T: DapTransport> {
    io: T,
    server_seq: i64,
    initialized: bool,
    state: Arc<ClassicalState>,
}

impl<T: DapTransport> DebugSession<T> {
    pub fn new(io: T, state: Arc<ClassicalState>) -> Self {
        Self {
            io,
            server_seq: 1,
            initialized: false,
            state,
        }
    }

    /// Serve requests until the client disconnects or closes the connection.
    pub fn run(mut self) -> anyhow::Result<()> {
        loop {
            let message = match self.io.read_message() {
                Ok(message) => message,
                Err(e) if e.downcast_ref::<ConnectionClosed>().is_some() => {
                    info!(target: "dap", "client closed connection");
                    return Ok(());
                }
                Err(e) => return Err(e).context("read DAP message"),
            };

            let req: DapRequest = match serde_json::from_value(message) {
                Ok(req) => req,
                Err(e) => {
                    warn!(target: "dap", "malformed DAP message: {e}");
                    continue;
                }
            };
            if req.r#type != "request" {
                debug!(target: "dap", "ignore message of type `{}`", req.r#type);
                continue;
            }

            debug!(target: "dap", "{}: {}", req.seq, req.command);
            if self.handle_request(&req)? == ControlFlow::Disconnect {
                return Ok(());
            }
        }
    }

    fn handle_request(&mut self, req: &DapRequest) -> anyhow::Result<ControlFlow> {
        match req.command.as_str() {
            "initialize" => self.handle_initialize(req)?,
            "configurationDone" => self.send_success(req)?,
            "scopes" => self.handle_scopes(req)?,
            "variables" => self.handle_variables(req)?,
            "setVariable" => self.handle_set_variable(req)?,
            "disconnect" => {
                self.send_success(req)?;
                return Ok(ControlFlow::Disconnect);
            }
            unknown => {
                warn!(target: "dap", "unsupported command: {unknown}");
                self.send_err(req, format!("unsupported command '{unknown}'"))?;
            }
        }
        Ok(ControlFlow::Continue)
    }

    fn next_seq(&mut self) -> i64 {
        let s = self.server_seq;
        self.server_seq += 1;
        s
    }

    fn send_success(&mut self, req: &DapRequest) -> anyhow::Result<()> {
        self.send_response_raw(req, true, None, None)
    }

    fn send_success_body<B: Serialize>(&mut self, req: &DapRequest, body: B) -> anyhow::Result<()> {
        let body = serde_json::to_value(body)?;
        self.send_response_raw(req, true, None, Some(body))
    }

    fn send_err(&mut self, req: &DapRequest, message: impl ToString) -> anyhow::Result<()> {
        self.send_response_raw(req, false, Some(message.to_string()), None)
    }

    fn send_response_raw(
        &mut self,
        req: &DapRequest,
        success: bool,
        message: Option<String>,
        body: Option<Value>,
    ) -> anyhow::Result<()> {
        let rsp = DapResponse {
            seq: self.next_seq(),
            r#type: "response",
            request_seq: req.seq,
            success,
            command: req.command.clone(),
            message,
            body,
        };
        self.io.write_message(&serde_json::to_value(rsp)?)
    }

    fn send_event(&mut self, name: &'static str, body: Option<Value>) -> anyhow::Result<()> {
        let ev = DapEvent {
            seq: self.next_seq(),
            r#type: "event",
            event: name,
            body,
        };
        self.io.write_message(&serde_json::to_value(ev)?)
    }

    fn handle_initialize(&mut self, req: &DapRequest) -> anyhow::Result<()> {
        if self.initialized {
            return self.send_err(req, "session already initialized");
        }
        self.initialized = true;
        let body = json!({
            "supportsConfigurationDoneRequest": true,
            "supportsSetVariable": true,
        });
        self.send_success_body(req, body)?;
        self.send_event("initialized", None)
    }

    fn handle_scopes(&mut self, req: &DapRequest) -> anyhow::Result<()> {
        let scopes = vec![Scope {
            name: "Classical Variables",
            variables_reference: CLASSICAL_REGISTERS_SCOPE,
            expensive: false,
        }];
        self.send_success_body(req, json!({ "scopes": scopes }))
    }

    fn handle_variables(&mut self, req: &DapRequest) -> anyhow::Result<()> {
        let args: VariablesArguments = match serde_json::from_value(req.arguments.clone()) {
            Ok(args) => args,
            Err(e) => return self.send_err(req, format!("variables: invalid arguments: {e}")),
        };

        let variables = if args.variables_reference == CLASSICAL_REGISTERS_SCOPE {
            self.state
                .variables()?
                .into_iter()
                .map(|var| Variable {
                    value: var.render_value(),
                    type_field: var.r#type.into(),
                    name: var.name,
                    variables_reference: 0,
                })
                .collect_vec()
        } else {
            vec![]
        };

        self.send_success_body(req, json!({ "variables": variables }))
    }

    fn handle_set_variable(&mut self, req: &DapRequest) -> anyhow::Result<()> {
        let args: SetVariableArguments = match serde_json::from_value(req.arguments.clone()) {
            Ok(args) => args,
            Err(e) => return self.send_err(req, format!("setVariable: invalid arguments: {e}")),
        };

        match set_variable(self.state.as_ref(), &args) {
            SetVariableResponse::Success { value } => {
                self.send_success_body(req, SetVariableResponseBody { value })?;
                self.send_event("invalidated", Some(json!({ "areas": ["variables"] })))
            }
            SetVariableResponse::Failure { message } => self.send_err(req, message),
        }
    }

    #[cfg(test)]
    fn into_transport(self) -> T {
        self.io
    }
}
