//! `setVariable` request: overwrite a single classical variable of a running simulation.

use crate::dap::protocol::SetVariableArguments;
use crate::error::Error;
use crate::state::{StateError, VariableStore};
use crate::variable::convert::convert;
use crate::variable::target::validate_target;

/// Result of a `setVariable` request, exactly one per request.
#[derive(Debug, Clone, PartialEq)]
pub enum SetVariableResponse {
    /// Variable updated, `value` is the display form of the stored value.
    Success { value: String },
    /// Nothing changed, `message` explains why.
    Failure { message: String },
}

impl SetVariableResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, SetVariableResponse::Success { .. })
    }
}

fn apply(
    store: &impl VariableStore,
    scope_reference: i64,
    name: &str,
    raw_value: &str,
) -> Result<String, Error> {
    let target = validate_target(scope_reference, name)?;

    let variable = store.lookup(target).map_err(|e| match e {
        StateError::NotFound(_) => Error::VariableNotFound(target.to_string()),
        other => {
            log::warn!(target: "dap", "lookup `{target}`: {other:#}");
            Error::Store(name.to_string())
        }
    })?;

    let (value, display) = convert(raw_value, variable.r#type)?;

    store.store(target, variable.r#type, value).map_err(|e| {
        log::warn!(target: "dap", "store `{target}`: {e:#}");
        Error::Store(name.to_string())
    })?;

    Ok(display)
}

/// Validate request target, convert the new value to the declared variable type
/// and save it into the store.
pub fn set_variable(
    store: &impl VariableStore,
    arguments: &SetVariableArguments,
) -> SetVariableResponse {
    let raw_value = arguments.raw_value();
    match apply(
        store,
        arguments.variables_reference,
        &arguments.name,
        &raw_value,
    ) {
        Ok(value) => {
            log::debug!(target: "dap", "variable `{}` set to {value}", arguments.name);
            SetVariableResponse::Success { value }
        }
        Err(e) => {
            log::debug!(target: "dap", "variable `{}` not set: {e}", arguments.name);
            SetVariableResponse::Failure {
                message: e.to_string(),
            }
        }
    }
}
