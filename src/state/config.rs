//! TOML description of the initial classical state.

use crate::state::ClassicalState;
use crate::variable::convert::convert;
use crate::variable::{ClassicalVariable, VariableType};
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RegisterConfig {
    name: String,
    size: usize,
}

#[derive(Debug, Deserialize)]
struct VariableConfig {
    name: String,
    r#type: VariableType,
    value: Option<String>,
}

/// Seed of a [`ClassicalState`].
#[derive(Debug, Default, Deserialize)]
pub struct StateConfig {
    #[serde(default, rename = "register")]
    registers: Vec<RegisterConfig>,
    #[serde(default, rename = "variable")]
    variables: Vec<VariableConfig>,
}

impl StateConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let data = read_to_string(path)
            .with_context(|| format!("read state file {}", path.display()))?;
        Self::from_toml(&data).with_context(|| format!("parse state file {}", path.display()))
    }

    pub fn from_toml(data: &str) -> anyhow::Result<Self> {
        Ok(toml::de::from_str(data)?)
    }

    /// Create classical state with all declared registers and variables.
    /// Variable values are validated against their declared types.
    pub fn build(&self) -> anyhow::Result<ClassicalState> {
        let state = ClassicalState::new();

        for register in &self.registers {
            state.declare_register(&register.name, register.size)?;
        }

        for var in &self.variables {
            let variable = match (var.r#type, var.value.as_deref()) {
                (VariableType::Unsupported, _) => ClassicalVariable::unsupported(&var.name),
                (_, None) => return Err(anyhow!("variable `{}`: missing value", var.name)),
                (ty, Some(raw)) => {
                    let (value, _) =
                        convert(raw, ty).with_context(|| format!("variable `{}`", var.name))?;
                    ClassicalVariable::new(&var.name, value)
                }
            };
            state.declare(variable)?;
        }

        Ok(state)
    }
}
