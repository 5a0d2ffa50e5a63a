pub mod convert;
pub mod target;

use serde::Deserialize;
use std::fmt::{self, Display, Formatter};
use strum_macros::{Display as StrumDisplay, IntoStaticStr};

/// Declared type of a classical variable.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Deserialize, StrumDisplay, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    #[strum(serialize = "bool")]
    Bool,
    #[strum(serialize = "int")]
    Int,
    #[strum(serialize = "float")]
    Float,
    /// Any type the simulation exposes but doesn't allow to write.
    #[strum(serialize = "unsupported")]
    Unsupported,
}

/// Strongly typed value of a classical variable.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum VariableValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl VariableValue {
    /// Return a type that this value belongs to.
    pub fn r#type(&self) -> VariableType {
        match self {
            VariableValue::Bool(_) => VariableType::Bool,
            VariableValue::Int(_) => VariableType::Int,
            VariableValue::Float(_) => VariableType::Float,
        }
    }
}

impl Display for VariableValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Bool(true) => f.write_str("True"),
            VariableValue::Bool(false) => f.write_str("False"),
            VariableValue::Int(i) => write!(f, "{i}"),
            VariableValue::Float(fl) => write_float(f, *fl),
        }
    }
}

/// Shortest round-trip float text: `2.0`, `1e+20`, `1e-05`, `inf`, `nan`.
fn write_float(f: &mut Formatter<'_>, fl: f64) -> fmt::Result {
    if fl.is_nan() {
        return f.write_str("nan");
    }
    let abs = fl.abs();
    if fl.is_infinite() || abs == 0.0 || (1e-4..1e16).contains(&abs) {
        // fixed notation, debug output always keeps a fractional part
        return write!(f, "{fl:?}");
    }

    let scientific = format!("{fl:e}");
    let Some((mantissa, exp)) = scientific.split_once('e') else {
        return f.write_str(&scientific);
    };
    let exp: i32 = exp.parse().map_err(|_| fmt::Error)?;
    let sign = if exp < 0 { '-' } else { '+' };
    write!(f, "{mantissa}e{sign}{:02}", exp.unsigned_abs())
}

/// Classical variable descriptor, owned by a variable store.
#[derive(Clone, PartialEq, Debug)]
pub struct ClassicalVariable {
    pub name: String,
    pub r#type: VariableType,
    /// Current binding, [`None`] for variables of unsupported types.
    pub value: Option<VariableValue>,
}

impl ClassicalVariable {
    pub fn new(name: impl Into<String>, value: VariableValue) -> Self {
        Self {
            name: name.into(),
            r#type: value.r#type(),
            value: Some(value),
        }
    }

    pub fn unsupported(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            r#type: VariableType::Unsupported,
            value: None,
        }
    }

    /// Render current binding the same way a successful update renders a new value.
    pub fn render_value(&self) -> String {
        self.value
            .map(|v| v.to_string())
            .unwrap_or_else(|| "<unsupported>".to_string())
    }
}
