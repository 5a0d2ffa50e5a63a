pub mod config;

use crate::variable::{ClassicalVariable, VariableType, VariableValue};
use indexmap::IndexMap;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("classical variable `{0}` not found")]
    NotFound(String),
    #[error("classical variable `{name}` declared as `{declared}`, got `{requested}`")]
    TypeMismatch {
        name: String,
        declared: VariableType,
        requested: VariableType,
    },
    #[error("classical variable `{0}` already exists")]
    AlreadyExists(String),
    #[error("state store lock poisoned")]
    Poisoned,
}

/// Storage of classical variable bindings of a simulation session.
///
/// Implementations are shared between requests and must serialize concurrent
/// lookups and updates by themselves.
pub trait VariableStore {
    /// Return descriptor of a variable by its name.
    fn lookup(&self, name: &str) -> Result<ClassicalVariable, StateError>;

    /// Bind a new value to an existing variable.
    ///
    /// # Arguments
    ///
    /// * `name`: variable name
    /// * `r#type`: declared variable type
    /// * `value`: new value, must be of declared type
    fn store(&self, name: &str, r#type: VariableType, value: VariableValue)
        -> Result<(), StateError>;
}

/// In-memory classical state, variables are kept in insertion order.
#[derive(Default)]
pub struct ClassicalState {
    variables: Mutex<IndexMap<String, ClassicalVariable>>,
}

impl ClassicalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new variable.
    pub fn declare(&self, variable: ClassicalVariable) -> Result<(), StateError> {
        let mut variables = self.variables.lock().map_err(|_| StateError::Poisoned)?;
        if variables.contains_key(&variable.name) {
            return Err(StateError::AlreadyExists(variable.name));
        }
        variables.insert(variable.name.clone(), variable);
        Ok(())
    }

    /// Add bits `name[0]`..`name[size - 1]` of a classical register, all bits are unset.
    pub fn declare_register(&self, name: &str, size: usize) -> Result<(), StateError> {
        (0..size).try_for_each(|idx| {
            self.declare(ClassicalVariable::new(
                format!("{name}[{idx}]"),
                VariableValue::Bool(false),
            ))
        })
    }

    /// Return a snapshot of all variables.
    pub fn variables(&self) -> Result<Vec<ClassicalVariable>, StateError> {
        let variables = self.variables.lock().map_err(|_| StateError::Poisoned)?;
        Ok(variables.values().cloned().collect())
    }
}

impl VariableStore for ClassicalState {
    fn lookup(&self, name: &str) -> Result<ClassicalVariable, StateError> {
        let variables = self.variables.lock().map_err(|_| StateError::Poisoned)?;
        variables
            .get(name)
            .cloned()
            .ok_or_else(|| StateError::NotFound(name.to_string()))
    }

    fn store(
        &self,
        name: &str,
        r#type: VariableType,
        value: VariableValue,
    ) -> Result<(), StateError> {
        let mut variables = self.variables.lock().map_err(|_| StateError::Poisoned)?;
        let variable = variables
            .get_mut(name)
            .ok_or_else(|| StateError::NotFound(name.to_string()))?;

        for requested in [r#type, value.r#type()] {
            if variable.r#type != requested {
                return Err(StateError::TypeMismatch {
                    name: name.to_string(),
                    declared: variable.r#type,
                    requested,
                });
            }
        }

        variable.value = Some(value);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn state() -> ClassicalState {
        let state = ClassicalState::new();
        state.declare_register("c", 2).unwrap();
        state
            .declare(ClassicalVariable::new("n", VariableValue::Int(1)))
            .unwrap();
        state
            .declare(ClassicalVariable::unsupported("angles"))
            .unwrap();
        state
    }

    #[test]
    fn test_declare_register() {
        let state = state();
        let names: Vec<_> = state
            .variables()
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["c[0]", "c[1]", "n", "angles"]);

        let bit = state.lookup("c[1]").unwrap();
        assert_eq!(bit.r#type, VariableType::Bool);
        assert_eq!(bit.value, Some(VariableValue::Bool(false)));

        assert!(matches!(
            state.declare_register("c", 1),
            Err(StateError::AlreadyExists(name)) if name == "c[0]"
        ));
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(matches!(
            state().lookup("c[5]"),
            Err(StateError::NotFound(name)) if name == "c[5]"
        ));
    }

    #[test]
    fn test_store() {
        let state = state();
        state
            .store("c[0]", VariableType::Bool, VariableValue::Bool(true))
            .unwrap();
        assert_eq!(
            state.lookup("c[0]").unwrap().value,
            Some(VariableValue::Bool(true))
        );

        state
            .store("n", VariableType::Int, VariableValue::Int(-3))
            .unwrap();
        assert_eq!(state.lookup("n").unwrap().value, Some(VariableValue::Int(-3)));
    }

    #[test]
    fn test_store_type_mismatch() {
        let state = state();
        assert!(matches!(
            state.store("n", VariableType::Int, VariableValue::Bool(true)),
            Err(StateError::TypeMismatch { .. })
        ));
        assert!(matches!(
            state.store("n", VariableType::Float, VariableValue::Float(1.0)),
            Err(StateError::TypeMismatch { .. })
        ));
        assert!(matches!(
            state.store("angles", VariableType::Int, VariableValue::Int(1)),
            Err(StateError::TypeMismatch { .. })
        ));
        assert!(matches!(
            state.store("x", VariableType::Int, VariableValue::Int(1)),
            Err(StateError::NotFound(_))
        ));
        assert_eq!(state.lookup("n").unwrap().value, Some(VariableValue::Int(1)));
    }
}
