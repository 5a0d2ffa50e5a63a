//! Checks that a `setVariable` request addresses a single writable classical variable.

use crate::error::Error;

/// Variables reference of the scope that holds classical register bits.
pub const CLASSICAL_REGISTERS_SCOPE: i64 = 1;
/// Variables references starting from this value address classical variable groups.
/// Values between [`CLASSICAL_REGISTERS_SCOPE`] and this one belong to read-only scopes
/// (quantum state, stack frames, etc.).
pub const FIRST_CLASSICAL_GROUP_SCOPE: i64 = 10;

/// Return true if variables under this reference may be overwritten.
pub fn is_mutable_scope(scope_reference: i64) -> bool {
    scope_reference == CLASSICAL_REGISTERS_SCOPE || scope_reference >= FIRST_CLASSICAL_GROUP_SCOPE
}

/// Variable name as shown to the client: `base` or `base[index]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetRef<'a> {
    name: &'a str,
    base: &'a str,
    index: Option<&'a str>,
}

impl<'a> TargetRef<'a> {
    pub fn parse(name: &'a str) -> Self {
        match name.split_once('[') {
            Some((base, rest)) => TargetRef {
                name,
                base,
                index: Some(rest.strip_suffix(']').unwrap_or(rest)),
            },
            None => TargetRef {
                name,
                base: name,
                index: None,
            },
        }
    }

    /// Full name, exactly as requested.
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn base(&self) -> &'a str {
        self.base
    }

    /// Element index, `None` if reference points to a whole register.
    pub fn index(&self) -> Option<&'a str> {
        self.index
    }
}

/// Validate a request target and return the name of a variable to update.
///
/// # Arguments
///
/// * `scope_reference`: variables reference the client believes it is editing
/// * `target_name`: variable name, `base[index]` for register elements
pub fn validate_target(scope_reference: i64, target_name: &str) -> Result<&str, Error> {
    if !is_mutable_scope(scope_reference) {
        return Err(Error::ScopeNotMutable(scope_reference));
    }

    let target = TargetRef::parse(target_name);
    let Some(index) = target.index() else {
        return Err(Error::GroupedTarget(target.base().to_string()));
    };
    log::debug!(target: "dap", "register `{}`, element `{index}`", target.base());

    Ok(target.name())
}
