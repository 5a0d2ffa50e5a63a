/// Errors of a classical variable update. Every variant carries a message
/// shown to the client verbatim.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    // --------------------------------- validation errors -----------------------------------------
    #[error("Setting variables is only supported for classical registers.")]
    ScopeNotMutable(i64),
    #[error(
        "Updating grouped classical registers is not supported yet. \
         Expand the register and edit an individual bit."
    )]
    GroupedTarget(String),

    // --------------------------------- conversion errors -----------------------------------------
    #[error("Boolean variables only accept 'true', 'false', '1', or '0'.")]
    InvalidBool,
    #[error("Integer variables expect a base-10 or prefixed literal.")]
    InvalidInt,
    #[error("Floating-point variables expect a decimal literal.")]
    InvalidFloat,
    #[error("Unsupported variable type.")]
    UnsupportedType,

    // --------------------------------- state errors ----------------------------------------------
    #[error("Unknown classical variable '{0}'.")]
    VariableNotFound(String),
    #[error("Unable to update classical variable '{0}'.")]
    Store(String),
}

impl Error {
    /// True for request policy violations (scope or target shape).
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::ScopeNotMutable(_) | Error::GroupedTarget(_))
    }

    /// True if the raw value can't be converted to a declared variable type.
    pub fn is_conversion(&self) -> bool {
        matches!(
            self,
            Error::InvalidBool | Error::InvalidInt | Error::InvalidFloat | Error::UnsupportedType
        )
    }
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "dap", "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "dap", concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::debug, $res, $msg)
    };
}
