//! Debug Adapter Protocol front-end of a simulation session.

pub mod args;
pub mod protocol;
pub mod session;
pub mod set_variable;
pub mod tracer;
pub mod transport;
