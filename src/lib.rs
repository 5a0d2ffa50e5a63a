pub mod dap;
pub mod error;
pub mod state;
pub mod variable;
