mod executor;
mod default_executor;
mod child;
mod redirect;
pub mod builtin;
pub mod reaper;


pub use executor::{Executor, ExecStatus};
pub use default_executor::DefaultExecutor;
pub use builtin::{BuiltinCommand, BuiltinManager};
