use crate::environment::Environment;

/// Mutable state shared by the parser, the executor and the builtins for
/// the lifetime of one shell session.
#[derive(Debug, Clone)]
pub struct ShellState {
    pub env: Environment,
    /// Status of the last pipeline, read back by `$?` and by `exit`.
    pub last_status: i32,
    /// Cleared by `exit`; the read loop stops once this is false.
    pub running: bool,
    /// Prefix for user-visible error messages.
    pub program: String,
}

impl ShellState {
    pub fn new(env: Environment, program: &str) -> Self {
        ShellState {
            env,
            last_status: 0,
            running: true,
            program: program.to_string(),
        }
    }

    pub fn detached() -> Self {
        Self::new(Environment::detached(), "tinysh")
    }
}
