use crate::ast::Pipeline;
use crate::error::ExecError;
use crate::state::ShellState;

pub type ExecStatus = Result<i32, ExecError>;

pub trait Executor {
    /// Runs one parsed line and returns its exit status. An `Err` means the
    /// shell itself could not set the pipeline up.
    fn exec(&mut self, pipeline: &Pipeline, state: &mut ShellState) -> ExecStatus;

    /// Collects finished background children that could not be handed to
    /// the signal-driven collector.
    fn reap(&mut self) {}
}
