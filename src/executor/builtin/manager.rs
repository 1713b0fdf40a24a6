use std::collections::HashMap;
use std::io::{self, Write};

use crate::executor::builtin::commands::{
    CdCommand, EchoCommand, EnvCommand, ExitCommand, ExportCommand, HelpCommand, PwdCommand,
    UnsetCommand,
};
use crate::error::io_cause;
use crate::state::ShellState;

/// A command run inside the shell process.
///
/// `args` is the full argument vector, `args[0]` being the builtin's own
/// name. Output goes to `out` and `err` rather than the process streams so
/// that redirections never have to touch the shell's descriptors.
pub trait BuiltinCommand {
    fn name(&self) -> &'static str;
    fn run(
        &self,
        args: &[String],
        state: &mut ShellState,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> io::Result<i32>;
}

pub struct BuiltinManager {
    commands: HashMap<String, Box<dyn BuiltinCommand>>,
}

impl BuiltinManager {
    pub fn new() -> Self {
        let mut mgr = BuiltinManager {
            commands: HashMap::new(),
        };
        mgr.register(Box::new(CdCommand));
        mgr.register(Box::new(PwdCommand));
        mgr.register(Box::new(EchoCommand));
        mgr.register(Box::new(ExitCommand));
        mgr.register(Box::new(HelpCommand));
        mgr.register(Box::new(ExportCommand));
        mgr.register(Box::new(UnsetCommand));
        mgr.register(Box::new(EnvCommand));
        mgr
    }

    pub fn register(&mut self, cmd: Box<dyn BuiltinCommand>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Runs the builtin named by `args[0]`; `None` if there is no such builtin.
    pub fn execute(
        &self,
        args: &[String],
        state: &mut ShellState,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Option<i32> {
        let name = args.first()?;
        let cmd = self.commands.get(name)?;

        let result = cmd.run(args, state, out, err).and_then(|status| {
            out.flush()?;
            Ok(status)
        });
        match result {
            Ok(status) => Some(status),
            Err(e) => {
                // Typically a closed pipe or a full disk behind a redirection
                let _ = writeln!(err, "{}: {}: write error: {}", state.program, name, io_cause(&e));
                Some(1)
            }
        }
    }
}

impl Default for BuiltinManager {
    fn default() -> Self {
        Self::new()
    }
}
