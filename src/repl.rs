use std::io::{self, BufRead, Write};

use crate::ast::Pipeline;
use crate::executor::Executor;
use crate::parser;
use crate::prompt::ShellPrompt;
use crate::state::ShellState;

/// Drives parsing and execution for one shell session.
pub struct Shell<E: Executor> {
    executor: E,
    pub state: ShellState,
}

impl<E: Executor> Shell<E> {
    pub fn new(executor: E, state: ShellState) -> Self {
        Shell { executor, state }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Parses and runs one line, recording its status for `$?`.
    ///
    /// Blank lines and comment lines leave the previous status untouched.
    pub fn execute_line(&mut self, line: &str) -> i32 {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return self.state.last_status;
        }

        self.executor.reap();
        let pipeline = parser::parse(line, &self.state);
        log::debug!("parsed: {:?}", pipeline);

        let status = self.execute_pipeline(&pipeline);
        self.state.last_status = status;
        status
    }

    /// Runs a parsed pipeline. Setup failures are reported here and turned
    /// into their status code.
    pub fn execute_pipeline(&mut self, pipeline: &Pipeline) -> i32 {
        match self.executor.exec(pipeline, &mut self.state) {
            Ok(status) => status,
            Err(e) => {
                eprintln!("{}: {}", self.state.program, e);
                e.status()
            }
        }
    }

    /// Reads and runs lines until end of input or `exit`.
    pub fn run_interactive<R: BufRead>(
        &mut self,
        prompt: &mut ShellPrompt<R>,
        out: &mut dyn Write,
    ) -> io::Result<i32> {
        while self.state.running {
            prompt.show_prompt(out)?;
            match prompt.read_line()? {
                Some(line) => {
                    self.execute_line(&line);
                }
                None => {
                    // EOF (e.g. Ctrl+D)
                    writeln!(out)?;
                    break;
                }
            }
        }
        Ok(self.state.last_status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::executor::DefaultExecutor;
    use crate::executor::tests::MockExecutor;

    fn mock_shell() -> Shell<MockExecutor> {
        let env = Environment::from_pairs([("WHO", "me")]);
        Shell::new(MockExecutor::new(), ShellState::new(env, "tinysh"))
    }

    #[test]
    fn test_line_is_parsed_and_expanded() {
        let mut shell = mock_shell();
        shell.execute_line("echo $WHO | wc -c");
        assert_eq!(
            shell.executor().runs,
            vec![vec!["echo".to_string(), "me".to_string()], vec!["wc".to_string(), "-c".to_string()]]
        );
        assert_eq!(shell.executor().reaps, 1);
    }

    #[test]
    fn test_blank_and_comment_lines_keep_status() {
        let mut shell = mock_shell();
        shell.state.last_status = 5;
        assert_eq!(shell.execute_line("   "), 5);
        assert_eq!(shell.execute_line("# nothing to see"), 5);
        assert_eq!(shell.state.last_status, 5);
        assert!(shell.executor().runs.is_empty());
    }

    #[test]
    fn test_status_feeds_next_line() {
        let mut shell = Shell::new(DefaultExecutor::new(), ShellState::detached());
        assert_eq!(shell.execute_line("sh -c 'exit 7'"), 7);
        assert_eq!(shell.state.last_status, 7);
        assert_eq!(shell.execute_line("sh -c \"exit $?\""), 7);
        shell.execute_line("false");
        assert_eq!(shell.execute_line("sh -c \"exit $?\""), 1);
    }

    #[test]
    fn test_setup_error_becomes_status() {
        let mut shell = Shell::new(DefaultExecutor::new(), ShellState::detached());
        assert_eq!(shell.execute_line("echo hi > /nonexistent-dir-tinysh/out.txt"), 6);
        assert_eq!(shell.state.last_status, 6);
    }

    #[test]
    fn test_interactive_loop_stops_at_eof() {
        let mut shell = mock_shell();
        let mut prompt = ShellPrompt::new(&b"ls\n\npwd\n"[..], "$ ");
        let mut out = Vec::new();

        let status = shell.run_interactive(&mut prompt, &mut out).unwrap();
        assert_eq!(status, 0);
        assert_eq!(shell.executor().runs.len(), 2);
        assert_eq!(String::from_utf8(out).unwrap(), "$ $ $ $ \n");
    }

    #[test]
    fn test_interactive_loop_stops_at_exit() {
        let mut shell = mock_shell();
        let mut prompt = ShellPrompt::new(&b"ls\nexit\nnever run\n"[..], "$ ");
        let mut out = Vec::new();

        shell.run_interactive(&mut prompt, &mut out).unwrap();
        assert!(!shell.state.running);
        assert_eq!(shell.executor().runs.len(), 2);
        assert_eq!(String::from_utf8(out).unwrap(), "$ $ ");
    }

    #[test]
    fn test_exit_code_becomes_session_status() {
        let mut shell = Shell::new(DefaultExecutor::new(), ShellState::detached());
        let mut prompt = ShellPrompt::new(&b"false\nexit 9\n"[..], "$ ");
        let mut out = Vec::new();
        assert_eq!(shell.run_interactive(&mut prompt, &mut out).unwrap(), 9);
    }
}
