use std::env;
use std::io::{self, Write};

use crate::error::io_cause;
use crate::executor::builtin::manager::BuiltinCommand;
use crate::state::ShellState;

fn current_dir_string() -> io::Result<String> {
    Ok(env::current_dir()?.to_string_lossy().into_owned())
}

// HOME or OLDPWD; an empty value counts as unset
fn required_var(state: &ShellState, name: &str, err: &mut dyn Write) -> io::Result<Option<String>> {
    match state.env.get(name) {
        Some(value) if !value.is_empty() => Ok(Some(value.to_string())),
        _ => {
            writeln!(err, "{}: cd: {} not set", state.program, name)?;
            Ok(None)
        }
    }
}

pub struct CdCommand;

impl BuiltinCommand for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn run(
        &self,
        args: &[String],
        state: &mut ShellState,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> io::Result<i32> {
        let target = match args.get(1).map(String::as_str) {
            None | Some("~") => match required_var(state, "HOME", err)? {
                Some(home) => home,
                None => return Ok(1),
            },
            Some("-") => match required_var(state, "OLDPWD", err)? {
                Some(old) => {
                    writeln!(out, "{}", old)?;
                    old
                }
                None => return Ok(1),
            },
            Some(dir) => dir.to_string(),
        };

        if let Ok(cwd) = current_dir_string() {
            state.env.set("OLDPWD", &cwd);
        }

        if let Err(e) = env::set_current_dir(&target) {
            writeln!(err, "{}: cd: {}: {}", state.program, target, io_cause(&e))?;
            return Ok(1);
        }
        log::debug!("cd: now in {}", target);

        if let Ok(cwd) = current_dir_string() {
            state.env.set("PWD", &cwd);
        }
        Ok(0)
    }
}

pub struct PwdCommand;

impl BuiltinCommand for PwdCommand {
    fn name(&self) -> &'static str {
        "pwd"
    }

    fn run(
        &self,
        _args: &[String],
        state: &mut ShellState,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> io::Result<i32> {
        match current_dir_string() {
            Ok(cwd) => {
                writeln!(out, "{}", cwd)?;
                Ok(0)
            }
            Err(e) => {
                writeln!(err, "{}: pwd: {}", state.program, io_cause(&e))?;
                Ok(1)
            }
        }
    }
}

pub struct EchoCommand;

impl BuiltinCommand for EchoCommand {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn run(
        &self,
        args: &[String],
        _state: &mut ShellState,
        out: &mut dyn Write,
        _err: &mut dyn Write,
    ) -> io::Result<i32> {
        let mut words = &args[1.min(args.len())..];
        let newline = words.first().map(String::as_str) != Some("-n");
        if !newline {
            words = &words[1..];
        }

        write!(out, "{}", words.join(" "))?;
        if newline {
            writeln!(out)?;
        }
        Ok(0)
    }
}

pub struct ExitCommand;

impl BuiltinCommand for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn run(
        &self,
        args: &[String],
        state: &mut ShellState,
        _out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> io::Result<i32> {
        let code = match args.get(1) {
            None => state.last_status,
            Some(arg) => match arg.trim().parse::<i32>() {
                Ok(code) => code,
                Err(_) => {
                    writeln!(err, "{}: exit: {}: numeric argument required", state.program, arg)?;
                    2
                }
            },
        };

        state.running = false;
        state.last_status = code;
        Ok(code)
    }
}

pub struct HelpCommand;

const HELP_TEXT: &str = "\
Built-in commands:
  cd [dir|-|~]     Change directory (default: $HOME)
  pwd              Print the current directory
  echo [-n] [args] Print arguments (-n: no trailing newline)
  export NAME=val  Set an environment variable (no args: list them)
  unset NAME...    Remove environment variables
  env              List all environment variables
  exit [code]      Leave the shell
  help             Show this help

Syntax:
  cmd1 | cmd2      Pipe the output of cmd1 into cmd2
  cmd < file       Read standard input from file
  cmd > file       Write standard output to file
  cmd >> file      Append standard output to file
  cmd 2> file      Write standard error to file
  cmd &            Run in the background
  'text'           Literal text
  \"text\"           Text with $VAR expansion
  *.txt  file?     Wildcard expansion
  # comment        Ignored to the end of the line
";

impl BuiltinCommand for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn run(
        &self,
        _args: &[String],
        _state: &mut ShellState,
        out: &mut dyn Write,
        _err: &mut dyn Write,
    ) -> io::Result<i32> {
        out.write_all(HELP_TEXT.as_bytes())?;
        Ok(0)
    }
}

pub struct ExportCommand;

impl BuiltinCommand for ExportCommand {
    fn name(&self) -> &'static str {
        "export"
    }

    fn run(
        &self,
        args: &[String],
        state: &mut ShellState,
        out: &mut dyn Write,
        _err: &mut dyn Write,
    ) -> io::Result<i32> {
        if args.len() < 2 {
            for (name, value) in state.env.all() {
                writeln!(out, "export {}=\"{}\"", name, value)?;
            }
            return Ok(0);
        }

        // NAME without a value would mark an existing variable for export;
        // every variable is already exported, so there is nothing to do
        for arg in &args[1..] {
            if let Some((name, value)) = arg.split_once('=') {
                state.env.set(name, value);
            }
        }
        Ok(0)
    }
}

pub struct UnsetCommand;

impl BuiltinCommand for UnsetCommand {
    fn name(&self) -> &'static str {
        "unset"
    }

    fn run(
        &self,
        args: &[String],
        state: &mut ShellState,
        _out: &mut dyn Write,
        _err: &mut dyn Write,
    ) -> io::Result<i32> {
        for name in args.iter().skip(1) {
            state.env.unset(name);
        }
        Ok(0)
    }
}

pub struct EnvCommand;

impl BuiltinCommand for EnvCommand {
    fn name(&self) -> &'static str {
        "env"
    }

    fn run(
        &self,
        _args: &[String],
        state: &mut ShellState,
        out: &mut dyn Write,
        _err: &mut dyn Write,
    ) -> io::Result<i32> {
        for (name, value) in state.env.all() {
            writeln!(out, "{}={}", name, value)?;
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::executor::builtin::BuiltinManager;

    struct Outcome {
        status: i32,
        out: String,
        err: String,
    }

    fn run(state: &mut ShellState, line: &[&str]) -> Outcome {
        let args: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let status = BuiltinManager::new()
            .execute(&args, state, &mut out, &mut err)
            .expect("not a builtin");
        Outcome {
            status,
            out: String::from_utf8(out).unwrap(),
            err: String::from_utf8(err).unwrap(),
        }
    }

    #[test]
    fn test_unknown_name_is_not_builtin() {
        let mgr = BuiltinManager::new();
        let mut state = ShellState::detached();
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let args = vec!["ls".to_string()];
        assert_eq!(mgr.execute(&args, &mut state, &mut out, &mut err), None);
        assert_eq!(mgr.execute(&[], &mut state, &mut out, &mut err), None);
        for name in ["cd", "pwd", "echo", "exit", "help", "export", "unset", "env"] {
            assert!(mgr.is_builtin(name), "{}", name);
        }
    }

    #[test]
    fn test_echo() {
        let mut state = ShellState::detached();
        assert_eq!(run(&mut state, &["echo", "hello", "world"]).out, "hello world\n");
        assert_eq!(run(&mut state, &["echo", "-n", "no", "newline"]).out, "no newline");
        assert_eq!(run(&mut state, &["echo"]).out, "\n");
        assert_eq!(run(&mut state, &["echo", "-n"]).out, "");
        // Only a leading -n is an option
        assert_eq!(run(&mut state, &["echo", "a", "-n"]).out, "a -n\n");
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let mut state = ShellState::detached();
        let outcome = run(&mut state, &["pwd"]);
        assert_eq!(outcome.status, 0);
        let expected = env::current_dir().unwrap();
        assert_eq!(outcome.out.trim_end(), expected.to_string_lossy());
    }

    #[test]
    fn test_cd_without_home_fails() {
        let mut state = ShellState::detached();
        let before = env::current_dir().unwrap();

        let outcome = run(&mut state, &["cd"]);
        assert_eq!(outcome.status, 1);
        assert_eq!(outcome.err, "tinysh: cd: HOME not set\n");

        assert_eq!(run(&mut state, &["cd", "~"]).status, 1);
        assert_eq!(env::current_dir().unwrap(), before);
        assert_eq!(state.env.get("OLDPWD"), None);
    }

    #[test]
    fn test_cd_dash_without_oldpwd_fails() {
        let mut state = ShellState::detached();
        let outcome = run(&mut state, &["cd", "-"]);
        assert_eq!(outcome.status, 1);
        assert_eq!(outcome.err, "tinysh: cd: OLDPWD not set\n");
        assert!(outcome.out.is_empty());
    }

    #[test]
    fn test_cd_to_missing_dir_reports_os_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        let missing = missing.to_str().unwrap();
        let mut state = ShellState::detached();

        let outcome = run(&mut state, &["cd", missing]);
        assert_eq!(outcome.status, 1);
        assert_eq!(
            outcome.err,
            format!("tinysh: cd: {}: No such file or directory\n", missing)
        );
        // The old directory is recorded before the change is attempted
        assert!(state.env.get("OLDPWD").is_some());
        assert_eq!(state.env.get("PWD"), None);
    }

    #[test]
    fn test_exit_uses_last_status_by_default() {
        let mut state = ShellState::detached();
        state.last_status = 3;
        let outcome = run(&mut state, &["exit"]);
        assert_eq!(outcome.status, 3);
        assert!(!state.running);
    }

    #[test]
    fn test_exit_with_code() {
        let mut state = ShellState::detached();
        assert_eq!(run(&mut state, &["exit", "42"]).status, 42);
        assert_eq!(state.last_status, 42);
        assert!(!state.running);
    }

    #[test]
    fn test_exit_with_non_numeric_code() {
        let mut state = ShellState::detached();
        let outcome = run(&mut state, &["exit", "soon"]);
        assert_eq!(outcome.status, 2);
        assert_eq!(outcome.err, "tinysh: exit: soon: numeric argument required\n");
        assert_eq!(state.last_status, 2);
        assert!(!state.running);
    }

    #[test]
    fn test_export_unset_and_env() {
        let mut state = ShellState::new(Environment::from_pairs([("B", "2")]), "tinysh");

        assert_eq!(run(&mut state, &["export", "A=1", "EMPTY=", "EQ=x=y", "JUSTNAME"]).status, 0);
        assert_eq!(state.env.get("A"), Some("1"));
        assert_eq!(state.env.get("EMPTY"), Some(""));
        assert_eq!(state.env.get("EQ"), Some("x=y"));
        assert_eq!(state.env.get("JUSTNAME"), None);

        assert_eq!(run(&mut state, &["unset", "EMPTY", "EQ", "MISSING"]).status, 0);
        assert_eq!(run(&mut state, &["env"]).out, "A=1\nB=2\n");
        assert_eq!(run(&mut state, &["export"]).out, "export A=\"1\"\nexport B=\"2\"\n");
    }

    #[test]
    fn test_help_lists_builtins() {
        let mut state = ShellState::detached();
        let outcome = run(&mut state, &["help"]);
        assert_eq!(outcome.status, 0);
        for name in ["cd", "pwd", "echo", "export", "unset", "env", "exit", "help"] {
            assert!(outcome.out.contains(name), "{}", name);
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut state = ShellState::detached();
        let mut err = Vec::new();
        let args = vec!["echo".to_string(), "hi".to_string()];
        let status = BuiltinManager::new().execute(&args, &mut state, &mut BrokenPipe, &mut err);
        assert_eq!(status, Some(1));
        assert!(String::from_utf8(err).unwrap().starts_with("tinysh: echo: write error"));
    }
}
