use std::io::{self, IsTerminal, Write};

use tinysh::config::{ConfigLoader, Mode};
use tinysh::environment::Environment;
use tinysh::error::io_cause;
use tinysh::executor::DefaultExecutor;
use tinysh::logging;
use tinysh::prompt::ShellPrompt;
use tinysh::repl::Shell;
use tinysh::signal;
use tinysh::state::ShellState;

fn main() {
    let config = match ConfigLoader::from_args(std::env::args_os()) {
        Ok(config) => config,
        Err(e) => e.exit(),
    };
    logging::init(config.log_level);

    if let Err(e) = signal::install_shell_handlers() {
        log::warn!("signal setup failed: {}", e);
    }

    let state = ShellState::new(Environment::new(), &config.program_name);
    let mut shell = Shell::new(DefaultExecutor::new(), state);

    let status = match config.mode {
        Mode::Command(line) => shell.execute_line(&line),
        Mode::Interactive => {
            if io::stdin().is_terminal() {
                println!(
                    "{} {} - type 'help' for the built-in commands",
                    config.program_name,
                    env!("CARGO_PKG_VERSION")
                );
            }
            let mut prompt = ShellPrompt::stdin(&config.prompt);
            match shell.run_interactive(&mut prompt, &mut io::stdout()) {
                Ok(status) => status,
                Err(e) => {
                    eprintln!("{}: {}", config.program_name, io_cause(&e));
                    1
                }
            }
        }
    };

    let _ = io::stdout().flush();
    std::process::exit(status);
}
