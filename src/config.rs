use clap::Parser;
use log::LevelFilter;

/// Command line of the shell binary.
#[derive(Parser, Debug)]
#[command(name = "tinysh", version, about = "A small interactive Unix shell")]
pub struct Cli {
    /// Run COMMAND (all remaining words, joined by spaces) and exit with its status
    #[arg(
        short = 'c',
        value_name = "COMMAND",
        num_args = 1..,
        allow_hyphen_values = true
    )]
    pub command: Option<Vec<String>>,

    /// Diagnostics on stderr: off, error, warn, info, debug or trace
    #[arg(long, value_name = "LEVEL", env = "TINYSH_LOG", default_value = "off")]
    pub log_level: LevelFilter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Interactive,
    /// Run one line, then exit.
    Command(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub program_name: String,
    pub prompt: String,
    pub log_level: LevelFilter,
    pub mode: Mode,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn default_config() -> Config {
        Config {
            program_name: "tinysh".to_string(),
            prompt: "tinysh> ".to_string(),
            log_level: LevelFilter::Off,
            mode: Mode::Interactive,
        }
    }

    pub fn from_cli(cli: Cli) -> Config {
        let default = Self::default_config();
        Config {
            log_level: cli.log_level,
            mode: match cli.command {
                Some(words) => Mode::Command(words.join(" ")),
                None => Mode::Interactive,
            },
            ..default
        }
    }

    pub fn from_args<I, T>(args: I) -> Result<Config, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Cli::try_parse_from(args).map(Self::from_cli)
    }
}
