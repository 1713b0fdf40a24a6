pub mod default;

use crate::ast::Pipeline;
use crate::lexer;
use crate::state::ShellState;

pub use default::DefaultParser;

/// Builds a pipeline from a token stream.
///
/// Parsing is lenient and never fails: a dangling redirection or an empty
/// pipe stage is dropped rather than reported.
pub trait Parser {
    fn parse(&mut self) -> Pipeline;
}

/// Tokenizes and parses one line against the current session, expanding
/// variables and globbing against the real filesystem.
pub fn parse(line: &str, state: &ShellState) -> Pipeline {
    let tokens = lexer::tokenize(line);
    DefaultParser::new(&tokens, &state.env, state.last_status).parse()
}
