pub mod repl;
pub mod lexer;
pub mod parser;
pub mod ast;
pub mod expander;
pub mod wildcard;
pub mod executor;
pub mod environment;
pub mod state;
pub mod error;
pub mod signal;
pub mod config;
pub mod prompt;
pub mod logging;
