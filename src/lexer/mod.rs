mod lexer;
mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind};

pub fn tokenize(line: &str) -> Vec<Token> {
    Lexer::new(line).tokenize()
}
