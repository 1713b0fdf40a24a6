#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,           // command, argument or redirect target
    Pipe,           // |
    RedirectIn,     // <
    RedirectOut,    // >
    RedirectAppend, // >>
    RedirectErr,    // 2>
    Background,     // &
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,       // Word text after quote removal, operator text otherwise
    pub span: (usize, usize), // Position info [start, end) in chars
}

impl Token {
    pub fn word(&self) -> Option<&str> {
        match self.kind {
            TokenKind::Word => Some(&self.lexeme),
            _ => None,
        }
    }
}
