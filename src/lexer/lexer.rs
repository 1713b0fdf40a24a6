use super::token::{Token, TokenKind};

/// Splits one input line into tokens.
///
/// Tokenizing never fails: an unterminated quote simply runs to the end of
/// the line, and `#` outside quotes ends the line.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    /// Always terminated by a single `End` token.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        let end = self.chars.len();
        tokens.push(Token {
            kind: TokenKind::End,
            lexeme: String::new(),
            span: (end, end),
        });
        tokens
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek_at(0).is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn is_err_redirect(&self) -> bool {
        self.peek_at(0) == Some('2') && self.peek_at(1) == Some('>')
    }

    fn operator(&mut self, kind: TokenKind, len: usize) -> Token {
        let start = self.pos;
        self.pos += len;
        Token {
            kind,
            lexeme: self.chars[start..self.pos].iter().collect(),
            span: (start, self.pos),
        }
    }

    // Returns None once the line (or a comment) is exhausted.
    fn next_token(&mut self) -> Option<Token> {
        loop {
            self.skip_whitespace();
            let ch = self.peek_at(0)?;

            let token = match ch {
                '|' => self.operator(TokenKind::Pipe, 1),
                '<' => self.operator(TokenKind::RedirectIn, 1),
                '>' if self.peek_at(1) == Some('>') => self.operator(TokenKind::RedirectAppend, 2),
                '>' => self.operator(TokenKind::RedirectOut, 1),
                '2' if self.is_err_redirect() => self.operator(TokenKind::RedirectErr, 2),
                '&' => self.operator(TokenKind::Background, 1),
                '#' => {
                    // Comment: ignore the rest of the line
                    self.pos = self.chars.len();
                    return None;
                }
                _ => {
                    let start = self.pos;
                    let word = self.read_word();
                    if word.is_empty() {
                        // e.g. '' or "" on their own
                        continue;
                    }
                    Token {
                        kind: TokenKind::Word,
                        lexeme: word,
                        span: (start, self.pos),
                    }
                }
            };
            return Some(token);
        }
    }

    fn read_word(&mut self) -> String {
        let mut buf = String::new();

        while let Some(ch) = self.peek_at(0) {
            if ch.is_whitespace() || matches!(ch, '|' | '<' | '>' | '&' | '#') {
                break;
            }
            // `2>` starts a redirect even in the middle of a word
            if self.is_err_redirect() {
                break;
            }

            match ch {
                '\'' => {
                    self.pos += 1;
                    while let Some(nc) = self.peek_at(0) {
                        self.pos += 1;
                        if nc == '\'' {
                            break;
                        }
                        buf.push(nc);
                    }
                }
                '"' => {
                    self.pos += 1;
                    while let Some(nc) = self.peek_at(0) {
                        if nc == '"' {
                            self.pos += 1;
                            break;
                        }
                        if nc == '\\' {
                            if let Some(escaped @ ('"' | '\\' | '$' | '`')) = self.peek_at(1) {
                                buf.push(escaped);
                                self.pos += 2;
                                continue;
                            }
                        }
                        buf.push(nc);
                        self.pos += 1;
                    }
                }
                '\\' => {
                    self.pos += 1;
                    if let Some(nc) = self.peek_at(0) {
                        buf.push(nc);
                        self.pos += 1;
                    }
                }
                _ => {
                    buf.push(ch);
                    self.pos += 1;
                }
            }
        }

        buf
    }
}
