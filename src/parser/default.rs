use crate::ast::{Command, Pipeline};
use crate::environment::Environment;
use crate::expander::Expander;
use crate::lexer::{Token, TokenKind};
use crate::parser::Parser;
use crate::wildcard::{self, DirLister, FsLister};

/// Single left-to-right pass over the tokens of one line.
pub struct DefaultParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    expander: Expander<'a>,
    lister: &'a dyn DirLister,
}

impl<'a> DefaultParser<'a> {
    pub fn new(tokens: &'a [Token], env: &'a Environment, last_status: i32) -> Self {
        Self {
            tokens,
            pos: 0,
            expander: Expander::new(env, last_status),
            lister: &FsLister,
        }
    }

    pub fn with_lister(mut self, lister: &'a dyn DirLister) -> Self {
        self.lister = lister;
        self
    }

    fn next(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    // The token after a redirect operator is always consumed. It only
    // becomes the target when it is a word; anything else is dropped.
    fn redirect_target(&mut self) -> Option<String> {
        let word = self.next()?.word()?;
        Some(self.expander.expand(word))
    }

    fn push_word(&self, cmd: &mut Command, word: &str) {
        let expanded = self.expander.expand(word);
        if wildcard::has_wildcards(&expanded) {
            cmd.args
                .extend(wildcard::expand_glob_with(&expanded, self.lister));
        } else {
            cmd.args.push(expanded);
        }
    }
}

impl<'a> Parser for DefaultParser<'a> {
    fn parse(&mut self) -> Pipeline {
        let mut pipeline = Pipeline::default();
        let mut current = Command::new();

        while let Some(token) = self.next() {
            match token.kind {
                TokenKind::Word => self.push_word(&mut current, &token.lexeme),
                TokenKind::RedirectIn => {
                    if let Some(path) = self.redirect_target() {
                        current.input_file = Some(path);
                    }
                }
                TokenKind::RedirectOut | TokenKind::RedirectAppend => {
                    if let Some(path) = self.redirect_target() {
                        current.output_file = Some(path);
                        current.append_output = token.kind == TokenKind::RedirectAppend;
                    }
                }
                TokenKind::RedirectErr => {
                    if let Some(path) = self.redirect_target() {
                        current.error_file = Some(path);
                    }
                }
                TokenKind::Pipe => {
                    let finished = std::mem::take(&mut current);
                    if !finished.is_empty() {
                        pipeline.commands.push(finished);
                    }
                }
                TokenKind::Background => {
                    current.background = true;
                    pipeline.background = true;
                }
                TokenKind::End => break,
            }
        }

        if !current.is_empty() {
            pipeline.commands.push(current);
        }
        pipeline
    }
}
