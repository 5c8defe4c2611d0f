// Heavily inspired by `rustc_lexer` and adapted to suit the project.
// See https://doc.rust-lang.org/beta/nightly-rustc/src/rustc_lexer/cursor.rs.html

use std::str::Chars;

/// Peekable iterator over a char sequence, tracking the byte position inside the input.
pub struct Cursor<'a> {
    len_remaining: usize,
    /// Byte offset of the start of the current token
    token_start: usize,
    chars: Chars<'a>,
    input: &'a str,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Cursor<'a> {
        Cursor {
            len_remaining: input.len(),
            token_start: 0,
            chars: input.chars(),
            input,
        }
    }

    /// Peek the next char without consuming it. Returns `'\0'` at end of input.
    pub fn first(&self) -> char {
        self.chars.clone().next().unwrap_or('\0')
    }

    /// Input is fully consumed
    pub fn is_eof(&self) -> bool {
        self.chars.as_str().is_empty()
    }

    /// Byte offset of the cursor inside the input
    pub fn pos(&self) -> usize {
        self.input.len() - self.chars.as_str().len()
    }

    /// Length of the token consumed since the last `reset_pos`
    pub fn pos_in_token(&self) -> usize {
        self.len_remaining - self.chars.as_str().len()
    }

    /// Start a new token at the current position
    pub fn reset_pos(&mut self) {
        self.len_remaining = self.chars.as_str().len();
        self.token_start = self.pos();
    }

    /// Byte offset where the current token started
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Slice of the input covering the current token
    pub fn token_str(&self) -> &'a str {
        &self.input[self.token_start..self.pos()]
    }

    pub fn bump(&mut self) -> Option<char> {
        self.chars.next()
    }

    pub fn take_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
        while !self.is_eof() && predicate(self.first()) {
            self.bump();
        }
    }
}
