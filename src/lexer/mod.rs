use crate::lexer::cursor::Cursor;
use crate::span::Span;

pub mod cursor;

/// Everything from this delimiter to the end of the line is ignored.
pub const COMMENT_DELIMITER: &str = "//";

/// A source line that survived preprocessing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line<'a> {
    /// Line number inside the file, counting from 0
    pub number: usize,
    /// Line content without comment and surrounding whitespace
    pub text: &'a str,
    /// Byte offset of `text` inside the whole source
    pub offs: usize,
}

/// Single whitespace-separated word of a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub span: Span,
}

/// Strip comments and surrounding whitespace, dropping lines left empty.
///
/// Line numbers are taken before filtering so they keep pointing at the original source.
pub fn preprocess(src: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut offs = 0;
    for (number, raw) in src.split('\n').enumerate() {
        let code = match raw.find(COMMENT_DELIMITER) {
            Some(idx) => &raw[..idx],
            None => raw,
        };
        let trimmed_start = code.trim_start();
        let text = trimmed_start.trim_end();
        if !text.is_empty() {
            lines.push(Line {
                number,
                text,
                offs: offs + (code.len() - trimmed_start.len()),
            });
        }
        // Account for the '\n' removed by `split`
        offs += raw.len() + 1;
    }
    lines
}

impl<'a> Line<'a> {
    /// Split the line on whitespace.
    pub fn tokens(&self) -> Vec<Token<'a>> {
        let mut cursor = Cursor::new(self.text);
        let mut tokens = Vec::new();
        loop {
            cursor.take_while(char::is_whitespace);
            if cursor.is_eof() {
                break;
            }
            cursor.reset_pos();
            cursor.take_while(|c| !c.is_whitespace());
            tokens.push(Token {
                text: cursor.token_str(),
                span: Span::at(self.offs + cursor.token_start(), cursor.pos_in_token()),
            });
        }
        tokens
    }

    /// Span of the whole line inside the source.
    pub fn span(&self) -> Span {
        Span::at(self.offs, self.text.len())
    }
}
