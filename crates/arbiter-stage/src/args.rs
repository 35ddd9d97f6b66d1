//! A small whitespace tokenizer for command parsers.
//!
//! Commands describe their syntax as a parser over an [`ArgReader`]. The
//! parser returns `None` as soon as something does not fit, which lets it
//! be written with `?`:
//!
//! ```
//! use arbiter_stage::ArgReader;
//!
//! let mut reader = ArgReader::new("bet 30");
//! let amount = (|| {
//!     reader.keyword("bet")?;
//!     reader.parse::<u32>()
//! })();
//! assert_eq!(amount, Some(30));
//! assert!(reader.is_empty());
//! ```

use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct ArgReader<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> ArgReader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            tokens: text.split_whitespace().collect(),
            pos: 0,
        }
    }

    /// Takes the next token.
    pub fn next_token(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.pos).copied()?;
        self.pos += 1;
        Some(token)
    }

    pub fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    /// Consumes the next token if it equals `word`, ignoring ASCII case.
    pub fn keyword(&mut self, word: &str) -> Option<()> {
        if self.peek()?.eq_ignore_ascii_case(word) {
            self.pos += 1;
            Some(())
        } else {
            None
        }
    }

    /// Consumes the next token if it equals any of `words`, returning the
    /// index of the one that matched.
    pub fn one_of(&mut self, words: &[&str]) -> Option<usize> {
        let token = self.peek()?;
        let index = words.iter().position(|w| token.eq_ignore_ascii_case(w))?;
        self.pos += 1;
        Some(index)
    }

    /// Parses the next token. The token is only consumed on success.
    pub fn parse<T: FromStr>(&mut self) -> Option<T> {
        let value = self.peek()?.parse().ok()?;
        self.pos += 1;
        Some(value)
    }

    /// Parses the next token if there is one; an empty reader yields
    /// `Some(None)`.
    pub fn optional<T: FromStr>(&mut self) -> Option<Option<T>> {
        if self.is_empty() {
            Some(None)
        } else {
            self.parse().map(Some)
        }
    }

    /// Everything left, joined by single spaces.
    pub fn rest(&mut self) -> String {
        let rest = self.tokens[self.pos..].join(" ");
        self.pos = self.tokens.len();
        rest
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}
