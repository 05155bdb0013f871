//! Line tokenizer
//!
//! Splits one input line into tokens separated by runs of spaces or tabs.
//! A double quote toggles quoted mode, in which separators are ordinary
//! content. A quote opening a token and a quote closing a token are
//! stripped; quotes inside a token are kept as written.
//!
//! Scanning is done per `char`, so multi-byte text is never split inside a
//! character.

const QUOTE: char = '"';

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t')
}

/// Lazy token sequence over a borrowed line
///
/// Cheap to clone; a clone yields the same remaining tokens again.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a str,
}

/// Tokenize a line
pub fn tokenize(line: &str) -> Tokens<'_> {
    Tokens { rest: line }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let data = self.rest;

        // Skip leading separators; an opening quote enters quoted mode
        let mut start = data.len();
        let mut quoted = false;
        for (i, c) in data.char_indices() {
            if !is_separator(c) {
                start = i;
                if c == QUOTE {
                    quoted = true;
                    start += c.len_utf8();
                }
                break;
            }
        }

        let mut prev_quote_width = None;
        for (offset, c) in data[start..].char_indices() {
            let i = start + offset;
            if !quoted && is_separator(c) {
                let end = prev_quote_width.map_or(i, |w| i - w);
                self.rest = &data[i + c.len_utf8()..];
                return Some(&data[start..end]);
            }
            if c == QUOTE {
                quoted = !quoted;
                prev_quote_width = Some(c.len_utf8());
            } else {
                prev_quote_width = None;
            }
        }

        self.rest = "";
        if data.len() > start {
            let end = prev_quote_width.map_or(data.len(), |w| data.len() - w);
            Some(&data[start..end])
        } else {
            None
        }
    }
}
