//! Line-oriented tokenizer capability for `@TABLE`/`@TREE` bodies.
//!
//! The interpreter consumes tokens through the [`RuleTokenizer`] trait so a
//! host can substitute its own reader; [`TextTokenizer`] is the default
//! implementation. Tokens are separated by whitespace, commas, colons,
//! equals signs and braces; `#` starts a comment outside quotes; quoted
//! strings survive as single tokens without the quotes.

/// Capability interface handing out one line of tokens at a time.
///
/// Blank and comment-only lines are skipped; `None` means end of input.
pub trait RuleTokenizer {
    fn next_line(&mut self) -> Option<Vec<String>>;
}

/// Default tokenizer over an in-memory string.
pub struct TextTokenizer<'a> {
    lines: std::str::Lines<'a>,
}

impl<'a> TextTokenizer<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
        }
    }
}

fn tokenize_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        if in_quotes {
            if ch == '"' {
                tokens.push(std::mem::take(&mut current));
                in_quotes = false;
            } else {
                current.push(ch);
            }
            continue;
        }
        match ch {
            '"' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                in_quotes = true;
            }
            '#' => break,
            c if c.is_whitespace() || matches!(c, ',' | ':' | '=' | '{' | '}') => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

impl RuleTokenizer for TextTokenizer<'_> {
    fn next_line(&mut self) -> Option<Vec<String>> {
        for line in self.lines.by_ref() {
            let tokens = tokenize_line(line);
            if !tokens.is_empty() {
                return Some(tokens);
            }
        }
        None
    }
}
