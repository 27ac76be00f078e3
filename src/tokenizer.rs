//! Wikitext tokenizer.
//!
//! Splits a page (or a single line of one) into the flat token stream the
//! section parser walks: headings, list items, template calls, wiki links,
//! plain text and the markup noise around them. Nesting of `{{...}}` and
//! `[[...]]` is tracked with a small closer stack so that templates spanning
//! several lines stay a single token.

use std::collections::HashMap;

use thiserror::Error;

/// One lexical unit of wikitext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `===Noun===` at the start of a line
    Heading { depth: usize, text: String },
    /// `#: text` at the start of a line
    ListItem { prefix: String, text: String },
    /// `{{name|positional|key=value}}`
    Function {
        name: String,
        positional: Vec<String>,
        named: HashMap<String, String>,
    },
    /// `[[target|text]]`
    WikiLink { target: String, text: String },
    PlainText(String),
    /// Bold/italic quote runs and horizontal rules
    Markup(String),
    /// Raw HTML tags (`<ref>...</ref>` is swallowed whole)
    Html(String),
    Newline,
    Comment(String),
}

impl Token {
    pub fn is_heading(&self) -> bool {
        matches!(self, Token::Heading { .. })
    }

    pub fn is_list_item(&self) -> bool {
        matches!(self, Token::ListItem { .. })
    }

    /// Short name used in log messages
    pub fn kind(&self) -> &'static str {
        match self {
            Token::Heading { .. } => "heading",
            Token::ListItem { .. } => "list item",
            Token::Function { .. } => "function",
            Token::WikiLink { .. } => "wiki link",
            Token::PlainText(_) => "plain text",
            Token::Markup(_) => "markup",
            Token::Html(_) => "html",
            Token::Newline => "newline",
            Token::Comment(_) => "comment",
        }
    }
}

/// Structural problems noticed while tokenizing. The tokenizer never stops
/// on these; callers that need clean input check [`WikiTokenizer::errors`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("unterminated {{{{ at byte {offset}")]
    UnterminatedTemplate { offset: usize },

    #[error("unterminated [[ at byte {offset}")]
    UnterminatedLink { offset: usize },

    #[error("unterminated <!-- at byte {offset}")]
    UnterminatedComment { offset: usize },
}

const LIST_CHARS: &[char] = &['#', '*', ':', ';'];

pub struct WikiTokenizer<'a> {
    text: &'a str,
    pos: usize,
    token_start: usize,
    errors: Vec<TokenizeError>,
}

impl<'a> WikiTokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        WikiTokenizer {
            text,
            pos: 0,
            token_start: 0,
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[TokenizeError] {
        &self.errors
    }

    /// Byte offset of the start of the most recently returned token.
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Moves the cursor back to the start of the line holding the most
    /// recently returned token, so the next call re-reads that line.
    pub fn return_to_line_start(&mut self) {
        self.pos = self.text[..self.token_start]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.text.as_bytes()[self.pos - 1] == b'\n'
    }

    fn line_end(&self, from: usize) -> usize {
        self.text[from..]
            .find('\n')
            .map(|i| from + i)
            .unwrap_or(self.text.len())
    }

    pub fn next_token(&mut self) -> Option<Token> {
        if self.pos >= self.text.len() {
            return None;
        }
        self.token_start = self.pos;
        let rest = self.rest();

        if rest.starts_with('\n') {
            self.pos += 1;
            return Some(Token::Newline);
        }

        if self.at_line_start() {
            if rest.starts_with('=') {
                return Some(self.heading());
            }
            if rest.starts_with(LIST_CHARS) {
                return Some(self.list_item());
            }
            if rest.starts_with("----") {
                let len = rest.len() - rest.trim_start_matches('-').len();
                self.pos += len;
                return Some(Token::Markup(rest[..len].to_string()));
            }
        }

        if rest.starts_with("<!--") {
            return Some(self.comment());
        }
        if rest.starts_with("{{") {
            return Some(self.function());
        }
        if rest.starts_with("[[") {
            return Some(self.wiki_link());
        }
        if rest.starts_with("''") {
            let len = rest.len() - rest.trim_start_matches('\'').len();
            self.pos += len;
            return Some(Token::Markup(rest[..len].to_string()));
        }
        if starts_html_tag(rest) {
            if let Some(token) = self.html() {
                return Some(token);
            }
        }
        Some(self.plain_text())
    }

    // ─────────────────────────────────────────────────────────────
    // Line-start constructs
    // ─────────────────────────────────────────────────────────────

    fn heading(&mut self) -> Token {
        let end = self.line_end(self.pos);
        let line = &self.text[self.pos..end];
        self.pos = end;

        let depth = line.len() - line.trim_start_matches('=').len();
        let text = line
            .trim_start_matches('=')
            .trim_end()
            .trim_end_matches('=')
            .trim()
            .to_string();
        Token::Heading { depth, text }
    }

    fn list_item(&mut self) -> Token {
        let rest = self.rest();
        let prefix_len = rest.len() - rest.trim_start_matches(LIST_CHARS).len();
        let prefix = rest[..prefix_len].to_string();
        let body_start = self.pos + prefix_len;
        let end = scan_balanced(self.text, body_start, Stop::Newline)
            .unwrap_or_else(|| self.line_end(body_start));
        let text = self.text[body_start..end].trim().to_string();
        self.pos = end;
        Token::ListItem { prefix, text }
    }

    // ─────────────────────────────────────────────────────────────
    // Inline constructs
    // ─────────────────────────────────────────────────────────────

    fn comment(&mut self) -> Token {
        let body_start = self.pos + 4;
        match self.text[body_start..].find("-->") {
            Some(i) => {
                self.pos = body_start + i + 3;
                Token::Comment(self.text[body_start..body_start + i].to_string())
            }
            None => {
                self.errors
                    .push(TokenizeError::UnterminatedComment { offset: self.pos });
                self.pos = self.text.len();
                Token::Comment(self.text[body_start..].to_string())
            }
        }
    }

    fn function(&mut self) -> Token {
        let open = self.pos;
        let Some(close) = scan_balanced(self.text, open + 2, Stop::Closer("}}")) else {
            self.errors
                .push(TokenizeError::UnterminatedTemplate { offset: open });
            self.pos = self.text.len();
            return Token::PlainText(self.text[open..].to_string());
        };
        self.pos = close + 2;

        let mut parts = split_top_level(&self.text[open + 2..close]).into_iter();
        let name = parts.next().unwrap_or_default().trim().to_string();
        let mut positional = Vec::new();
        let mut named = HashMap::new();
        for part in parts {
            match named_arg(part) {
                Some((key, value)) => {
                    named.insert(key.to_string(), value.to_string());
                }
                None => positional.push(part.trim().to_string()),
            }
        }
        Token::Function {
            name,
            positional,
            named,
        }
    }

    fn wiki_link(&mut self) -> Token {
        let open = self.pos;
        let Some(close) = scan_balanced(self.text, open + 2, Stop::Closer("]]")) else {
            self.errors.push(TokenizeError::UnterminatedLink { offset: open });
            self.pos = self.text.len();
            return Token::PlainText(self.text[open..].to_string());
        };
        self.pos = close + 2;

        let parts = split_top_level(&self.text[open + 2..close]);
        let target = parts.first().copied().unwrap_or_default().trim().to_string();
        let text = if parts.len() > 1 {
            parts[parts.len() - 1].trim().to_string()
        } else {
            target.clone()
        };
        Token::WikiLink { target, text }
    }

    fn html(&mut self) -> Option<Token> {
        let rest = self.rest();
        let tag_end = rest.find('>')? + 1;
        let tag = &rest[..tag_end];

        // <ref>...</ref> holds citations, never dictionary text
        let is_open_ref = tag[1..]
            .get(..3)
            .is_some_and(|name| name.eq_ignore_ascii_case("ref"))
            && !tag
                .get(4..)
                .is_some_and(|after| after.starts_with(|c: char| c.is_alphanumeric()))
            && !tag.ends_with("/>");
        let len = if is_open_ref {
            rest[tag_end..]
                .find("</ref>")
                .map(|i| tag_end + i + "</ref>".len())
                .unwrap_or(tag_end)
        } else {
            tag_end
        };
        self.pos += len;
        Some(Token::Html(rest[..len].to_string()))
    }

    fn plain_text(&mut self) -> Token {
        let rest = self.rest();
        let mut len = 0;
        for (i, c) in rest.char_indices() {
            if i > 0 {
                let tail = &rest[i..];
                if c == '\n'
                    || tail.starts_with("{{")
                    || tail.starts_with("[[")
                    || tail.starts_with("''")
                    || tail.starts_with("<!--")
                    || starts_html_tag(tail)
                {
                    break;
                }
            }
            len = i + c.len_utf8();
        }
        self.pos += len;
        Token::PlainText(rest[..len].to_string())
    }
}

fn starts_html_tag(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('<')
        && matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '/')
}

#[derive(Clone, Copy)]
enum Stop {
    /// Stop at a newline outside any brackets
    Newline,
    /// Stop at this closer once every inner bracket is balanced
    Closer(&'static str),
}

/// Walks `text` from `from` keeping a stack of expected closers. Returns the
/// byte offset of the stop position, or `None` when the input ends first.
fn scan_balanced(text: &str, from: usize, stop: Stop) -> Option<usize> {
    let mut stack: Vec<&str> = Vec::new();
    let mut i = from;
    while i < text.len() {
        let rest = &text[i..];
        if rest.starts_with("<!--") {
            i += rest.find("-->").map(|j| j + 3).unwrap_or(rest.len());
            continue;
        }
        if rest.starts_with("{{") {
            stack.push("}}");
            i += 2;
            continue;
        }
        if rest.starts_with("[[") {
            stack.push("]]");
            i += 2;
            continue;
        }
        if rest.starts_with("}}") || rest.starts_with("]]") {
            let closer = &rest[..2];
            if stack.last() == Some(&closer) {
                stack.pop();
            } else if stack.is_empty() {
                if let Stop::Closer(wanted) = stop {
                    if wanted == closer {
                        return Some(i);
                    }
                }
            }
            i += 2;
            continue;
        }
        if rest.starts_with('\n') && stack.is_empty() {
            if let Stop::Newline = stop {
                return Some(i);
            }
        }
        i += rest.chars().next().map(char::len_utf8).unwrap_or(1);
    }
    match stop {
        Stop::Newline if stack.is_empty() => Some(text.len()),
        _ => None,
    }
}

/// Splits template or link contents at `|` characters that are not nested
/// inside another template or link.
pub(crate) fn split_top_level(inner: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < inner.len() {
        let rest = &inner[i..];
        if rest.starts_with("{{") || rest.starts_with("[[") {
            depth += 1;
            i += 2;
        } else if rest.starts_with("}}") || rest.starts_with("]]") {
            depth = depth.saturating_sub(1);
            i += 2;
        } else if rest.starts_with('|') && depth == 0 {
            parts.push(&inner[start..i]);
            i += 1;
            start = i;
        } else {
            i += rest.chars().next().map(char::len_utf8).unwrap_or(1);
        }
    }
    parts.push(&inner[start..]);
    parts
}

/// `key=value` where the `=` sits before any nested template or link.
fn named_arg(part: &str) -> Option<(&str, &str)> {
    let eq = part.find('=')?;
    let key = &part[..eq];
    if key.contains("{{") || key.contains("[[") || key.trim().is_empty() {
        return None;
    }
    Some((key.trim(), part[eq + 1..].trim()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests for WikiTokenizer
// ─────────────────────────────────────────────────────────────────────────────
