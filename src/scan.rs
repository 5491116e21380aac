//! Line-oriented scanning of contract and library declarations.
//!
//! The scanner walks source text one line at a time, strips line and block
//! comments while carrying block-comment state across lines, and matches
//! declaration keywords on what remains. Stripping is token-naive: a `//` or
//! `/*` inside a string literal is honored as a comment opener. Declaration
//! and pragma lines never contain string literals, so this does not affect
//! what the scanner is used for.

use std::{borrow::Cow, collections::VecDeque, fmt, iter::Enumerate, str::Lines};

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a `contract` or `library` keyword followed by an identifier.
static RE_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?P<kind>contract|library)\s+(?P<name>[A-Za-z_$][A-Za-z0-9_$]*)").unwrap()
});

/// The kind of a scanned declaration.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DeclarationKind {
    Contract,
    Library,
}

impl DeclarationKind {
    /// The keyword as it appears in source.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Contract => "contract",
            DeclarationKind::Library => "library",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single declaration found in source text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: String,
    /// 1-based line the declaration keyword appears on.
    pub line: usize,
}

/// Streaming iterator over the declarations of one source text.
pub struct DeclarationScanner<'a> {
    lines: Enumerate<Lines<'a>>,
    in_block_comment: bool,
    pending: VecDeque<Declaration>,
}

impl<'a> DeclarationScanner<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines().enumerate(),
            in_block_comment: false,
            pending: VecDeque::new(),
        }
    }
}

impl Iterator for DeclarationScanner<'_> {
    type Item = Declaration;

    fn next(&mut self) -> Option<Declaration> {
        loop {
            if let Some(declaration) = self.pending.pop_front() {
                return Some(declaration);
            }
            let (idx, line) = self.lines.next()?;
            let code = strip_comments(line, &mut self.in_block_comment);
            for captures in RE_DECLARATION.captures_iter(&code) {
                let kind = match &captures["kind"] {
                    "library" => DeclarationKind::Library,
                    _ => DeclarationKind::Contract,
                };
                self.pending.push_back(Declaration {
                    kind,
                    name: captures["name"].to_string(),
                    line: idx + 1,
                });
            }
        }
    }
}

/// Collects every contract and library declaration in `content`, in source
/// order.
pub fn scan_declarations(content: &str) -> Vec<Declaration> {
    DeclarationScanner::new(content).collect()
}

/// Removes line and block comments from a single line.
///
/// `in_block_comment` carries open `/* ... */` state between consecutive
/// lines of the same text. Code fragments around a removed block comment are
/// rejoined with a space so tokens do not merge.
pub(crate) fn strip_comments<'a>(line: &'a str, in_block_comment: &mut bool) -> Cow<'a, str> {
    let mut pieces: Vec<&str> = Vec::new();
    let mut rest = line;
    loop {
        if *in_block_comment {
            match rest.find("*/") {
                Some(end) => {
                    *in_block_comment = false;
                    rest = &rest[end + 2..];
                }
                None => break,
            }
        } else {
            let line_at = rest.find("//");
            let block_at = rest.find("/*");
            match (line_at, block_at) {
                (Some(l), Some(b)) if l < b => {
                    pieces.push(&rest[..l]);
                    break
                }
                (Some(l), None) => {
                    pieces.push(&rest[..l]);
                    break
                }
                (_, Some(b)) => {
                    pieces.push(&rest[..b]);
                    *in_block_comment = true;
                    rest = &rest[b + 2..];
                }
                (None, None) => {
                    pieces.push(rest);
                    break
                }
            }
        }
    }
    pieces.retain(|piece| !piece.is_empty());
    match pieces.as_slice() {
        [] => Cow::Borrowed(""),
        [only] if *only == line => Cow::Borrowed(line),
        _ => Cow::Owned(pieces.join(" ")),
    }
}
