// Regex search over task fields.
//
// A user pattern is compiled once per search pass into an immutable
// `CompiledMatcher`. Scanning never stores a position on the matcher: every
// call to `find_all_spans` walks a fresh `SpanIter`, so two fields (or two
// threads) can be scanned with the same matcher without interfering.
//
// Patterns use the backtracking dialect of `fancy_regex`, so lookaround
// (`(?=.*exam)(?=.*math)`) and backreferences work. Scanning can therefore
// fail at run time (backtrack limit); callers decide how to degrade.
//
// Highlighting renders HTML-safe markup: every run of the original text is
// escaped, matched runs are wrapped in `<mark>`.

use fancy_regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Raised when a pattern does not compile. The message is the regex engine's
/// diagnostic, untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid regex: {message}")]
pub struct CompileError {
    pub message: String,
}

impl From<fancy_regex::Error> for CompileError {
    fn from(err: fancy_regex::Error) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Raised when a compiled pattern gives up while scanning a text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Regex scan failed: {message}")]
pub struct ScanError {
    pub message: String,
}

impl From<fancy_regex::Error> for ScanError {
    fn from(err: fancy_regex::Error) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    regex: Regex,
    case_sensitive: bool,
}

impl CompiledMatcher {
    /// Source text of the pattern this matcher was built from.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

/// One match occurrence, as byte offsets into the scanned text.
/// Both offsets always fall on `char` boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

impl MatchSpan {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Compiles `pattern`. Matching ignores case unless `case_sensitive` is set.
pub fn compile(pattern: &str, case_sensitive: bool) -> Result<CompiledMatcher, CompileError> {
    build(pattern, case_sensitive, None)
}

fn build(
    pattern: &str,
    case_sensitive: bool,
    backtrack_limit: Option<usize>,
) -> Result<CompiledMatcher, CompileError> {
    let mut builder = RegexBuilder::new(pattern);
    builder.case_insensitive(!case_sensitive);
    if let Some(limit) = backtrack_limit {
        builder.backtrack_limit(limit);
    }
    let regex = builder.build()?;
    Ok(CompiledMatcher {
        regex,
        case_sensitive,
    })
}

/// Like `compile`, but an empty pattern means "no filter" and yields `None`
/// without touching the regex engine.
pub fn compile_query(
    pattern: &str,
    case_sensitive: bool,
) -> Result<Option<CompiledMatcher>, CompileError> {
    if pattern.is_empty() {
        return Ok(None);
    }
    compile(pattern, case_sensitive).map(Some)
}

/// True if `text` contains a match. A scan that fails counts as no match.
pub fn matches_any(matcher: &CompiledMatcher, text: &str) -> bool {
    matcher.regex.is_match(text).unwrap_or_else(|e| {
        log::debug!("Scan of /{}/ failed: {}", matcher.as_str(), e);
        false
    })
}

/// Iterator over every non-overlapping match, left to right.
///
/// After a zero-length match the scan resumes one `char` past the match
/// start; the skipped `char` counts as unmatched text. This bounds the number
/// of steps to `text.chars().count() + 1`. A scan error ends the iteration.
pub struct SpanIter<'m, 't> {
    regex: &'m Regex,
    text: &'t str,
    pos: usize,
    done: bool,
}

impl<'m, 't> SpanIter<'m, 't> {
    pub fn new(matcher: &'m CompiledMatcher, text: &'t str) -> Self {
        Self {
            regex: &matcher.regex,
            text,
            pos: 0,
            done: false,
        }
    }
}

impl Iterator for SpanIter<'_, '_> {
    type Item = Result<MatchSpan, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let m = match self.regex.find_from_pos(self.text, self.pos) {
            Ok(Some(m)) => m,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(e.into()));
            }
        };

        if m.start() == m.end() {
            match self.text[m.end()..].chars().next() {
                Some(c) => self.pos = m.end() + c.len_utf8(),
                None => self.done = true,
            }
        } else {
            self.pos = m.end();
        }

        Some(Ok(MatchSpan {
            start: m.start(),
            end: m.end(),
        }))
    }
}

pub fn find_all_spans(matcher: &CompiledMatcher, text: &str) -> Result<Vec<MatchSpan>, ScanError> {
    SpanIter::new(matcher, text).collect()
}

/// Renders `text` as markup with every match wrapped in `<mark>`.
///
/// With no matcher the text is only escaped. Zero-length matches produce an
/// empty `<mark></mark>`; empty text stays empty. Should the scan fail or the
/// spans not line up with the text, the escaped text is returned
/// unhighlighted; this never fails.
pub fn highlight(matcher: Option<&CompiledMatcher>, text: &str) -> String {
    let Some(matcher) = matcher else {
        return escape_html(text);
    };
    if text.is_empty() {
        return String::new();
    }

    let spans = match find_all_spans(matcher, text) {
        Ok(spans) => spans,
        Err(e) => {
            log::debug!("{} for /{}/, rendering plain", e, matcher.as_str());
            return escape_html(text);
        }
    };
    match render_marked(text, &spans) {
        Some(markup) => markup,
        None => {
            log::debug!(
                "Highlight spans for /{}/ did not fit the text, rendering plain",
                matcher.as_str()
            );
            escape_html(text)
        }
    }
}

fn render_marked(text: &str, spans: &[MatchSpan]) -> Option<String> {
    let mut out = String::with_capacity(text.len() + spans.len() * 13);
    let mut last = 0;

    for span in spans {
        if span.start < last || span.end < span.start {
            return None;
        }
        escape_into(&mut out, text.get(last..span.start)?);
        out.push_str("<mark>");
        escape_into(&mut out, text.get(span.start..span.end)?);
        out.push_str("</mark>");
        last = span.end;
    }

    escape_into(&mut out, text.get(last..)?);
    Some(out)
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(&mut out, text);
    out
}

/// Inverse of `escape_html`.
pub fn unescape_html(markup: &str) -> String {
    markup
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchExample {
    pub pattern: &'static str,
    pub description: &'static str,
}

/// Patterns offered as hints next to the search box.
pub const SEARCH_EXAMPLES: &[SearchExample] = &[
    SearchExample {
        pattern: "^@homework",
        description: "Tasks starting with @homework",
    },
    SearchExample {
        pattern: "study|review",
        description: "Tasks containing \"study\" OR \"review\"",
    },
    SearchExample {
        pattern: r"\d{2}:\d{2}",
        description: "Tasks with time patterns (14:30)",
    },
    SearchExample {
        pattern: r"\b(\w+)\s+\1\b",
        description: "Detect duplicate words (back-reference)",
    },
    SearchExample {
        pattern: "(?=.*exam)(?=.*math)",
        description: "Tasks with both \"exam\" AND \"math\" (lookahead)",
    },
];
