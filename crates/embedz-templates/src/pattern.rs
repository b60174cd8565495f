//! Regular expressions for the regex helpers
//!
//! Patterns compile with the `regex` crate first. Look-around and
//! back-references are rejected there, so those fall back to `fancy-regex`.

use std::borrow::Cow;

#[derive(Debug)]
pub(crate) enum Pattern {
    Standard(regex::Regex),
    Extended(fancy_regex::Regex),
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PatternFlags {
    pub ignorecase: bool,
    pub multiline: bool,
}

impl Pattern {
    pub fn compile(pattern: &str, flags: PatternFlags) -> Result<Self, String> {
        let mut prefix = String::new();
        if flags.ignorecase {
            prefix.push_str("(?i)");
        }
        if flags.multiline {
            prefix.push_str("(?m)");
        }
        let source = format!("{}{}", prefix, pattern);

        match regex::Regex::new(&source) {
            Ok(re) => Ok(Pattern::Standard(re)),
            Err(standard_err) => {
                tracing::debug!(pattern = %pattern, error = %standard_err, "falling back to extended regex engine");
                fancy_regex::Regex::new(&source)
                    .map(Pattern::Extended)
                    .map_err(|e| format!("invalid regular expression '{}': {}", pattern, e))
            }
        }
    }

    /// Text of the first match
    pub fn search(&self, text: &str) -> Result<Option<String>, String> {
        match self {
            Pattern::Standard(re) => Ok(re.find(text).map(|m| m.as_str().to_string())),
            Pattern::Extended(re) => re
                .find(text)
                .map(|m| m.map(|m| m.as_str().to_string()))
                .map_err(|e| e.to_string()),
        }
    }

    /// Replace up to `count` matches, all of them when `count` is zero.
    /// `replacement` uses `${1}`/`${name}` group syntax.
    pub fn replace(&self, text: &str, replacement: &str, count: usize) -> Result<String, String> {
        let replaced: Cow<'_, str> = match self {
            Pattern::Standard(re) => re.replacen(text, count, replacement),
            Pattern::Extended(re) => re.replacen(text, count, replacement),
        };
        Ok(replaced.into_owned())
    }

    /// Every match; with one group its text, with several a list per match
    pub fn find_all(&self, text: &str) -> Result<Vec<Vec<String>>, String> {
        let mut found = Vec::new();
        match self {
            Pattern::Standard(re) => {
                let groups = re.captures_len() - 1;
                for caps in re.captures_iter(text) {
                    found.push(collect_groups(groups, |i| {
                        caps.get(i).map(|m| m.as_str().to_string())
                    }));
                }
            }
            Pattern::Extended(re) => {
                let groups = re.captures_len() - 1;
                for caps in re.captures_iter(text) {
                    let caps = caps.map_err(|e| e.to_string())?;
                    found.push(collect_groups(groups, |i| {
                        caps.get(i).map(|m| m.as_str().to_string())
                    }));
                }
            }
        }
        Ok(found)
    }
}

fn collect_groups(groups: usize, get: impl Fn(usize) -> Option<String>) -> Vec<String> {
    if groups == 0 {
        return vec![get(0).unwrap_or_default()];
    }
    (1..=groups).map(|i| get(i).unwrap_or_default()).collect()
}

/// Translate Python-style replacement syntax (`\1`, `\g<name>`, `\\`) to
/// the `${...}` form. A literal `$` is escaped.
pub(crate) fn translate_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() => {
                    let mut group = String::new();
                    while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                        group.push(d);
                        chars.next();
                    }
                    out.push_str(&format!("${{{}}}", group));
                }
                Some('g') => {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    if lookahead.next() == Some('<') {
                        let name: String = lookahead.by_ref().take_while(|&ch| ch != '>').collect();
                        out.push_str(&format!("${{{}}}", name));
                        chars = lookahead;
                    } else {
                        out.push('\\');
                    }
                }
                Some('\\') => {
                    chars.next();
                    out.push('\\');
                }
                Some('n') => {
                    chars.next();
                    out.push('\n');
                }
                Some('t') => {
                    chars.next();
                    out.push('\t');
                }
                _ => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}
