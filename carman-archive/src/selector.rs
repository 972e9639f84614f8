//! Entry selection by wildcard patterns.
//!
//! Patterns use `*` for any run of characters (including none) and `?` for
//! exactly one character. Everything else matches literally and
//! case-sensitively. There is no escaping and no special meaning for `/`.

/// Match `name` against a wildcard `pattern`.
pub fn wildcard_match(name: &str, pattern: &str) -> bool {
    let name: Vec<char> = name.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    match_from(&name, &pattern)
}

fn match_from(name: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => name.is_empty(),
        Some(('*', rest)) => {
            // Only positions where the next literal could start are worth
            // trying.
            let next = rest.first().copied();
            (0..=name.len()).any(|skip| {
                let tail = &name[skip..];
                match next {
                    Some(c) if c != '*' && c != '?' => {
                        tail.first() == Some(&c) && match_from(tail, rest)
                    }
                    _ => match_from(tail, rest),
                }
            })
        }
        Some(('?', rest)) => !name.is_empty() && match_from(&name[1..], rest),
        Some((c, rest)) => name.first() == Some(c) && match_from(&name[1..], rest),
    }
}

/// An ordered list of patterns; a name is selected if any pattern matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSet {
    patterns: Vec<String>,
}

impl SelectorSet {
    /// Build from patterns. No patterns selects everything.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        if patterns.is_empty() {
            Self::all()
        } else {
            Self { patterns }
        }
    }

    /// Select every entry.
    pub fn all() -> Self {
        Self {
            patterns: vec!["*".to_string()],
        }
    }

    /// Whether any pattern matches `name`.
    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| wildcard_match(name, p))
    }

    /// The patterns in order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self::all()
    }
}

impl<S: Into<String>> FromIterator<S> for SelectorSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}
