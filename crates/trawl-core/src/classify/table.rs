/// Ordered keyword rules evaluated top-to-bottom over lower-cased text.
///
/// The first rule with any matching term wins. When nothing matches the
/// table's fallback value is returned, so classification is total.
#[derive(Debug, Clone)]
pub struct KeywordTable<T> {
    rules: Vec<(Vec<String>, T)>,
    fallback: T,
}

impl<T: Copy> KeywordTable<T> {
    pub fn new(fallback: T) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// Append a rule. Rules added earlier take precedence.
    pub fn rule(mut self, terms: &[&str], value: T) -> Self {
        self.rules
            .push((terms.iter().map(|t| t.to_lowercase()).collect(), value));
        self
    }

    /// Add terms to the rule that already yields `value`, or append a new
    /// rule at the lowest priority if there is none.
    pub fn extend(mut self, terms: &[&str], value: T) -> Self
    where
        T: PartialEq,
    {
        let lowered = terms.iter().map(|t| t.to_lowercase());
        match self.rules.iter_mut().find(|(_, v)| *v == value) {
            Some((existing, _)) => existing.extend(lowered),
            None => self.rules.push((lowered.collect(), value)),
        }
        self
    }

    pub fn classify(&self, text: &str) -> T {
        self.classify_or(text, self.fallback)
    }

    /// Classify, returning `default` instead of the fallback when no rule matches.
    pub fn classify_or(&self, text: &str, default: T) -> T {
        self.matching(text).unwrap_or(default)
    }

    /// The value of the first matching rule, if any.
    pub fn matching(&self, text: &str) -> Option<T> {
        let haystack = text.to_lowercase();
        self.rules
            .iter()
            .find(|(terms, _)| terms.iter().any(|t| contains_term(&haystack, t)))
            .map(|(_, value)| *value)
    }
}

/// Whole-term containment: the match must not be glued to alphanumeric
/// characters on either side. Works for any script.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(term) {
        let begin = start + pos;
        let end = begin + term.len();
        let before_ok = haystack[..begin]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = begin
            + haystack[begin..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
    }
    false
}
