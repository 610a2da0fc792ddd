//! Ordered CSS selector fallbacks.
//!
//! Source markup changes without notice, so every structural lookup is an
//! ordered list of alternative selectors. [`SelectorCascade::resolve`]
//! returns the nodes of the first pattern that matches anything; results of
//! different patterns are never merged.

use scraper::{ElementRef, Html, Selector};

use crate::error::AppError;
use crate::util::normalize_whitespace;

#[derive(Debug, Clone)]
pub struct SelectorCascade {
    patterns: Vec<(String, Selector)>,
}

/// Nodes matched by one pattern of a cascade.
#[derive(Debug, Clone)]
pub struct Resolved<'a> {
    /// Position of the winning pattern in the cascade.
    pub pattern_index: usize,
    pub nodes: Vec<ElementRef<'a>>,
}

impl SelectorCascade {
    /// Compile a cascade. Any invalid pattern rejects the whole cascade.
    pub fn parse(patterns: &[&str]) -> Result<Self, AppError> {
        let patterns = patterns
            .iter()
            .map(|raw| {
                Selector::parse(raw)
                    .map(|sel| (raw.to_string(), sel))
                    .map_err(|e| AppError::ConfigError(format!("invalid selector `{raw}`: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// A cascade that never matches.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(raw, _)| raw.as_str())
    }

    /// Descendants of `root` matched by the first productive pattern.
    pub fn resolve<'a>(&self, root: ElementRef<'a>) -> Option<Resolved<'a>> {
        self.patterns
            .iter()
            .enumerate()
            .find_map(|(pattern_index, (_, sel))| {
                let nodes: Vec<_> = root.select(sel).collect();
                (!nodes.is_empty()).then_some(Resolved {
                    pattern_index,
                    nodes,
                })
            })
    }

    pub fn resolve_document<'a>(&self, doc: &'a Html) -> Option<Resolved<'a>> {
        self.resolve(doc.root_element())
    }

    /// Whether any pattern matches under `root`.
    pub fn matches(&self, root: ElementRef<'_>) -> bool {
        self.patterns
            .iter()
            .any(|(_, sel)| root.select(sel).next().is_some())
    }

    /// Whitespace-normalized text of the first matched node that has any.
    ///
    /// Patterns are tried in order; a pattern whose nodes are all blank
    /// falls through to the next one.
    pub fn first_text(&self, root: ElementRef<'_>) -> Option<String> {
        self.patterns.iter().find_map(|(_, sel)| {
            root.select(sel)
                .map(element_text)
                .find(|text| !text.is_empty())
        })
    }

    /// Trimmed value of `attr` on the first matched node carrying it.
    pub fn first_attr(&self, root: ElementRef<'_>, attr: &str) -> Option<String> {
        self.patterns.iter().find_map(|(_, sel)| {
            root.select(sel)
                .filter_map(|el| el.value().attr(attr))
                .map(str::trim)
                .find(|v| !v.is_empty())
                .map(str::to_string)
        })
    }

    /// Non-blank texts of every node of the first productive pattern.
    pub fn all_texts(&self, root: ElementRef<'_>) -> Vec<String> {
        self.resolve(root)
            .map(|resolved| {
                resolved
                    .nodes
                    .into_iter()
                    .map(element_text)
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Whitespace-normalized text content of an element.
pub fn element_text(el: ElementRef<'_>) -> String {
    normalize_whitespace(&el.text().collect::<String>())
}
