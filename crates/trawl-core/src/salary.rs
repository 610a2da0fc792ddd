//! Salary extraction from free text.
//!
//! Currency markers are first rewritten into a uniform `¤CODE` token so the
//! patterns below stay independent of the (extensible) symbol table. The
//! patterns are tried in priority order:
//!
//! 1. ranged hourly rate (`$80-$120/hr`)
//! 2. single hourly rate (`$45/hour`)
//! 3. fixed budget (`Budget: $500`)
//! 4. numeric range carrying a currency marker (`€60,000 - €80,000`)
//! 5. single amount carrying a currency marker (`from 3000 USD`)

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Parsed compensation. `min`/`max` are `None` when nothing was recognised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryInfo {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: String,
    pub is_hourly: bool,
}

impl SalaryInfo {
    fn unparsed(currency: &str) -> Self {
        Self {
            min: None,
            max: None,
            currency: currency.to_string(),
            is_hourly: false,
        }
    }

    /// Compensation from structured bounds. Reversed bounds are swapped and a
    /// single bound fills both ends.
    pub fn from_bounds(
        min: Option<f64>,
        max: Option<f64>,
        currency: impl Into<String>,
        is_hourly: bool,
    ) -> Self {
        let (min, max) = match (min, max) {
            (Some(low), Some(high)) if low > high => (Some(high), Some(low)),
            (Some(low), None) => (Some(low), Some(low)),
            (None, Some(high)) => (Some(high), Some(high)),
            bounds => bounds,
        };
        Self {
            min,
            max,
            currency: currency.into(),
            is_hourly: is_hourly && min.is_some(),
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.min.is_some()
    }
}

const NUM_RAW: &str = r"\d{1,3}(?:[,. \x{a0}]\d{3})+(?:[.,]\d{1,2})?|\d+(?:[.,]\d{1,2})?";
const HOURLY: &str =
    r"(?:/\s*(?:hr|hour|h)\b|per\s+hour|an\s+hour|hourly|/\s*год|за\s+годину|в\s+час)";
const SEP: &str = r"(?:-|–|—|\bto\b|\bдо\b)\s*";

fn cur(name: &str) -> String {
    format!(r"(?:¤(?P<{name}>[A-Z]{{3}})\s*)?")
}

fn num(name: &str, k: &str) -> String {
    format!(r"(?P<{name}>{NUM_RAW})\s*(?P<{k}>k\b)?\s*")
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("salary pattern is valid")
}

static HOURLY_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        "(?i){}{}{}{SEP}{}{}{}{HOURLY}",
        cur("c1"),
        num("n1", "k1"),
        cur("c2"),
        cur("c3"),
        num("n2", "k2"),
        cur("c4"),
    ))
});

static HOURLY_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        "(?i){}{}{}{HOURLY}",
        cur("c1"),
        num("n1", "k1"),
        cur("c2"),
    ))
});

static BUDGET: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)(?:budget|бюджет)[^\d¤]{{0,40}}{}{}{}",
        cur("c1"),
        num("n1", "k1"),
        cur("c2"),
    ))
});

static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        "(?i){}{}{}{SEP}{}{}{}",
        cur("c1"),
        num("n1", "k1"),
        cur("c2"),
        cur("c3"),
        num("n2", "k2"),
        cur("c4"),
    ))
});

static SINGLE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)¤(?P<c1>[A-Z]{{3}})\s*{}|{}¤(?P<c2>[A-Z]{{3}})",
        num("n1", "k1"),
        num("n2", "k2"),
    ))
});

static CODE_WORD: LazyLock<Regex> = LazyLock::new(|| compile(r"\b[A-Za-z]{3}\b"));

/// Salary parser with an extensible currency-marker table.
#[derive(Debug, Clone)]
pub struct SalaryParser {
    /// (symbol, code), matched longest symbol first.
    symbols: Vec<(String, String)>,
    codes: HashSet<String>,
    default_currency: String,
}

impl Default for SalaryParser {
    fn default() -> Self {
        let symbols = [
            ("$", "USD"),
            ("€", "EUR"),
            ("£", "GBP"),
            ("₴", "UAH"),
            ("грн", "UAH"),
            ("zł", "PLN"),
        ];
        let codes = ["USD", "EUR", "GBP", "UAH", "PLN", "CAD", "AUD", "CHF"];
        let mut parser = Self {
            symbols: Vec::new(),
            codes: codes.iter().map(|c| c.to_string()).collect(),
            default_currency: "USD".to_string(),
        };
        for (symbol, code) in symbols {
            parser = parser.with_currency(symbol, code);
        }
        parser
    }
}

impl SalaryParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a currency symbol (or word) mapping to a 3-letter code.
    /// The code itself is also recognised as a literal.
    pub fn with_currency(mut self, symbol: &str, code: &str) -> Self {
        let code = code.to_uppercase();
        self.codes.insert(code.clone());
        self.symbols.push((symbol.to_string(), code));
        self.symbols
            .sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        self
    }

    /// Currency reported when the text names none.
    pub fn with_default_currency(mut self, code: &str) -> Self {
        self.default_currency = code.to_uppercase();
        self
    }

    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    pub fn parse(&self, text: &str) -> SalaryInfo {
        let marked = self.mark_currencies(text);

        if let Some(caps) = HOURLY_RANGE.captures(&marked) {
            if let Some(info) = self.range(&caps, true) {
                return info;
            }
        }
        if let Some(caps) = HOURLY_SINGLE.captures(&marked) {
            if let Some(info) = self.single(&caps, "n1", "k1", &["c1", "c2"], true) {
                return info;
            }
        }
        if let Some(caps) = BUDGET.captures(&marked) {
            if let Some(info) = self.single(&caps, "n1", "k1", &["c1", "c2"], false) {
                return info;
            }
        }
        for caps in RANGE.captures_iter(&marked) {
            if currency_of(&caps, &["c1", "c2", "c3", "c4"]).is_some() {
                if let Some(info) = self.range(&caps, false) {
                    return info;
                }
            }
        }
        if let Some(caps) = SINGLE.captures(&marked) {
            let info = if caps.name("n1").is_some() {
                self.single(&caps, "n1", "k1", &["c1"], false)
            } else {
                self.single(&caps, "n2", "k2", &["c2"], false)
            };
            if let Some(info) = info {
                return info;
            }
        }

        SalaryInfo::unparsed(&self.default_currency)
    }

    /// Rewrite known codes and symbols into `¤CODE` tokens.
    fn mark_currencies(&self, text: &str) -> String {
        let mut marked = CODE_WORD
            .replace_all(text, |caps: &Captures| {
                let word = &caps[0];
                let upper = word.to_uppercase();
                if self.codes.contains(&upper) {
                    format!("¤{upper}")
                } else {
                    word.to_string()
                }
            })
            .into_owned();
        for (symbol, code) in &self.symbols {
            if marked.contains(symbol.as_str()) {
                marked = marked.replace(symbol.as_str(), &format!(" ¤{code} "));
            }
        }
        marked
    }

    fn range(&self, caps: &Captures, hourly: bool) -> Option<SalaryInfo> {
        let low = amount(caps, "n1", "k1")?;
        let high = amount(caps, "n2", "k2")?;
        let currency = currency_of(caps, &["c1", "c2", "c3", "c4"])
            .unwrap_or_else(|| self.default_currency.clone());
        Some(SalaryInfo::from_bounds(Some(low), Some(high), currency, hourly))
    }

    fn single(
        &self,
        caps: &Captures,
        n: &str,
        k: &str,
        currencies: &[&str],
        hourly: bool,
    ) -> Option<SalaryInfo> {
        let value = amount(caps, n, k)?;
        let currency =
            currency_of(caps, currencies).unwrap_or_else(|| self.default_currency.clone());
        Some(SalaryInfo::from_bounds(Some(value), None, currency, hourly))
    }
}

/// Parse with the default marker table and USD as the default currency.
pub fn parse_salary(text: &str) -> SalaryInfo {
    static DEFAULT: LazyLock<SalaryParser> = LazyLock::new(SalaryParser::default);
    DEFAULT.parse(text)
}

fn currency_of(caps: &Captures, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|n| caps.name(n))
        .map(|m| m.as_str().to_uppercase())
}

fn amount(caps: &Captures, n: &str, k: &str) -> Option<f64> {
    let value = parse_amount(caps.name(n)?.as_str())?;
    if caps.name(k).is_some() {
        Some(value * 1000.0)
    } else {
        Some(value)
    }
}

/// Normalise a numeric literal with thousands separators into an `f64`.
///
/// A trailing separator followed by exactly three digits is a thousands
/// separator; any other trailing separator is the decimal point.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    let normalized = match compact.rfind([',', '.']) {
        Some(i) if compact.len() - i - 1 == 3 => compact.replace([',', '.'], ""),
        Some(i) => {
            let (int_part, frac_part) = compact.split_at(i);
            format!("{}.{}", int_part.replace([',', '.'], ""), &frac_part[1..])
        }
        None => compact,
    };
    normalized.parse::<f64>().ok()
}
