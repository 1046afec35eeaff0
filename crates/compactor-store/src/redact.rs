//! Secret redaction applied before anything is archived

use regex::Regex;

pub const REDACTED: &str = "[REDACTED]";

/// Key/value secrets such as `api_key=...` or `password: ...`
pub const DEFAULT_PATTERNS: [&str; 4] = [
    r"(?i)api[_-]?key\s*[:=]\s*\S+",
    r"(?i)password\s*[:=]\s*\S+",
    r"(?i)token\s*[:=]\s*\S+",
    r"(?i)secret\s*[:=]\s*\S+",
];

#[derive(Debug, Clone)]
pub struct Redactor {
    patterns: Vec<Regex>,
}

impl Redactor {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    pub fn with_defaults() -> Result<Self, regex::Error> {
        Self::new(&DEFAULT_PATTERNS)
    }

    pub fn redact(&self, text: &str) -> String {
        self.patterns
            .iter()
            .fold(text.to_string(), |acc, re| re.replace_all(&acc, REDACTED).into_owned())
    }
}
