//! Pattern-based extraction of URL-like references
//!
//! This module provides the [`Extractor`], the single matcher that decides what
//! counts as a discovered reference. Page scanning and script body scanning
//! both go through it, so a change here changes what every call site reports.
//!
//! The default pattern looks for quoted strings of five shapes, each one a
//! named [`Rule`]:
//!
//! 1. [`Rule::AbsoluteUrl`] - `scheme://host.tld/...` or `//host.tld/...`
//! 2. [`Rule::RelativePath`] - `/path`, `./path` or `../path`
//! 3. [`Rule::FilePath`] - `dir/file.ext` with a 1-4 letter extension or `action`
//! 4. [`Rule::DeepPath`] - `dir/segment` with at least three trailing characters
//! 5. [`Rule::Filename`] - `name.ext` for a fixed set of extensions
//!
//! # Examples
//!
//! ```ignore
//! use linkfinder::Extractor;
//!
//! let extractor = Extractor::default();
//! let found = extractor.extract(r#"fetch("/api/v1/users")"#);
//! assert_eq!(found, vec!["\"/api/v1/users\""]);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// File extensions recognised by [`Rule::Filename`]
pub const FILENAME_EXTENSIONS: [&str; 10] = [
    "php", "asp", "aspx", "jsp", "json", "action", "html", "js", "txt", "xml",
];

const QUOTE: &str = r#"(?:"|')"#;

/// Optional `?query` or `#fragment` tail shared by the path-like rules
const SUFFIX: &str = r#"(?:[\?|#][^"|']*)?"#;

static DEFAULT_EXTRACTOR: Lazy<Extractor> = Lazy::new(|| {
    Extractor::from_rules(&Rule::ALL).expect("Built-in extraction pattern should compile")
});

/// One alternative shape of the reference pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Absolute URL with a scheme or protocol-relative `//` prefix
    AbsoluteUrl,
    /// Path starting with `/`, `./` or `../`
    RelativePath,
    /// Path with at least one `/` ending in a short extension or `action`
    FilePath,
    /// Path with at least one `/` and three or more trailing characters
    DeepPath,
    /// Bare filename ending in one of [`FILENAME_EXTENSIONS`]
    Filename,
}

impl Rule {
    /// All rules, in the order they are tried
    pub const ALL: [Rule; 5] = [
        Rule::AbsoluteUrl,
        Rule::RelativePath,
        Rule::FilePath,
        Rule::DeepPath,
        Rule::Filename,
    ];

    /// Name of the capture group holding this rule's match
    pub fn group_name(self) -> &'static str {
        match self {
            Rule::AbsoluteUrl => "absolute",
            Rule::RelativePath => "relative",
            Rule::FilePath => "file_path",
            Rule::DeepPath => "deep_path",
            Rule::Filename => "filename",
        }
    }

    /// Regex source for this rule, without the surrounding quotes
    pub fn pattern(self) -> String {
        match self {
            Rule::AbsoluteUrl => r#"(?:[a-zA-Z]{1,10}://|//)[^"'/]+\.[a-zA-Z]{2,}[^"']*"#.to_string(),
            Rule::RelativePath => {
                r#"(?:/|\.\./|\./)[^"'><,;| *()(%%$^/\\\[\]][^"'><,;|()]+"#.to_string()
            }
            Rule::FilePath => format!(
                r#"[a-zA-Z0-9_\-/]+/[a-zA-Z0-9_\-/]+\.(?:[a-zA-Z]{{1,4}}|action){SUFFIX}"#
            ),
            Rule::DeepPath => format!(r#"[a-zA-Z0-9_\-/]+/[a-zA-Z0-9_\-/]{{3,}}{SUFFIX}"#),
            Rule::Filename => format!(
                r#"[a-zA-Z0-9_\-]+\.(?:{}){SUFFIX}"#,
                FILENAME_EXTENSIONS.join("|")
            ),
        }
    }
}

/// A single match together with the rule that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMatch {
    /// The matched text, including its enclosing quotes
    pub value: String,
    /// The rule that matched, or `None` for custom patterns
    pub rule: Option<Rule>,
}

/// Matcher for URL-like and path-like references in arbitrary text
///
/// Cloning is cheap: the compiled regex is reference counted internally.
#[derive(Debug, Clone)]
pub struct Extractor {
    regex: Regex,
    rules: Vec<Rule>,
}

impl Extractor {
    /// Build an extractor from a subset of the built-in rules
    ///
    /// Rules are tried in the order given.
    pub fn from_rules(rules: &[Rule]) -> Result<Self, regex::Error> {
        let alternatives = rules
            .iter()
            .map(|rule| format!("(?P<{}>{})", rule.group_name(), rule.pattern()))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&format!("{QUOTE}(?:{alternatives}){QUOTE}"))?;

        Ok(Self {
            regex,
            rules: rules.to_vec(),
        })
    }

    /// Build an extractor that only knows a single rule
    pub fn for_rule(rule: Rule) -> Self {
        // Every built-in rule compiles on its own as part of the default pattern
        Self::from_rules(&[rule]).expect("Built-in rule should compile")
    }

    /// Build an extractor from a custom pattern
    ///
    /// Matches produced by a custom pattern carry no [`Rule`].
    pub fn with_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            rules: Vec::new(),
        })
    }

    /// Shared instance of the built-in pattern
    pub fn shared() -> &'static Extractor {
        &DEFAULT_EXTRACTOR
    }

    /// Return every non-overlapping match in order of appearance
    pub fn extract(&self, text: &str) -> Vec<String> {
        self.regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Like [`extract`](Self::extract), but report which rule matched
    pub fn extract_with_rules(&self, text: &str) -> Vec<ExtractedMatch> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let rule = self
                    .rules
                    .iter()
                    .copied()
                    .find(|rule| caps.name(rule.group_name()).is_some());
                Some(ExtractedMatch {
                    value: whole.as_str().to_string(),
                    rule,
                })
            })
            .collect()
    }

    /// The regex source this extractor runs
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for Extractor {
    fn default() -> Self {
        DEFAULT_EXTRACTOR.clone()
    }
}
