//! Resolution of free-form dependency names to component keys
//!
//! Analysis output names its dependencies loosely ("Foo", "foo.bar()",
//! "utils::Foo"). A [`DependencyMatcher`] decides whether such a reference
//! names a given component.

use std::fmt;
use std::str::FromStr;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::{Deserialize, Serialize};

use crate::graph::GraphStore;
use crate::model::{ComponentKey, ParseLiteralError};

pub trait DependencyMatcher {
    /// Whether `reference` names the component called `name`.
    fn matches(&self, reference: &str, name: &str) -> bool;

    fn name(&self) -> &'static str;
}

/// Byte-for-byte name equality.
pub struct ExactMatcher;

impl DependencyMatcher for ExactMatcher {
    fn matches(&self, reference: &str, name: &str) -> bool {
        reference == name
    }

    fn name(&self) -> &'static str {
        "exact"
    }
}

/// Case-insensitive: the name contains the reference, or the name is a whole
/// identifier segment of the reference (`models.User`, `utils::User()`).
pub struct SubstringMatcher;

impl DependencyMatcher for SubstringMatcher {
    fn matches(&self, reference: &str, name: &str) -> bool {
        if reference.trim().is_empty() || name.trim().is_empty() {
            return false;
        }
        let reference = reference.to_lowercase();
        let name = name.to_lowercase();
        name.contains(&reference)
            || reference
                .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                .any(|segment| segment == name)
    }

    fn name(&self) -> &'static str {
        "substring"
    }
}

/// Skim scores below this are not a match.
const MIN_FUZZY_SCORE: i64 = 1;

/// Skim-style subsequence scoring.
pub struct FuzzyNameMatcher {
    matcher: SkimMatcherV2,
}

impl FuzzyNameMatcher {
    pub fn new() -> Self {
        Self {
            matcher: SkimMatcherV2::default().ignore_case(),
        }
    }
}

impl Default for FuzzyNameMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyMatcher for FuzzyNameMatcher {
    fn matches(&self, reference: &str, name: &str) -> bool {
        if reference.trim().is_empty() {
            return false;
        }
        self.matcher
            .fuzzy_match(name, reference.trim())
            .is_some_and(|score| score >= MIN_FUZZY_SCORE)
    }

    fn name(&self) -> &'static str {
        "fuzzy"
    }
}

/// Selectable matching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    Exact,
    #[default]
    Substring,
    Fuzzy,
}

impl MatchStrategy {
    pub fn matcher(self) -> Box<dyn DependencyMatcher> {
        match self {
            MatchStrategy::Exact => Box::new(ExactMatcher),
            MatchStrategy::Substring => Box::new(SubstringMatcher),
            MatchStrategy::Fuzzy => Box::new(FuzzyNameMatcher::new()),
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.matcher().name())
    }
}

impl FromStr for MatchStrategy {
    type Err = ParseLiteralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(MatchStrategy::Exact),
            "substring" => Ok(MatchStrategy::Substring),
            "fuzzy" => Ok(MatchStrategy::Fuzzy),
            _ => Err(ParseLiteralError {
                what: "matching strategy",
                literal: s.to_string(),
            }),
        }
    }
}

/// Resolve a reference to component keys.
///
/// A full key that exists wins outright. Otherwise names equal to the
/// reference (ignoring case) are preferred, and only when there are none is
/// every component accepted by `matcher` returned.
pub fn resolve_reference(
    store: &GraphStore,
    reference: &str,
    matcher: &dyn DependencyMatcher,
) -> Vec<ComponentKey> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Vec::new();
    }
    if let Some(node) = store.component(reference) {
        return vec![node.key.clone()];
    }

    let lowered = reference.to_lowercase();
    let exact: Vec<ComponentKey> = store
        .components()
        .filter(|c| c.name.to_lowercase() == lowered)
        .map(|c| c.key.clone())
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    store
        .components()
        .filter(|c| matcher.matches(reference, &c.name))
        .map(|c| c.key.clone())
        .collect()
}
