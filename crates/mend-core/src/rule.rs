//! Ordered replacement rules
//!
//! A [`ReplacementRule`] pairs a literal or regex pattern with a replacement.
//! A [`RuleSet`] applies its edits strictly in order, each one to the result
//! of the previous, and reports which edits changed the text.

use crate::encoding::RepairTable;
use crate::error::RuleError;
use crate::template::FieldRemoval;
use regex::Regex;
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt;

/// What a rule searches for
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact substring
    Literal(String),
    /// Regular expression; replacement may use `$1`-style groups
    Regex(Regex),
}

/// Preconditions on the whole text before a rule may run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guard {
    /// Run only if the text contains this marker
    pub only_if_contains: Option<String>,
    /// Skip if the text contains this marker
    pub skip_if_contains: Option<String>,
}

impl Guard {
    /// Whether the rule may run on `text`
    #[must_use]
    pub fn allows(&self, text: &str) -> bool {
        if let Some(marker) = &self.only_if_contains {
            if !text.contains(marker.as_str()) {
                return false;
            }
        }
        if let Some(marker) = &self.skip_if_contains {
            if text.contains(marker.as_str()) {
                return false;
            }
        }
        true
    }
}

/// A single (pattern, replacement) substitution
#[derive(Debug, Clone)]
pub struct ReplacementRule {
    name: String,
    pattern: Pattern,
    replacement: String,
    guard: Guard,
}

impl ReplacementRule {
    /// Literal substring rule
    ///
    /// # Errors
    /// `RuleError::EmptyPattern` if `pattern` is empty.
    pub fn literal(
        name: impl Into<String>,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Result<Self, RuleError> {
        let name = name.into();
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(RuleError::EmptyPattern(name));
        }
        Ok(Self {
            name,
            pattern: Pattern::Literal(pattern),
            replacement: replacement.into(),
            guard: Guard::default(),
        })
    }

    /// Regex rule
    ///
    /// # Errors
    /// `RuleError::InvalidRegex` if `pattern` does not compile.
    pub fn regex(
        name: impl Into<String>,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, RuleError> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|e| RuleError::invalid_regex(name.clone(), e))?;
        Ok(Self {
            name,
            pattern: Pattern::Regex(regex),
            replacement: replacement.into(),
            guard: Guard::default(),
        })
    }

    /// Require a marker in the text
    #[must_use]
    pub fn only_if_contains(mut self, marker: impl Into<String>) -> Self {
        self.guard.only_if_contains = Some(marker.into());
        self
    }

    /// Skip when a marker is already present
    #[must_use]
    pub fn skip_if_contains(mut self, marker: impl Into<String>) -> Self {
        self.guard.skip_if_contains = Some(marker.into());
        self
    }

    /// Rule name used in reports
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pattern
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Guard
    #[inline]
    #[must_use]
    pub fn guard(&self) -> &Guard {
        &self.guard
    }

    /// Apply to `text`, borrowing when nothing matched
    #[must_use]
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !self.guard.allows(text) {
            return Cow::Borrowed(text);
        }
        match &self.pattern {
            Pattern::Literal(needle) => {
                if text.contains(needle.as_str()) {
                    Cow::Owned(text.replace(needle.as_str(), &self.replacement))
                } else {
                    Cow::Borrowed(text)
                }
            }
            Pattern::Regex(regex) => regex.replace_all(text, self.replacement.as_str()),
        }
    }
}

/// One step of a [`RuleSet`]
#[derive(Debug, Clone)]
pub enum Edit {
    /// Pattern substitution
    Replace(ReplacementRule),
    /// Structural removal of a field line from a concatenated prompt
    RemoveField(FieldRemoval),
    /// Mis-decoding repair table
    Repair(RepairTable),
}

impl Edit {
    /// Name used in reports
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Replace(rule) => rule.name(),
            Self::RemoveField(removal) => removal.name(),
            Self::Repair(_) => "encoding repair",
        }
    }

    /// Apply to `text`
    #[must_use]
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            Self::Replace(rule) => rule.apply(text),
            Self::RemoveField(removal) => removal.apply(text),
            Self::Repair(table) => table.repair(text),
        }
    }
}

impl From<ReplacementRule> for Edit {
    fn from(rule: ReplacementRule) -> Self {
        Self::Replace(rule)
    }
}

impl From<FieldRemoval> for Edit {
    fn from(removal: FieldRemoval) -> Self {
        Self::RemoveField(removal)
    }
}

/// Result of running a rule set over one string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Final text
    pub text: String,
    /// Whether the final text differs from the input
    pub changed: bool,
    /// Names of the edits that modified the text, in application order
    pub fired: Vec<String>,
}

/// Ordered sequence of edits
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    edits: Vec<Edit>,
}

impl RuleSet {
    /// Empty rule set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an edit
    pub fn push(&mut self, edit: impl Into<Edit>) {
        self.edits.push(edit.into());
    }

    /// Append an edit (builder style)
    #[must_use]
    pub fn with(mut self, edit: impl Into<Edit>) -> Self {
        self.push(edit);
        self
    }

    /// Append every edit of `other`, keeping its order
    pub fn extend(&mut self, other: RuleSet) {
        self.edits.extend(other.edits);
    }

    /// Number of edits
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Whether the set has no edits
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Edit names in application order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.edits.iter().map(Edit::name).collect()
    }

    /// Apply every edit in sequence to the accumulated result
    #[must_use]
    pub fn apply(&self, input: &str) -> PatchOutcome {
        let mut text = input.to_string();
        let mut fired = Vec::new();
        for edit in &self.edits {
            let next = match edit.apply(&text) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(next) => next,
            };
            if next != text {
                tracing::debug!(edit = edit.name(), "edit changed text");
                fired.push(edit.name().to_string());
                text = next;
            }
        }
        let changed = text != input;
        PatchOutcome {
            text,
            changed,
            fired,
        }
    }
}

impl FromIterator<Edit> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Edit>>(iter: I) -> Self {
        Self {
            edits: iter.into_iter().collect(),
        }
    }
}

/// Pattern kind in a declarative rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Exact substring
    Literal,
    /// Regular expression
    Regex,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal => f.write_str("literal"),
            Self::Regex => f.write_str("regex"),
        }
    }
}

/// Declarative rule as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    /// Pattern kind
    pub kind: RuleKind,
    /// Optional name; defaults to `<kind>#<index>`
    #[serde(default)]
    pub name: Option<String>,
    /// Pattern text
    pub pattern: String,
    /// Replacement text
    #[serde(default)]
    pub replacement: String,
    /// See [`Guard::only_if_contains`]
    #[serde(default)]
    pub only_if_contains: Option<String>,
    /// See [`Guard::skip_if_contains`]
    #[serde(default)]
    pub skip_if_contains: Option<String>,
}

impl RuleSpec {
    /// Compile into a rule; `index` names unnamed rules
    ///
    /// # Errors
    /// Propagates pattern errors from [`ReplacementRule`] constructors.
    pub fn compile(&self, index: usize) -> Result<ReplacementRule, RuleError> {
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| format!("{}#{index}", self.kind));
        let mut rule = match self.kind {
            RuleKind::Literal => {
                ReplacementRule::literal(name, self.pattern.clone(), self.replacement.clone())?
            }
            RuleKind::Regex => ReplacementRule::regex(name, &self.pattern, self.replacement.clone())?,
        };
        rule.guard = Guard {
            only_if_contains: self.only_if_contains.clone(),
            skip_if_contains: self.skip_if_contains.clone(),
        };
        Ok(rule)
    }
}

/// Compile declarative rules into a rule set, preserving order
///
/// # Errors
/// Fails on the first rule that does not compile.
pub fn compile_specs(specs: &[RuleSpec]) -> Result<RuleSet, RuleError> {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| spec.compile(i).map(Edit::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(from: &str, to: &str) -> ReplacementRule {
        ReplacementRule::literal(from, from, to).unwrap()
    }

    #[test]
    fn literal_rule_borrows_when_absent() {
        let rule = literal("#0033A0", "#14213D");
        assert!(matches!(rule.apply("no colors here"), Cow::Borrowed(_)));
        assert_eq!(rule.apply("a #0033A0 b #0033A0"), "a #14213D b #14213D");
    }

    #[test]
    fn empty_literal_rejected() {
        let err = ReplacementRule::literal("empty", "", "x").unwrap_err();
        assert!(matches!(err, RuleError::EmptyPattern(_)));
    }

    #[test]
    fn regex_rule_expands_groups() {
        let rule = ReplacementRule::regex("swap", r"(\w+)@(\w+)", "$2@$1").unwrap();
        assert_eq!(rule.apply("left@right"), "right@left");
    }

    #[test]
    fn invalid_regex_reports_name() {
        let err = ReplacementRule::regex("bad", "([", "").unwrap_err();
        assert!(matches!(err, RuleError::InvalidRegex { ref name, .. } if name == "bad"));
    }

    #[test]
    fn guards_gate_application() {
        let rule = literal("fetch(url)", "fetch(url, opts)").skip_if_contains("opts");
        assert_eq!(rule.apply("fetch(url)"), "fetch(url, opts)");
        assert_eq!(rule.apply("fetch(url); // opts"), "fetch(url); // opts");

        let rule = literal("colors: {", "font: {}, colors: {").only_if_contains("tailwind.config");
        assert_eq!(rule.apply("colors: {"), "colors: {");
        assert_eq!(
            rule.apply("tailwind.config = { colors: {"),
            "tailwind.config = { font: {}, colors: {"
        );
    }

    #[test]
    fn rule_set_applies_in_order() {
        let set = RuleSet::new()
            .with(literal("a", "b"))
            .with(literal("b", "c"));
        let outcome = set.apply("a");
        assert_eq!(outcome.text, "c");
        assert!(outcome.changed);
        assert_eq!(outcome.fired, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn no_match_reports_unchanged() {
        let set = RuleSet::new().with(literal("missing", "x"));
        let outcome = set.apply("text");
        assert!(!outcome.changed);
        assert!(outcome.fired.is_empty());
        assert_eq!(outcome.text, "text");
    }

    #[test]
    fn identity_replacement_does_not_fire() {
        let set = RuleSet::new().with(literal("festividad", "festividad"));
        let outcome = set.apply("festividad");
        assert!(!outcome.changed);
        assert!(outcome.fired.is_empty());
    }

    #[test]
    fn specs_compile_with_default_names() {
        let specs = vec![
            RuleSpec {
                kind: RuleKind::Literal,
                name: None,
                pattern: "rounded-3xl".into(),
                replacement: "rounded-2xl".into(),
                only_if_contains: None,
                skip_if_contains: None,
            },
            RuleSpec {
                kind: RuleKind::Regex,
                name: Some("digits".into()),
                pattern: r"\d+".into(),
                replacement: "N".into(),
                only_if_contains: None,
                skip_if_contains: Some("skip".into()),
            },
        ];
        let set = compile_specs(&specs).unwrap();
        assert_eq!(set.names(), vec!["literal#0", "digits"]);
        assert_eq!(set.apply("rounded-3xl 42").text, "rounded-2xl N");
        assert_eq!(set.apply("skip 42").text, "skip 42");
    }

    #[derive(Debug, Deserialize)]
    struct Rules {
        rules: Vec<RuleSpec>,
    }

    #[test]
    fn specs_read_from_toml() {
        let parsed: Rules = toml::from_str(
            r#"
rules = [
  { kind = "literal", pattern = "fetch(url)", replacement = "fetch(url, { signal: AbortSignal.timeout(8000) })", skip_if_contains = "AbortSignal" },
  { kind = "regex", name = "radius", pattern = "rounded-(2|3)xl", replacement = "rounded-md" },
]
"#,
        )
        .unwrap();
        assert_eq!(parsed.rules[0].kind, RuleKind::Literal);
        assert_eq!(parsed.rules[0].replacement.matches("AbortSignal").count(), 1);
        assert_eq!(parsed.rules[1].name.as_deref(), Some("radius"));

        let set = compile_specs(&parsed.rules).unwrap();
        let once = set.apply("fetch(url); <div class=\"rounded-3xl\">");
        assert_eq!(
            once.text,
            "fetch(url, { signal: AbortSignal.timeout(8000) }); <div class=\"rounded-md\">"
        );
        assert!(!set.apply(&once.text).changed);
    }

    #[test]
    fn unknown_spec_fields_are_rejected() {
        let err = toml::from_str::<Rules>(r#"rules = [{ kind = "literal", pattern = "a", replace = "b" }]"#)
            .unwrap_err();
        assert!(err.to_string().contains("replace"));
    }
}
