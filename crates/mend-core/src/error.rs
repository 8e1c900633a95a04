//! Error types for rule construction and text decoding
//!
//! Provides error handling for:
//! - Rule compilation (invalid regex, unknown preset)
//! - Text decoding (bytes → UTF-8 string)

/// Errors while building replacement rules
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Regex pattern failed to compile
    #[error("invalid regex in rule '{name}': {source}")]
    InvalidRegex {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// Literal rule with an empty pattern
    #[error("rule '{0}' has an empty pattern")]
    EmptyPattern(String),

    /// No built-in rule set with this name
    #[error("unknown preset: '{0}'")]
    UnknownPreset(String),

    /// Field name unusable for template edits
    #[error("invalid field name for template edit: '{0}'")]
    InvalidField(String),
}

impl RuleError {
    /// Create invalid regex error for rule
    pub fn invalid_regex(name: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidRegex {
            name: name.into(),
            source,
        }
    }
}

/// Errors while decoding file bytes into text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Bytes are not valid UTF-8
    #[error("invalid UTF-8 after {valid_up_to} bytes")]
    InvalidUtf8 { valid_up_to: usize },

    /// UTF-16 payload with an odd number of bytes
    #[error("UTF-16 payload has odd length {0}")]
    OddUtf16Length(usize),

    /// Unpaired surrogate in UTF-16 payload
    #[error("invalid UTF-16 ({0}) payload")]
    InvalidUtf16(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_error_display() {
        let err = RuleError::UnknownPreset("nope".to_string());
        assert_eq!(err.to_string(), "unknown preset: 'nope'");
    }

    #[test]
    fn invalid_regex_carries_rule_name() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = RuleError::invalid_regex("broken", source);
        assert!(err.to_string().starts_with("invalid regex in rule 'broken'"));
    }

    #[test]
    fn decode_error_display() {
        let err = DecodeError::InvalidUtf8 { valid_up_to: 3 };
        assert_eq!(err.to_string(), "invalid UTF-8 after 3 bytes");
    }
}
