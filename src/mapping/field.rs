//! Field specifications for index mappings.

use serde::{Deserialize, Serialize};

/// Suffix of the implicit unanalyzed sub-field of an analyzed text field.
pub const EXACT_SUFFIX: &str = ".exact";

/// How a field is indexed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// The whole value is indexed as a single term. Exact matching only.
    Keyword,
    /// The value is run through an analyzer and indexed token by token.
    /// The field additionally exposes an unanalyzed `<name>.exact`
    /// sub-field for whole-value matching.
    AnalyzedText,
}

/// A single field declaration within an index mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// The field name.
    name: String,
    /// How the field is indexed.
    kind: FieldKind,
    /// Analyzer name for [`FieldKind::AnalyzedText`] fields. `None` means
    /// the engine default. Handed to the engine at index-creation time,
    /// never at query time.
    analyzer: Option<String>,
}

impl FieldSpec {
    /// Create a keyword field.
    pub fn keyword<S: Into<String>>(name: S) -> Self {
        FieldSpec {
            name: name.into(),
            kind: FieldKind::Keyword,
            analyzer: None,
        }
    }

    /// Create an analyzed text field using the engine's default analyzer.
    pub fn text<S: Into<String>>(name: S) -> Self {
        FieldSpec {
            name: name.into(),
            kind: FieldKind::AnalyzedText,
            analyzer: None,
        }
    }

    /// Set the analyzer for this field.
    pub fn with_analyzer<S: Into<String>>(mut self, analyzer: S) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    /// Get the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the field kind.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Get the analyzer name, if one was declared.
    pub fn analyzer(&self) -> Option<&str> {
        self.analyzer.as_deref()
    }

    /// Check if this field is analyzed text.
    pub fn is_analyzed(&self) -> bool {
        self.kind == FieldKind::AnalyzedText
    }

    /// Name of the sub-field used for whole-value exact matching.
    ///
    /// Keyword fields are already exact, so this is the field itself;
    /// analyzed text fields get the `.exact` suffix.
    pub fn exact_subfield(&self) -> String {
        match self.kind {
            FieldKind::Keyword => self.name.clone(),
            FieldKind::AnalyzedText => format!("{}{}", self.name, EXACT_SUFFIX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_field() {
        let field = FieldSpec::keyword("count");

        assert_eq!(field.name(), "count");
        assert_eq!(field.kind(), FieldKind::Keyword);
        assert!(field.analyzer().is_none());
        assert!(!field.is_analyzed());
        assert_eq!(field.exact_subfield(), "count");
    }

    #[test]
    fn test_text_field_with_analyzer() {
        let field = FieldSpec::text("name").with_analyzer("standard");

        assert_eq!(field.kind(), FieldKind::AnalyzedText);
        assert_eq!(field.analyzer(), Some("standard"));
        assert!(field.is_analyzed());
        assert_eq!(field.exact_subfield(), "name.exact");
    }
}
