//! Structured content errors and extension-based handler selection

use crate::Error;

/// Result type for structured reads and writes
pub type ContentResult<T> = std::result::Result<T, ContentError>;

/// Failures of [`File::read_structured`](crate::File::read_structured) and
/// [`File::write_structured`](crate::File::write_structured).
///
/// Parse failures are kept apart from storage failures so callers can offer
/// to repair or recreate a malformed document instead of generic storage
/// troubleshooting.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error(transparent)]
    Storage(#[from] Error),

    #[error("Malformed JSON in \"{path}\": {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize content for \"{path}\": {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ContentError {
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Kind of content handler a consumer should open a file with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Graphviz source, rendered as a graph
    Graph,
    /// A JSON circuit netlist, rendered as a schematic
    Circuit,
    /// Verilog source; plain text plus synthesis and place-and-route actions
    Verilog,
    /// Anything else is edited as plain text
    Text,
}

impl ContentKind {
    /// Pick a handler from an entry's extension.
    ///
    /// The extension is matched exactly as reported by `extension()`, so a
    /// name like `"top.tb.v"` reports `"tb.v"` and falls back to `Text`.
    pub fn for_extension(extension: &str) -> Self {
        match extension {
            "dot" => Self::Graph,
            "json" => Self::Circuit,
            "v" => Self::Verilog,
            _ => Self::Text,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Circuit => "circuit",
            Self::Verilog => "verilog",
            Self::Text => "text",
        }
    }

    /// Whether synthesis tooling can be launched on this content.
    pub fn supports_synthesis(self) -> bool {
        matches!(self, Self::Verilog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("dot", ContentKind::Graph)]
    #[case("json", ContentKind::Circuit)]
    #[case("v", ContentKind::Verilog)]
    #[case("tb.v", ContentKind::Text)]
    #[case("README", ContentKind::Text)]
    fn handler_selected_by_exact_extension(#[case] ext: &str, #[case] expected: ContentKind) {
        assert_eq!(ContentKind::for_extension(ext), expected);
    }

    #[test]
    fn only_verilog_supports_synthesis() {
        assert!(ContentKind::Verilog.supports_synthesis());
        assert!(!ContentKind::Text.supports_synthesis());
        assert!(!ContentKind::Circuit.supports_synthesis());
    }

    #[test]
    fn parse_error_is_distinct_from_storage_error() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let parse = ContentError::Parse {
            path: "a.json".into(),
            source,
        };
        let storage = ContentError::from(Error::RootDeletion);

        assert!(parse.is_parse());
        assert!(!storage.is_parse());
    }
}
