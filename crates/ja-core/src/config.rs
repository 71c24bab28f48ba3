use serde::{Deserialize, Serialize};

/// Options recognized by an archiving session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiverConfig {
    /// Indent the rendered JSON. Only the formatter looks at this.
    pub pretty_print: bool,
    /// Simplify root-level output when nothing else refers to a root.
    pub compact_root: bool,
    /// Add `$id` and `$referrers` keys to object nodes.
    pub include_debug_info: bool,
    /// Leave nil-valued fields out of their object instead of writing `null`.
    pub omit_nulls: bool,
    /// Immutable text up to this many chars is written inline.
    pub inline_text_max_chars: usize,
    /// Immutable, self-contained lists up to this many items are written inline.
    pub inline_list_max_items: usize,
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        Self {
            pretty_print: false,
            compact_root: true,
            include_debug_info: false,
            omit_nulls: false,
            inline_text_max_chars: 32,
            inline_list_max_items: 8,
        }
    }
}

impl ArchiverConfig {
    /// Load a (possibly partial) JSON config document.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_pretty_print(mut self, enabled: bool) -> Self {
        self.pretty_print = enabled;
        self
    }

    pub fn with_compact_root(mut self, enabled: bool) -> Self {
        self.compact_root = enabled;
        self
    }

    pub fn with_debug_info(mut self, enabled: bool) -> Self {
        self.include_debug_info = enabled;
        self
    }

    pub fn with_omit_nulls(mut self, enabled: bool) -> Self {
        self.omit_nulls = enabled;
        self
    }

    pub fn with_inline_limits(mut self, text_chars: usize, list_items: usize) -> Self {
        self.inline_text_max_chars = text_chars;
        self.inline_list_max_items = list_items;
        self
    }
}
