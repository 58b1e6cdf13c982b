//! Splicing refinement text into a document.
//!
//! The [`SectionMerger`] trait is the seam between the version store and the
//! strategy that decides *where* a refinement lands. [`AnchorMerger`] is a
//! plain textual splice on the first literal occurrence of a heading string.
//! It does not parse markdown: an anchor inside a code fence matches like any
//! other occurrence, and later occurrences are ignored.

/// Heading the refinement is inserted under by default.
pub const DEFAULT_ANCHOR: &str = "### 2. Complete API Reference";

/// Heading used to delimit a refinement appended when the anchor is missing.
pub const FALLBACK_HEADING: &str = "### Refinement";

/// Result of a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub content: String,
    /// `true` when the anchor was not found and the addition was appended
    /// under [`FALLBACK_HEADING`] instead of spliced in place.
    pub fallback: bool,
}

/// Strategy for folding refinement text into a base document.
pub trait SectionMerger: Send + Sync {
    fn merge(&self, base: &str, addition: &str) -> MergeOutcome;
}

/// Inserts the addition directly below the first occurrence of `anchor`,
/// pushing the anchor's original body down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorMerger {
    anchor: String,
}

impl AnchorMerger {
    pub fn new(anchor: impl Into<String>) -> Self {
        Self { anchor: anchor.into() }
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }
}

impl Default for AnchorMerger {
    fn default() -> Self {
        Self::new(DEFAULT_ANCHOR)
    }
}

impl SectionMerger for AnchorMerger {
    fn merge(&self, base: &str, addition: &str) -> MergeOutcome {
        let addition = addition.trim();

        // An empty anchor would "match" at offset 0; treat it as absent.
        let split = if self.anchor.is_empty() { None } else { base.split_once(self.anchor.as_str()) };

        match split {
            Some((before, after)) => {
                let mut content =
                    String::with_capacity(base.len() + addition.len() + 2);
                content.push_str(before);
                content.push_str(&self.anchor);
                content.push('\n');
                content.push_str(addition);
                if !(after.starts_with('\n') || after.starts_with("\r\n")) {
                    content.push('\n');
                }
                content.push_str(after);
                MergeOutcome { content, fallback: false }
            }
            None => MergeOutcome {
                content: format!("{base}\n\n{FALLBACK_HEADING}\n{addition}"),
                fallback: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "### 1. Intro\n...\n### 2. Complete API Reference\nfoo()\n### 3. Config";

    #[test]
    fn inserts_directly_below_anchor() {
        let out = AnchorMerger::default().merge(DOC, "bar() — does X");
        assert!(!out.fallback);
        assert_eq!(
            out.content,
            "### 1. Intro\n...\n### 2. Complete API Reference\nbar() — does X\nfoo()\n### 3. Config"
        );
    }

    #[test]
    fn trims_only_the_outer_whitespace() {
        let out = AnchorMerger::default().merge(DOC, "\n\n  - a\n    - b  \n\n");
        assert!(out.content.contains("### 2. Complete API Reference\n- a\n    - b\nfoo()"));
        assert!(out.content.len() >= DOC.len() + "- a\n    - b".len());
    }

    #[test]
    fn appends_fallback_section_when_anchor_missing() {
        let base = "### 1. Intro\n...\n### 3. Config";
        let out = AnchorMerger::default().merge(base, "  note \n");
        assert!(out.fallback);
        assert_eq!(out.content, format!("{base}\n\n### Refinement\nnote"));
    }

    #[test]
    fn only_the_first_occurrence_is_used() {
        let base = "A\n```\nANCHOR\n```\nB\nANCHOR\nC";
        let out = AnchorMerger::new("ANCHOR").merge(base, "new");
        assert_eq!(out.content, "A\n```\nANCHOR\nnew\n```\nB\nANCHOR\nC");
    }

    #[test]
    fn anchor_at_end_of_document() {
        let out = AnchorMerger::new("## API").merge("# Doc\n## API", "x()");
        assert_eq!(out.content, "# Doc\n## API\nx()\n");
    }

    #[test]
    fn anchor_followed_by_text_on_same_line() {
        let out = AnchorMerger::new("## API").merge("## API (v2)\nbody", "x()");
        assert_eq!(out.content, "## API\nx()\n (v2)\nbody");
    }

    #[test]
    fn empty_anchor_falls_back() {
        let out = AnchorMerger::new("").merge("doc", "add");
        assert!(out.fallback);
        assert_eq!(out.content, "doc\n\n### Refinement\nadd");
    }
}
