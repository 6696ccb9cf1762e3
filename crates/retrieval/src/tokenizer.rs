//! Text tokenization for BM25 indexing and query lookup.
//!
//! The default policy lowercases and splits on whitespace. For script-less
//! languages (no whitespace between words, e.g. Japanese) a segmenter can be
//! plugged in at construction time; when none is available the tokenizer
//! falls back to overlapping character bigrams unioned with the whitespace
//! tokens. The fallback never fails, it only shifts match granularity from
//! word level to bigram level.

/// Word segmenter for languages without whitespace word boundaries.
///
/// Implementations receive lowercased text and return word tokens;
/// whitespace-only tokens are filtered by the caller.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<String>;
}

/// Segmentation policy, selected at construction rather than branched on at
/// every call.
pub enum SegmentMode {
    /// Whitespace tokens only.
    Whitespace,
    /// Whitespace tokens unioned with character bigrams (segmenter
    /// unavailable).
    Bigram,
    /// Whitespace tokens unioned with segmenter output.
    Custom(Box<dyn Segmenter>),
}

/// Maps raw text to tokens for index construction and query lookup.
pub struct Tokenizer {
    mode: SegmentMode,
}

impl Tokenizer {
    /// Language-agnostic default: lowercase, split on whitespace.
    pub fn whitespace() -> Self {
        Self {
            mode: SegmentMode::Whitespace,
        }
    }

    /// Bigram fallback for script-less text without a segmenter.
    pub fn bigram() -> Self {
        Self {
            mode: SegmentMode::Bigram,
        }
    }

    /// Use a language-specific segmenter alongside whitespace tokens.
    pub fn with_segmenter(segmenter: Box<dyn Segmenter>) -> Self {
        Self {
            mode: SegmentMode::Custom(segmenter),
        }
    }

    /// Tokenize text according to the configured mode.
    ///
    /// In whitespace mode tokens keep their multiplicity (term frequencies
    /// are counted downstream). Segmenter and bigram supplements are
    /// deduplicated against the whitespace tokens, preserving first-seen
    /// order.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let text = text.to_lowercase();
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();

        match &self.mode {
            SegmentMode::Whitespace => words,
            SegmentMode::Custom(segmenter) => {
                let segments = segmenter
                    .segment(&text)
                    .into_iter()
                    .filter(|token| !token.trim().is_empty());
                dedup_union(words, segments)
            }
            SegmentMode::Bigram => {
                let stripped: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
                let bigrams = stripped
                    .windows(2)
                    .map(|pair| pair.iter().collect::<String>())
                    .collect::<Vec<_>>();
                dedup_union(words, bigrams)
            }
        }
    }
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.mode {
            SegmentMode::Whitespace => "whitespace",
            SegmentMode::Bigram => "bigram",
            SegmentMode::Custom(_) => "custom",
        };
        f.debug_struct("Tokenizer").field("mode", &mode).finish()
    }
}

/// Union of base tokens and supplements with duplicates collapsed,
/// first-seen order preserved.
fn dedup_union(
    base: impl IntoIterator<Item = String>,
    supplement: impl IntoIterator<Item = String>,
) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    base.into_iter()
        .chain(supplement)
        .filter(|token| seen.insert(token.clone()))
        .collect()
}
