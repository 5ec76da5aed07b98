//! Overlapping, boundary-aware text chunking.
//!
//! [`Chunker::chunks`] walks the text left to right and yields [`Chunk`]s
//! lazily. Each chunk is at most `max_len` characters. The cut point is the
//! best boundary inside a lookback window that ends at the `max_len` mark,
//! tried in this order:
//!
//! 1. paragraph break (`\n\n`)
//! 2. line break (`\n`)
//! 3. sentence end (`. `, `! `, `? `)
//! 4. any whitespace
//!
//! If the window contains none of them the chunk is cut hard at `max_len`.
//! The next chunk starts exactly `overlap` characters before the previous
//! chunk's end, so spans never leave a gap and text near a boundary is seen
//! by two chunk summaries.
//!
//! Lengths are counted in `char`s; every span lands on a char boundary.

use crate::error::SummarizeError;

/// Default lookback, in characters, when searching for a split boundary.
pub const DEFAULT_LOOKBACK: usize = 400;

/// A contiguous slice of the normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// 0-indexed position in the chunk sequence.
    pub index: usize,
    /// Byte offset of the first character in the source text.
    pub start: usize,
    /// Byte offset one past the last character in the source text.
    pub end: usize,
    pub text: &'a str,
}

impl Chunk<'_> {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Splits text into overlapping chunks. Pure: same input, same chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    max_len: usize,
    overlap: usize,
    lookback: usize,
}

impl Chunker {
    /// `overlap` must be smaller than `max_len`, and `max_len` must be non-zero.
    pub fn new(max_len: usize, overlap: usize) -> Result<Self, SummarizeError> {
        if max_len == 0 {
            return Err(SummarizeError::InvalidConfig(
                "Chunk size must be ≥ 1".into(),
            ));
        }
        if overlap >= max_len {
            return Err(SummarizeError::InvalidConfig(format!(
                "Chunk overlap ({overlap}) must be smaller than chunk size ({max_len})"
            )));
        }
        Ok(Self {
            max_len,
            overlap,
            lookback: DEFAULT_LOOKBACK,
        })
    }

    /// Change how far back from the `max_len` mark a boundary may be.
    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Lazily split `text`. Empty input yields nothing.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            chunker: *self,
            pos: 0,
            index: 0,
            done: text.is_empty(),
        }
    }
}

/// Iterator returned by [`Chunker::chunks`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    chunker: Chunker,
    pos: usize,
    index: usize,
    done: bool,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Chunk<'a>> {
        if self.done {
            return None;
        }

        let start = self.pos;
        let rest = &self.text[start..];
        let Chunker {
            max_len,
            overlap,
            lookback,
        } = self.chunker;

        // Byte offset (relative to `start`) of each char position up to max_len.
        let offsets: Vec<usize> = rest
            .char_indices()
            .map(|(i, _)| i)
            .take(max_len + 1)
            .collect();

        let end = if offsets.len() <= max_len {
            // Everything left fits.
            self.done = true;
            self.text.len()
        } else {
            // The window ends at char max_len and never reaches back to the
            // overlap, so the next chunk always starts past this one's start.
            let window_start = max_len.saturating_sub(lookback).max(overlap + 1);
            let cut = find_boundary(rest, &offsets, window_start, max_len).unwrap_or(max_len);
            start + offsets[cut]
        };

        let chunk = Chunk {
            index: self.index,
            start,
            end,
            text: &self.text[start..end],
        };
        self.index += 1;

        if !self.done {
            self.pos = back_chars(self.text, end, overlap);
        }

        Some(chunk)
    }
}

/// Character position (relative to the chunk start) just after the best
/// boundary whose end lies in `[window_start, max_len]`.
fn find_boundary(
    rest: &str,
    offsets: &[usize],
    window_start: usize,
    max_len: usize,
) -> Option<usize> {
    let window = &rest[offsets[window_start]..offsets[max_len]];
    let base = offsets[window_start];

    // Byte offset (relative to `rest`) one past the separator.
    let after = |needle: &str| -> Option<usize> {
        window
            .rfind(needle)
            .map(|i| base + i + needle.len())
    };

    let byte_end = after("\n\n")
        .or_else(|| after("\n"))
        .or_else(|| {
            [". ", "! ", "? "]
                .iter()
                .filter_map(|&s| after(s))
                .max()
        })
        .or_else(|| {
            window
                .char_indices()
                .rev()
                .find(|(_, c)| c.is_whitespace())
                .map(|(i, c)| base + i + c.len_utf8())
        })?;

    // Every separator ends on a char boundary inside the window, so the
    // offset is always found and lies past `window_start`.
    offsets.binary_search(&byte_end).ok()
}

/// Byte offset `n` characters before `end`.
fn back_chars(text: &str, end: usize, n: usize) -> usize {
    if n == 0 {
        return end;
    }
    text[..end]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<'a>(chunker: &Chunker, text: &'a str) -> Vec<Chunk<'a>> {
        chunker.chunks(text).collect()
    }

    /// Spans start at 0, end at len, each starts no later than the previous end.
    fn assert_covers(text: &str, chunks: &[Chunk<'_>]) {
        assert_eq!(chunks.first().map(|c| c.start), Some(0));
        assert_eq!(chunks.last().map(|c| c.end), Some(text.len()));
        for pair in chunks.windows(2) {
            assert!(pair[1].start <= pair[0].end, "gap between {:?} and {:?}", pair[0], pair[1]);
            assert!(pair[1].start > pair[0].start, "no progress at {:?}", pair[1]);
        }
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
            assert_eq!(c.text, &text[c.start..c.end]);
        }
    }

    #[test]
    fn empty_input_yields_nothing() {
        let chunker = Chunker::new(100, 10).unwrap();
        assert_eq!(chunker.chunks("").count(), 0);
    }

    #[test]
    fn short_input_yields_one_chunk() {
        let chunker = Chunker::new(100, 10).unwrap();
        let chunks = collect(&chunker, "A short document.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "A short document.");
    }

    #[test]
    fn input_of_exactly_max_len_is_one_chunk() {
        let text = "x".repeat(50);
        let chunker = Chunker::new(50, 5).unwrap();
        assert_eq!(collect(&chunker, &text).len(), 1);
    }

    #[test]
    fn rejects_overlap_not_smaller_than_max_len() {
        assert!(Chunker::new(10, 10).is_err());
        assert!(Chunker::new(10, 11).is_err());
        assert!(Chunker::new(0, 0).is_err());
    }

    #[test]
    fn prefers_sentence_boundary() {
        let text = "First sentence is here. Second sentence follows it. Third one.";
        let chunker = Chunker::new(30, 0).unwrap();
        let chunks = collect(&chunker, text);
        assert_eq!(chunks[0].text, "First sentence is here. ");
        assert_covers(text, &chunks);
    }

    #[test]
    fn prefers_paragraph_over_sentence() {
        let text = "Alpha. Beta.\n\nGamma delta epsilon zeta eta theta.";
        let chunker = Chunker::new(20, 0).unwrap();
        let chunks = collect(&chunker, text);
        assert_eq!(chunks[0].text, "Alpha. Beta.\n\n");
    }

    #[test]
    fn hard_cut_without_boundary() {
        let text = "a".repeat(250);
        let chunker = Chunker::new(100, 10).unwrap();
        let chunks = collect(&chunker, &text);
        assert_eq!(chunks[0].char_len(), 100);
        assert!(chunks.iter().all(|c| c.char_len() <= 100));
        assert_covers(&text, &chunks);
        // 0..100, 90..190, 180..250
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].start, 90);
    }

    #[test]
    fn overlap_is_exact() {
        let text = "word ".repeat(200);
        let chunker = Chunker::new(120, 30).unwrap();
        let chunks = collect(&chunker, &text);
        for pair in chunks.windows(2) {
            let shared = &text[pair[1].start..pair[0].end];
            assert_eq!(shared.chars().count(), 30);
        }
    }

    #[test]
    fn coverage_and_bounds_on_mixed_text() {
        let mut text = String::new();
        for i in 0..300 {
            text.push_str(&format!("Sentence {i} talks about topic {}. ", i % 7));
            if i % 11 == 0 {
                text.push_str("\n\n");
            }
        }
        for (max_len, overlap) in [(200, 20), (500, 100), (2000, 200), (64, 63)] {
            let chunker = Chunker::new(max_len, overlap).unwrap();
            let chunks = collect(&chunker, &text);
            assert_covers(&text, &chunks);
            assert!(chunks.iter().all(|c| c.char_len() <= max_len));
        }
    }

    #[test]
    fn multibyte_text_stays_on_char_boundaries() {
        let text = "Ünïcödé façade — naïve café. ".repeat(40);
        let chunker = Chunker::new(37, 9).unwrap();
        let chunks = collect(&chunker, &text);
        assert_covers(&text, &chunks);
        assert!(chunks.iter().all(|c| c.char_len() <= 37));
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "Lorem ipsum dolor sit amet. ".repeat(120);
        let chunker = Chunker::new(300, 50).unwrap();
        let a: Vec<_> = collect(&chunker, &text);
        let b: Vec<_> = collect(&chunker, &text);
        assert_eq!(a, b);
    }

    #[test]
    fn iterator_is_lazy() {
        let text = "z".repeat(10_000);
        let chunker = Chunker::new(100, 10).unwrap();
        let first_two: Vec<_> = chunker.chunks(&text).take(2).collect();
        assert_eq!(first_two.len(), 2);
        assert_eq!(first_two[1].index, 1);
    }
}
