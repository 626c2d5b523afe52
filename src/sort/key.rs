/// Composite ordering-key construction.
///
/// A word decomposes left-to-right into phonetic signatures: one per Han
/// character, one per maximal run of non-Han characters. Each signature
/// maps to a [`Rank`] in a single ordering domain:
///
/// - table ranks for Han signatures (low range, starting at 1)
/// - `FOREIGN_BASE | byte-prefix` for non-Han runs (disjoint high range,
///   so foreign runs collate after every Han signature, ordered among
///   themselves by their leading bytes)
/// - [`MISS_RANK`] for failed Han lookups and for padding
use crate::lookup::{PronunciationLookup, Rank, Signature};

/// Unpadded ordered rank sequence of a word, one rank per signature.
pub type PronunciationKey = Vec<Rank>;

/// Substituted when a Han signature has no table entry, and used as the
/// padding rank. A missed signature therefore sorts exactly like an
/// absent one; the miss itself is reported via `log::warn!`.
pub const MISS_RANK: Rank = 0;

/// High bit marks the disjoint rank range for non-Han runs.
pub const FOREIGN_BASE: Rank = 1 << 63;

/// One sort record: a rank tuple padded to batch-uniform arity with the
/// original word as the trailing payload column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortEntry {
    pub ranks: Vec<Rank>,
    pub word: String,
}

impl SortEntry {
    pub fn new(word: impl Into<String>, ranks: Vec<Rank>) -> Self {
        SortEntry {
            ranks,
            word: word.into(),
        }
    }
}

/// Unified Han ideograph check (URO + extensions + compatibility block).
#[inline]
pub fn is_han(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF         // CJK Unified Ideographs
        | 0x3400..=0x4DBF       // Extension A
        | 0xF900..=0xFAFF       // Compatibility Ideographs
        | 0x20000..=0x2A6DF     // Extension B
        | 0x2A700..=0x2EBEF     // Extensions C-F
    )
}

/// Decompose a word into signatures, consuming it exactly once. Han and
/// non-Han signatures interleave in original left-to-right order.
pub fn segment(word: &str) -> Vec<Signature<'_>> {
    let mut signatures = Vec::with_capacity(word.chars().count());
    let mut foreign_start: Option<usize> = None;
    for (i, c) in word.char_indices() {
        if is_han(c) {
            if let Some(start) = foreign_start.take() {
                signatures.push(Signature::Foreign(&word[start..i]));
            }
            signatures.push(Signature::Han(c));
        } else if foreign_start.is_none() {
            foreign_start = Some(i);
        }
    }
    if let Some(start) = foreign_start {
        signatures.push(Signature::Foreign(&word[start..]));
    }
    signatures
}

/// Number of signatures `segment` would produce, without allocating.
/// Cheap enough for producers to track per-record key arity ahead of any
/// rank lookup.
pub fn signature_count(word: &str) -> usize {
    let mut count = 0;
    let mut in_foreign = false;
    for c in word.chars() {
        if is_han(c) {
            count += 1;
            in_foreign = false;
        } else if !in_foreign {
            count += 1;
            in_foreign = true;
        }
    }
    count
}

/// Deterministic rank for a non-Han run with no explicit table entry:
/// the run's first 7 bytes packed big-endian below FOREIGN_BASE, so u64
/// comparison matches lexicographic byte order. Runs equal in their first
/// 7 bytes tie and fall back to stable input order.
#[inline]
pub fn foreign_rank(run: &str) -> Rank {
    let bytes = run.as_bytes();
    let mut buf = [0u8; 8];
    let n = bytes.len().min(7);
    buf[1..1 + n].copy_from_slice(&bytes[..n]);
    FOREIGN_BASE | u64::from_be_bytes(buf)
}

/// Build the pronunciation key for one word.
///
/// A failed Han lookup is logged and substituted with [`MISS_RANK`];
/// never a stale value, never fatal. Non-Han runs consult the table first
/// (explicit entries may override), then fall back to [`foreign_rank`],
/// a defined mapping, so no miss is reported for them.
pub fn build_key(word: &str, lookup: &dyn PronunciationLookup) -> PronunciationKey {
    segment(word)
        .into_iter()
        .map(|signature| match signature {
            Signature::Han(c) => lookup.rank(signature).unwrap_or_else(|| {
                log::warn!("no pronunciation rank for '{c}' in word '{word}'");
                MISS_RANK
            }),
            Signature::Foreign(run) => lookup.rank(signature).unwrap_or_else(|| foreign_rank(run)),
        })
        .collect()
}

/// Longest rank tuple in the batch; 0 for an empty batch.
pub fn max_arity(entries: &[SortEntry]) -> usize {
    entries.iter().map(|e| e.ranks.len()).max().unwrap_or(0)
}

/// Right-pad every entry's rank tuple with [`MISS_RANK`] to `arity`.
/// An entry already longer than `arity` means the caller's arity tracking
/// is defective; truncating it would silently corrupt the ordering, so it
/// is raised as a malformed batch instead.
pub fn pad_entries(entries: &mut [SortEntry], arity: usize) -> Result<(), crate::SortError> {
    for entry in entries.iter_mut() {
        if entry.ranks.len() > arity {
            return Err(crate::SortError::MalformedBatch {
                expected: arity,
                found: entry.ranks.len(),
            });
        }
        entry.ranks.resize(arity, MISS_RANK);
    }
    Ok(())
}
