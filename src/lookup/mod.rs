/// Pronunciation lookup: maps phonetic signatures to integer ranks.
///
/// The lookup is an external collaborator: its phonetic algorithm and
/// persistence are not part of this crate. [`RankTable`] is a plain
/// table-backed reference implementation used by the CLI and tests.
use std::io::{self, BufRead};

use rustc_hash::FxHashMap;

/// Ordering position of a signature within the pronunciation domain.
///
/// All key columns share this single domain: table-assigned ranks occupy
/// the low half, non-Chinese runs are mapped into a disjoint high range
/// (see `sort::key::foreign_rank`), and 0 is reserved as the miss/padding
/// sentinel.
pub type Rank = u64;

/// One comparable phonetic unit of a word: a single Han character, or a
/// maximal run of non-Han characters (e.g. a Latin acronym) kept as its
/// literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature<'a> {
    Han(char),
    Foreign(&'a str),
}

/// Maps a phonetic signature to its rank, or `None` when the signature has
/// no entry. Implementations must be shareable across the pipeline's
/// worker threads.
pub trait PronunciationLookup: Send + Sync {
    fn rank(&self, signature: Signature<'_>) -> Option<Rank>;
}

/// In-memory signature table. Stands in for the original dictionary
/// database; persistence beyond the TSV loader is out of scope.
#[derive(Debug, Clone, Default)]
pub struct RankTable {
    ranks: FxHashMap<String, Rank>,
}

impl RankTable {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Rank)>,
        S: Into<String>,
    {
        let ranks = pairs.into_iter().map(|(s, r)| (s.into(), r)).collect();
        RankTable { ranks }
    }

    /// Parse a `SIGNATURE<TAB>RANK` table. Blank lines and `#` comments
    /// are skipped; anything else malformed is an error.
    pub fn from_reader(reader: impl BufRead) -> io::Result<Self> {
        let mut ranks = FxHashMap::default();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (sig, rank) = line.split_once('\t').ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line {}: expected SIGNATURE<TAB>RANK", lineno + 1),
                )
            })?;
            let rank: Rank = rank.trim().parse().map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line {}: invalid rank: {}", lineno + 1, rank),
                )
            })?;
            ranks.insert(sig.to_string(), rank);
        }
        Ok(RankTable { ranks })
    }

    pub fn insert(&mut self, signature: impl Into<String>, rank: Rank) {
        self.ranks.insert(signature.into(), rank);
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

impl PronunciationLookup for RankTable {
    fn rank(&self, signature: Signature<'_>) -> Option<Rank> {
        match signature {
            Signature::Han(c) => {
                let mut buf = [0u8; 4];
                self.ranks.get(c.encode_utf8(&mut buf) as &str).copied()
            }
            Signature::Foreign(run) => self.ranks.get(run).copied(),
        }
    }
}
