/// Strategy selection and the public sorting entry point.
///
/// Small inputs take the direct single-threaded path: build a key for
/// every occurrence (duplicates preserved), pad, sort. Large inputs take
/// the sharded path: parallel tokenize-and-dedup via the pipeline, key
/// each distinct word once, reconstruct records, sort the unique set.
/// Dedup overhead only pays off when duplicate volume is large, so small
/// inputs skip it.
use std::sync::Arc;
use std::thread;

use rustc_hash::FxHashSet;

use super::key::{PronunciationKey, SortEntry, build_key, max_arity, pad_entries};
use super::pipeline::{MIN_PRODUCERS, partition_words, run_pipeline};
use super::radix::radix_sort;
use crate::SortError;
use crate::lookup::PronunciationLookup;
use crate::tokenize::{LineTokenizer, RECORD_DELIMITER};

/// Input cardinality at or below which the direct path is used.
pub const DIRECT_THRESHOLD: usize = 500_000;

/// Bounded queue capacity per producer.
const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Configuration for a sort operation.
#[derive(Debug, Clone)]
pub struct SortConfig {
    /// Word counts above this use the sharded parallel path.
    pub direct_threshold: usize,
    /// Producer worker count override; `None` derives it from available
    /// parallelism (cores minus one for the aggregator).
    pub producers: Option<usize>,
    /// Capacity of each producer's bounded queue.
    pub queue_capacity: usize,
}

impl Default for SortConfig {
    fn default() -> Self {
        SortConfig {
            direct_threshold: DIRECT_THRESHOLD,
            producers: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Lazy iterator over the sorted output: yields the payload column of
/// each entry without materializing a second word list.
#[derive(Debug)]
pub struct SortedWords {
    inner: std::vec::IntoIter<SortEntry>,
}

impl Iterator for SortedWords {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next().map(|entry| entry.word)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for SortedWords {}

/// Sort `words` into pronunciation order.
///
/// Deterministic for a fixed lookup. Duplicates are preserved on the
/// direct path and collapsed to unique words on the sharded path. Returns
/// the complete ordered sequence or one explicit [`SortError`]; never a
/// partial result.
pub fn sort_words(
    words: &[String],
    lookup: &dyn PronunciationLookup,
    config: &SortConfig,
) -> Result<SortedWords, SortError> {
    if words.len() <= config.direct_threshold {
        sort_direct(words, lookup)
    } else {
        sort_sharded(words, lookup, config)
    }
}

/// Direct path: strictly single-threaded, no deduplication.
fn sort_direct(
    words: &[String],
    lookup: &dyn PronunciationLookup,
) -> Result<SortedWords, SortError> {
    let mut entries: Vec<SortEntry> = words
        .iter()
        .map(|word| SortEntry::new(word.clone(), build_key(word, lookup)))
        .collect();
    let arity = max_arity(&entries);
    pad_entries(&mut entries, arity)?;
    radix_sort(&mut entries, false)?;
    Ok(SortedWords {
        inner: entries.into_iter(),
    })
}

/// Sharded path: pipeline dedup, then sort the unique record set.
fn sort_sharded(
    words: &[String],
    lookup: &dyn PronunciationLookup,
    config: &SortConfig,
) -> Result<SortedWords, SortError> {
    let producers = match config.producers {
        Some(n) => n,
        None => available_producers(),
    };
    // Capacity precheck: atomic failure before any shard is built or any
    // worker launched.
    if producers < MIN_PRODUCERS {
        return Err(SortError::InsufficientParallelism {
            available: producers,
            required: MIN_PRODUCERS,
        });
    }

    let shards = partition_words(words, producers);
    let output = run_pipeline(
        shards,
        Arc::new(LineTokenizer),
        lookup,
        config.queue_capacity,
    )?;

    // Reconstruct records in shard order: concatenate each record's token
    // texts and token keys (from the dedup map), collapsing repeated
    // records to their first occurrence.
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut entries: Vec<SortEntry> = Vec::new();
    let mut word = String::new();
    let mut key = PronunciationKey::new();
    for tokens in &output.shard_tokens {
        for token in tokens {
            if token == RECORD_DELIMITER {
                // Every delimiter closes exactly one record; a bare
                // delimiter is the empty word, which the direct path also
                // emits, so it must survive here too.
                if seen.insert(word.clone()) {
                    entries.push(SortEntry::new(
                        std::mem::take(&mut word),
                        std::mem::take(&mut key),
                    ));
                } else {
                    word.clear();
                    key.clear();
                }
            } else {
                word.push_str(token);
                match output.dedup.get(token.as_str()) {
                    Some(token_key) => key.extend_from_slice(token_key),
                    // Every token passed through a producer, so the map
                    // has it; recompute rather than corrupt the key if a
                    // future tokenizer violates that.
                    None => key.extend(build_key(token, lookup)),
                }
            }
        }
        // A shard always ends on a record boundary, but don't drop the
        // final record if a tokenizer omits the trailing delimiter.
        if !word.is_empty() {
            if seen.insert(word.clone()) {
                entries.push(SortEntry::new(
                    std::mem::take(&mut word),
                    std::mem::take(&mut key),
                ));
            } else {
                word.clear();
                key.clear();
            }
        }
    }
    log::info!("sharded sort: {} unique records", entries.len());

    pad_entries(&mut entries, output.max_arity)?;
    radix_sort(&mut entries, true)?;
    Ok(SortedWords {
        inner: entries.into_iter(),
    })
}

/// Usable producer workers: every core except the one the aggregator
/// occupies.
fn available_producers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}
