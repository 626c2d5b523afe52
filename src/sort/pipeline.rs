/// Sharded dedup pipeline for large inputs.
///
/// N producer workers each tokenize one contiguous shard of raw text,
/// suppress duplicates within the shard, and stream first-seen words into
/// their own bounded queue, ending with a `None` sentinel. The aggregator
/// (running on the calling thread, in parallel with all producers) drains
/// every queue fairly, building the global word -> key dedup map with a
/// single writer. There is no shared mutable state between workers beyond
/// the one-directional queues.
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Select, Sender, TryRecvError, bounded};
use rustc_hash::{FxHashMap, FxHashSet};

use super::key::{PronunciationKey, build_key, signature_count};
use crate::SortError;
use crate::lookup::PronunciationLookup;
use crate::tokenize::{RECORD_DELIMITER, Tokenizer};

/// word -> key map built by the aggregator; each word inserted at most
/// once, first-seen wins.
pub type GlobalDedupMap = FxHashMap<String, PronunciationKey>;

/// Queue message: `Some(word)` for a first-seen word, `None` exactly once
/// when the producer's shard is exhausted.
type Message = Option<String>;

/// Minimum producer count for the sharded path.
pub const MIN_PRODUCERS: usize = 3;

/// What one producer hands back after its shard is exhausted.
struct ShardOutput {
    /// Full (non-deduplicated) token sequence of the shard, delimiter
    /// tokens included, for reconstructing ordered record boundaries.
    tokens: Vec<String>,
    /// Maximum key arity of any record in the shard, from pure
    /// segmentation counting; needed later for padding.
    max_arity: usize,
}

/// Combined pipeline result.
pub struct PipelineOutput {
    /// Per-shard token sequences, in shard order.
    pub shard_tokens: Vec<Vec<String>>,
    /// Maximum record key arity across all shards.
    pub max_arity: usize,
    /// Global first-seen dedup map, exclusively aggregator-written.
    pub dedup: GlobalDedupMap,
}

/// Partition `words` into `producers` roughly equal contiguous shard
/// texts, each word terminated by the record delimiter. Zero producers
/// yields zero shards.
pub fn partition_words(words: &[String], producers: usize) -> Vec<String> {
    if producers == 0 {
        return Vec::new();
    }
    let quotient = words.len() / producers;
    let remainder = words.len() % producers;
    let mut shards = Vec::with_capacity(producers);
    let mut start = 0;
    for i in 0..producers {
        let len = quotient + usize::from(i < remainder);
        let mut shard = String::new();
        for word in &words[start..start + len] {
            shard.push_str(word);
            shard.push_str(RECORD_DELIMITER);
        }
        start += len;
        shards.push(shard);
    }
    shards
}

/// Run the producer/aggregator pipeline over pre-partitioned shards.
///
/// Fails with [`SortError::InsufficientParallelism`] before spawning
/// anything if there are fewer than [`MIN_PRODUCERS`] shards, and with
/// [`SortError::WorkerPanicked`] if any producer dies. Each queue holds
/// at most `queue_capacity` pending words (backpressure on the producer).
pub fn run_pipeline(
    shards: Vec<String>,
    tokenizer: Arc<dyn Tokenizer>,
    lookup: &dyn PronunciationLookup,
    queue_capacity: usize,
) -> Result<PipelineOutput, SortError> {
    let producers = shards.len();
    if producers < MIN_PRODUCERS {
        return Err(SortError::InsufficientParallelism {
            available: producers,
            required: MIN_PRODUCERS,
        });
    }

    let mut handles = Vec::with_capacity(producers);
    let mut receivers = Vec::with_capacity(producers);
    for (id, shard) in shards.into_iter().enumerate() {
        let (tx, rx) = bounded(queue_capacity.max(1));
        receivers.push(rx);
        let tokenizer = Arc::clone(&tokenizer);
        handles.push(thread::spawn(move || produce(id, &shard, &*tokenizer, &tx)));
    }

    let dedup = aggregate(&receivers, lookup);

    let mut shard_tokens = Vec::with_capacity(producers);
    let mut max_arity = 0;
    for handle in handles {
        let output = handle
            .join()
            .map_err(|_| SortError::WorkerPanicked("producer"))?;
        max_arity = max_arity.max(output.max_arity);
        shard_tokens.push(output.tokens);
    }

    log::info!("pipeline complete: {} unique words", dedup.len());
    Ok(PipelineOutput {
        shard_tokens,
        max_arity,
        dedup,
    })
}

/// Producer worker body: tokenize one shard, dedup locally, stream
/// first-seen words, then the sentinel.
fn produce(id: usize, shard: &str, tokenizer: &dyn Tokenizer, tx: &Sender<Message>) -> ShardOutput {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut tokens = Vec::new();
    let mut max_arity = 0;
    let mut record_arity = 0;

    for token in tokenizer.tokenize(shard) {
        if token == RECORD_DELIMITER {
            max_arity = max_arity.max(record_arity);
            record_arity = 0;
        } else {
            record_arity += signature_count(&token);
            if !seen.contains(&token) {
                seen.insert(token.clone());
                // Blocks while the queue is full (bounded backpressure);
                // a closed queue means the aggregator is gone, stop early.
                if tx.send(Some(token.clone())).is_err() {
                    break;
                }
            }
        }
        tokens.push(token);
    }
    max_arity = max_arity.max(record_arity);

    let _ = tx.send(None);
    log::info!("producer {id}: {} unique words in shard", seen.len());
    ShardOutput { tokens, max_arity }
}

/// Absorb one queue message. Returns true when it was the sentinel.
fn absorb(message: Message, dedup: &mut GlobalDedupMap, lookup: &dyn PronunciationLookup) -> bool {
    match message {
        Some(word) => {
            if !dedup.contains_key(&word) {
                let key = build_key(&word, lookup);
                dedup.insert(word, key);
            }
            false
        }
        None => true,
    }
}

/// Aggregator loop: fair round-robin `try_recv` over every open queue so
/// no producer's queue fills up while another is quiescent; when a whole
/// round comes up empty, block on `Select` across the open queues instead
/// of spinning. Terminates once all sentinels have been observed.
fn aggregate(receivers: &[Receiver<Message>], lookup: &dyn PronunciationLookup) -> GlobalDedupMap {
    let mut dedup = GlobalDedupMap::default();
    let mut open = vec![true; receivers.len()];
    let mut remaining = receivers.len();

    while remaining > 0 {
        let mut progressed = false;
        for i in 0..receivers.len() {
            if !open[i] {
                continue;
            }
            match receivers[i].try_recv() {
                Ok(message) => {
                    progressed = true;
                    if absorb(message, &mut dedup, lookup) {
                        open[i] = false;
                        remaining -= 1;
                    }
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    // Producer died without a sentinel; the join surfaces it.
                    open[i] = false;
                    remaining -= 1;
                }
            }
        }
        if progressed || remaining == 0 {
            continue;
        }

        let mut select = Select::new();
        let mut indices = Vec::with_capacity(remaining);
        for (i, rx) in receivers.iter().enumerate() {
            if open[i] {
                indices.push(i);
                select.recv(rx);
            }
        }
        let oper = select.select();
        let i = indices[oper.index()];
        match oper.recv(&receivers[i]) {
            Ok(message) => {
                if absorb(message, &mut dedup, lookup) {
                    open[i] = false;
                    remaining -= 1;
                }
            }
            Err(_) => {
                open[i] = false;
                remaining -= 1;
            }
        }
    }

    dedup
}
