use std::sync::Arc;

use proptest::prelude::*;

use super::core::*;
use super::key::*;
use super::pipeline::*;
use super::radix::*;
use crate::lookup::{PronunciationLookup, RankTable, Signature};
use crate::tokenize::{LineTokenizer, RECORD_DELIMITER, Tokenizer};
use crate::SortError;

/// Fixture table: ranks follow pinyin order of the characters used below.
fn table() -> RankTable {
    RankTable::from_pairs([
        ("好", 2u64),
        ("河", 3),
        ("流", 4),
        ("民", 5),
        ("你", 6),
        ("尼", 6), // heteronym-free homophone of 你 for tie tests
        ("群", 7),
        ("人", 8),
        ("水", 9),
    ])
}

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn sharded_config() -> SortConfig {
    SortConfig {
        direct_threshold: 0,
        producers: Some(3),
        queue_capacity: 4,
    }
}

fn sort(input: &[&str], config: &SortConfig) -> Vec<String> {
    sort_words(&words(input), &table(), config).unwrap().collect()
}

#[test]
fn test_segment_interleaves_scripts() {
    let sigs = segment("WTO世贸");
    assert_eq!(
        sigs,
        vec![
            Signature::Foreign("WTO"),
            Signature::Han('世'),
            Signature::Han('贸'),
        ]
    );

    let sigs = segment("a你b");
    assert_eq!(
        sigs,
        vec![
            Signature::Foreign("a"),
            Signature::Han('你'),
            Signature::Foreign("b"),
        ]
    );
}

#[test]
fn test_signature_count_matches_segment() {
    for word in ["你好", "WTO世贸组织", "abc", "", "你a好b"] {
        assert_eq!(signature_count(word), segment(word).len(), "word: {word}");
    }
}

#[test]
fn test_padding_correctness() {
    // rank(你)=6, rank(好)=2: keys (6,2) and (2,), padded (2,0).
    // Column 0 then column 1: 2 < 6 puts 好 first.
    let sorted = sort(&["你好", "好"], &SortConfig::default());
    assert_eq!(sorted, words(&["好", "你好"]));

    let mut entries = vec![
        SortEntry::new("你好", build_key("你好", &table())),
        SortEntry::new("好", build_key("好", &table())),
    ];
    let arity = max_arity(&entries);
    pad_entries(&mut entries, arity).unwrap();
    assert_eq!(entries[0].ranks, vec![6, 2]);
    assert_eq!(entries[1].ranks, vec![2, MISS_RANK]);
}

#[test]
fn test_lookup_miss_substitutes_sentinel() {
    // 咕 has no table entry: rank 0 sorts before every known character.
    let key = build_key("咕好", &table());
    assert_eq!(key, vec![MISS_RANK, 2]);

    let sorted = sort(&["好", "咕"], &SortConfig::default());
    assert_eq!(sorted, words(&["咕", "好"]));
}

#[test]
fn test_foreign_runs_collate_after_han() {
    let sorted = sort(&["WTO", "人", "ABC"], &SortConfig::default());
    assert_eq!(sorted, words(&["人", "ABC", "WTO"]));
}

#[test]
fn test_foreign_rank_prefix_order() {
    assert!(foreign_rank("ABC") < foreign_rank("ABD"));
    assert!(foreign_rank("AB") < foreign_rank("ABC"));
    assert!(foreign_rank("z") > foreign_rank("a"));
    // Disjoint high range
    assert!(foreign_rank("A") > 1_000_000_000);
}

#[test]
fn test_table_entry_overrides_foreign_rank() {
    let mut table = table();
    table.insert("WTO", 1);
    let sorted: Vec<String> = sort_words(&words(&["人", "WTO"]), &table, &SortConfig::default())
        .unwrap()
        .collect();
    assert_eq!(sorted, words(&["WTO", "人"]));
}

#[test]
fn test_direct_preserves_duplicates() {
    let sorted = sort(&["人", "好", "人"], &SortConfig::default());
    assert_eq!(sorted, words(&["好", "人", "人"]));
}

#[test]
fn test_tie_break_preserves_input_order() {
    // 你 and 尼 share rank 6: stable passes keep input order.
    let sorted = sort(&["你", "尼"], &SortConfig::default());
    assert_eq!(sorted, words(&["你", "尼"]));
    let sorted = sort(&["尼", "你"], &SortConfig::default());
    assert_eq!(sorted, words(&["尼", "你"]));
}

#[test]
fn test_idempotence() {
    let once = sort(&["人群", "河水", "人", "河流", "WTO世贸"], &SortConfig::default());
    let inputs: Vec<String> = once.clone();
    let twice: Vec<String> = sort_words(&inputs, &table(), &SortConfig::default())
        .unwrap()
        .collect();
    assert_eq!(once, twice);
}

#[test]
fn test_empty_input() {
    let sorted = sort(&[], &SortConfig::default());
    assert!(sorted.is_empty());
}

#[test]
fn test_strategy_equivalence() {
    // Deduplicated input, threshold forced to 0 so the same words run
    // through both paths.
    let input = ["人群", "河水", "人", "河流", "好", "你好", "WTO世贸"];
    let direct = sort(&input, &SortConfig::default());
    let sharded = sort(&input, &sharded_config());
    assert_eq!(direct, sharded);
}

#[test]
fn test_sharded_collapses_duplicates() {
    let mut input: Vec<String> = Vec::new();
    for _ in 0..1000 {
        input.push("人".to_string());
    }
    input.push("好".to_string());
    input.push("河".to_string());
    let sorted: Vec<String> = sort_words(&input, &table(), &sharded_config())
        .unwrap()
        .collect();
    assert_eq!(sorted, words(&["好", "河", "人"]));
}

#[test]
fn test_pipeline_dedup_map_single_entry() {
    let input: Vec<String> = std::iter::repeat_n("人".to_string(), 1000).collect();
    let shards = partition_words(&input, 4);
    let table = table();
    let output = run_pipeline(shards, Arc::new(LineTokenizer), &table, 8).unwrap();
    assert_eq!(output.dedup.len(), 1);
    assert_eq!(output.dedup["人"], vec![8]);
    assert_eq!(output.max_arity, 1);
}

#[test]
fn test_insufficient_parallelism_fails_fast() {
    let config = SortConfig {
        direct_threshold: 0,
        producers: Some(2),
        queue_capacity: 4,
    };
    let err = sort_words(&words(&["人", "好"]), &table(), &config).unwrap_err();
    assert!(matches!(
        err,
        SortError::InsufficientParallelism {
            available: 2,
            required: 3,
        }
    ));
}

#[test]
fn test_malformed_batch_detected() {
    let mut entries = vec![
        SortEntry::new("好", vec![2, 0]),
        SortEntry::new("你好", vec![6, 2, 9]),
    ];
    let err = radix_sort(&mut entries, false).unwrap_err();
    assert!(matches!(
        err,
        SortError::MalformedBatch {
            expected: 2,
            found: 3,
        }
    ));
}

#[test]
fn test_empty_word_survives_both_paths() {
    // An empty word becomes a bare delimiter in the shard text; the
    // sharded reconstruction must still emit it as a record, matching
    // the direct path.
    let input = ["", "好", "人"];
    let direct = sort(&input, &SortConfig::default());
    assert_eq!(direct, words(&["", "好", "人"]));
    let sharded = sort(&input, &sharded_config());
    assert_eq!(direct, sharded);
}

#[test]
fn test_radix_sort_parallel_matches_sequential() {
    // Above the parallel threshold, both pass modes must produce the
    // same stable ordering.
    let mut state: u64 = 7;
    let mut entries: Vec<SortEntry> = (0..12_000)
        .map(|i| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            SortEntry::new(format!("w{i}"), vec![state >> 60, (state >> 56) & 0xF])
        })
        .collect();
    let mut parallel = entries.clone();
    radix_sort(&mut entries, false).unwrap();
    radix_sort(&mut parallel, true).unwrap();
    assert_eq!(entries, parallel);
}

#[test]
fn test_partition_words_zero_producers() {
    let shards = partition_words(&words(&["人", "好"]), 0);
    assert!(shards.is_empty());
}

#[test]
fn test_pad_rejects_overlong_key() {
    let mut entries = vec![SortEntry::new("你好", vec![6, 2])];
    let err = pad_entries(&mut entries, 1).unwrap_err();
    assert!(matches!(err, SortError::MalformedBatch { .. }));
}

#[test]
fn test_partition_words_contiguous_cover() {
    let input = words(&["一", "二", "三", "四", "五", "六", "七"]);
    let shards = partition_words(&input, 3);
    assert_eq!(shards.len(), 3);
    let rejoined: String = shards.concat();
    let expected: String = input.iter().map(|w| format!("{w}\n")).collect();
    assert_eq!(rejoined, expected);
    // Roughly equal: 3 + 2 + 2
    assert_eq!(shards[0].matches('\n').count(), 3);
    assert_eq!(shards[1].matches('\n').count(), 2);
    assert_eq!(shards[2].matches('\n').count(), 2);
}

#[test]
fn test_line_tokenizer_emits_delimiters() {
    let tokens: Vec<String> = LineTokenizer.tokenize("你好\n好\n").collect();
    assert_eq!(tokens, words(&["你好", RECORD_DELIMITER, "好", RECORD_DELIMITER]));

    // No trailing delimiter: final word still yielded
    let tokens: Vec<String> = LineTokenizer.tokenize("你好\n好").collect();
    assert_eq!(tokens, words(&["你好", RECORD_DELIMITER, "好"]));

    // Empty line collapses to a bare delimiter token
    let tokens: Vec<String> = LineTokenizer.tokenize("\n好\n").collect();
    assert_eq!(tokens, words(&[RECORD_DELIMITER, "好", RECORD_DELIMITER]));
}

#[test]
fn test_rank_table_from_reader() {
    let tsv = "# comment\n好\t2\nWTO\t12\n\n人\t8\n";
    let table = RankTable::from_reader(tsv.as_bytes()).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.rank(Signature::Han('好')), Some(2));
    assert_eq!(table.rank(Signature::Foreign("WTO")), Some(12));
    assert_eq!(table.rank(Signature::Han('咕')), None);

    let bad = RankTable::from_reader("好 2\n".as_bytes());
    assert!(bad.is_err());
}

fn canonical_sorted() -> Vec<String> {
    sort(
        &["人群", "河水", "人", "河流", "好", "你好", "WTO世贸", "人"],
        &SortConfig::default(),
    )
}

proptest! {
    #[test]
    fn prop_permutation_invariance(
        perm in Just(vec![
            "人群".to_string(),
            "河水".to_string(),
            "人".to_string(),
            "河流".to_string(),
            "好".to_string(),
            "你好".to_string(),
            "WTO世贸".to_string(),
            "人".to_string(),
        ])
        .prop_shuffle()
    ) {
        let sorted: Vec<String> = sort_words(&perm, &table(), &SortConfig::default())
            .unwrap()
            .collect();
        prop_assert_eq!(sorted, canonical_sorted());
    }
}
