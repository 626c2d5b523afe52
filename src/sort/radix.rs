/// Column-wise stable LSD sort over uniform-arity rank tuples.
///
/// Each pass stably reorders the whole batch by a single rank column,
/// starting at the least-significant column and ending at column 0.
/// Stability makes the passes compose into true lexicographic order over
/// the padded tuple, which the zero-padding invariant (identical arity
/// everywhere) makes well-defined. Entries whose full rank tuples compare
/// equal keep their input order.
use rayon::prelude::*;

use super::key::SortEntry;
use crate::SortError;

/// Above this many entries a column pass uses rayon's parallel stable
/// sort; below it, the sequential stable sort wins.
const PAR_SORT_MIN: usize = 10_000;

/// Stably sort `entries` into pronunciation order.
///
/// Verifies the batch arity invariant up front and fails with
/// [`SortError::MalformedBatch`] on any mismatch: an arity mismatch
/// means the padding stage is defective and the ordering would be
/// undefined.
///
/// With `parallel` set, large column passes use rayon's parallel stable
/// sort; the direct path passes `false` and stays single-threaded.
pub fn radix_sort(entries: &mut [SortEntry], parallel: bool) -> Result<(), SortError> {
    let Some(first) = entries.first() else {
        return Ok(());
    };
    let arity = first.ranks.len();
    for entry in entries.iter() {
        if entry.ranks.len() != arity {
            return Err(SortError::MalformedBatch {
                expected: arity,
                found: entry.ranks.len(),
            });
        }
    }

    // Least-significant rank column first; the payload column is never a
    // sort key, it rides along with its entry.
    for column in (0..arity).rev() {
        sort_column(entries, column, parallel);
    }
    Ok(())
}

/// One stable single-column pass.
fn sort_column(entries: &mut [SortEntry], column: usize, parallel: bool) {
    let cmp = |a: &SortEntry, b: &SortEntry| a.ranks[column].cmp(&b.ranks[column]);
    if parallel && entries.len() > PAR_SORT_MIN {
        entries.par_sort_by(cmp);
    } else {
        entries.sort_by(cmp);
    }
}
