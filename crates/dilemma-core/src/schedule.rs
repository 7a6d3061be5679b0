//! Executing a list of independent matches, optionally on worker threads
//!
//! Every match is identified by its index in the schedule and derives its
//! own RNG stream from that index, so splitting the list across threads
//! never changes the results.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::error::{Result, SimulationError};

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
}

/// Play every `(a, b)` pairing and return the final scores in schedule order.
///
/// `play` receives the match index and the two participant indices. The
/// cancellation flag is checked before every match.
pub(crate) fn play_all<F>(
    pairings: &[(usize, usize)],
    threads: usize,
    cancel: Option<&AtomicBool>,
    play: F,
) -> Result<Vec<(u64, u64)>>
where
    F: Fn(usize, usize, usize) -> (u64, u64) + Sync,
{
    if threads <= 1 || pairings.len() <= 1 {
        let mut scores = Vec::with_capacity(pairings.len());
        for (index, &(a, b)) in pairings.iter().enumerate() {
            if is_cancelled(cancel) {
                return Err(SimulationError::Cancelled { completed: index });
            }
            scores.push(play(index, a, b));
        }
        return Ok(scores);
    }

    let chunk_len = pairings.len().div_ceil(threads);
    let play = &play;

    // Each worker reports the scores it finished and whether it stopped early
    let chunks: Vec<(Vec<(u64, u64)>, bool)> = thread::scope(|s| {
        let handles: Vec<_> = pairings
            .chunks(chunk_len)
            .enumerate()
            .map(|(chunk_index, chunk)| {
                s.spawn(move || {
                    let base = chunk_index * chunk_len;
                    let mut scores = Vec::with_capacity(chunk.len());
                    for (offset, &(a, b)) in chunk.iter().enumerate() {
                        if is_cancelled(cancel) {
                            return (scores, true);
                        }
                        scores.push(play(base + offset, a, b));
                    }
                    (scores, false)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    });

    if chunks.iter().any(|&(_, interrupted)| interrupted) {
        let completed = chunks.iter().map(|(scores, _)| scores.len()).sum();
        return Err(SimulationError::Cancelled { completed });
    }

    Ok(chunks.into_iter().flat_map(|(scores, _)| scores).collect())
}

/// Indices ordered by score descending, ties broken by lower index first
pub(crate) fn rank_by_score(scores: &[u64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].cmp(&scores[a]).then(a.cmp(&b)));
    order
}
