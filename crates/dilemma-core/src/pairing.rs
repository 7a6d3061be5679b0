//! Round-robin pairing generation
//!
//! Pairings are enumerated in colexicographic order (by the higher index,
//! then the lower), so the pairing for any match index can be computed
//! directly without materializing the whole schedule.

/// Whether a participant is paired with itself
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelfPlay {
    /// Each name also plays itself once (strategy tournaments)
    Included,
    /// Only distinct participants meet (individuals in a population)
    Excluded,
}

/// Total number of matches, O(1) with no allocation
///
/// - `Included`: `n(n+1)/2`
/// - `Excluded`: `n(n-1)/2`
pub fn match_count(participant_count: usize, self_play: SelfPlay) -> usize {
    let n = participant_count;
    match self_play {
        SelfPlay::Included => n * (n + 1) / 2,
        SelfPlay::Excluded => n * n.saturating_sub(1) / 2,
    }
}

/// Get the pairing for a specific match index in O(1) memory
///
/// Returns `(a, b)` with `a <= b` (`a < b` when self-play is excluded),
/// or `None` past the end of the schedule.
pub fn pairing_for_match(
    participant_count: usize,
    self_play: SelfPlay,
    match_index: usize,
) -> Option<(usize, usize)> {
    if match_index >= match_count(participant_count, self_play) {
        return None;
    }

    let (a, b) = unrank_pair(match_index as u64);
    let (a, b) = (a as usize, b as usize);
    match self_play {
        // Shifting the higher index down by one turns the strict a < b
        // enumeration into the a <= b one.
        SelfPlay::Included => Some((a, b - 1)),
        SelfPlay::Excluded => Some((a, b)),
    }
}

/// Generate all match pairings in schedule order
pub fn all_pairings(participant_count: usize, self_play: SelfPlay) -> Vec<(usize, usize)> {
    (0..match_count(participant_count, self_play))
        .filter_map(|i| pairing_for_match(participant_count, self_play, i))
        .collect()
}

/// Integer floor square root via Newton's method
fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

/// Colexicographic combination unranking: rank to (a, b) with a < b.
///
/// rank = C(b,2) + a = b*(b-1)/2 + a
fn unrank_pair(rank: u64) -> (u64, u64) {
    // Estimate b via floor(sqrt(1 + 8*rank))
    let s = isqrt(1 + 8 * rank);
    let mut b = (1 + s) / 2;

    // Correct estimate
    while b > 0 && b * (b - 1) / 2 > rank {
        b -= 1;
    }
    while (b + 1) * b / 2 <= rank {
        b += 1;
    }

    let a = rank - b * (b - 1) / 2;
    (a, b)
}
