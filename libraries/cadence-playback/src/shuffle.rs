//! Shuffle transform
//!
//! Shuffling pins the playing track at the head of the queue and permutes
//! everything else, so playback continues uninterrupted.

use rand::Rng;

/// Uniform in-place Fisher-Yates shuffle
///
/// For `m` from `len` down to 1, swaps element `m - 1` with an element picked
/// uniformly in `[0, m)`.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for m in (1..=items.len()).rev() {
        let i = rng.gen_range(0..m);
        items.swap(m - 1, i);
    }
}

/// Shuffle `queue` around the entry at `pivot`
///
/// Returns a new queue whose first entry is `queue[pivot]`, followed by a
/// random permutation of the remaining entries. `pivot` must be in bounds.
pub fn shuffle_around<T: Clone, R: Rng + ?Sized>(
    queue: &[T],
    pivot: usize,
    rng: &mut R,
) -> Vec<T> {
    let mut rest: Vec<T> = queue
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != pivot)
        .map(|(_, item)| item.clone())
        .collect();

    fisher_yates(&mut rest, rng);

    let mut shuffled = Vec::with_capacity(queue.len());
    shuffled.push(queue[pivot].clone());
    shuffled.extend(rest);
    shuffled
}
