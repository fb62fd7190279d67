//! Presentation order randomization

use rand::Rng;

/// Return a uniformly random permutation of `items`
///
/// Fisher–Yates: for `i` from the last index down to 1, swap position `i`
/// with a uniformly chosen `j` in `[0, i]`. The input is left untouched and
/// every element appears exactly once in the result.
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = rng.gen_range(0..=i);
        shuffled.swap(i, j);
    }
    shuffled
}
