use rand::seq::SliceRandom;
use rand::Rng;

/// Builds the traversal order used by auto-play.
///
/// Sequential mode is the identity order. Shuffled mode is a uniform
/// permutation, rotated left by one when it would open on `active` so a new
/// cycle never starts on the slide already on screen.
pub fn slide_order<R: Rng + ?Sized>(
    len: usize,
    shuffled: bool,
    active: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut order = (0..len).collect::<Vec<_>>();
    if !shuffled || len <= 1 {
        return order;
    }

    order.shuffle(rng);
    if order[0] == active {
        order.rotate_left(1);
    }
    order
}
