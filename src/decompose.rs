//! Cone and incomparable-region decomposition of a rectangle around a split point.
//!
//! Under a monotone oracle a point `p` splits a rectangle `r` into:
//! - the forward cone `[p, r.top]`, which dominates `p`;
//! - the backward cone `[r.bot, p]`, which `p` dominates;
//! - 2ⁿ−2 incomparable staircase regions that monotonicity alone cannot
//!   classify. These are the only regions that still need work once the
//!   oracle value at `p` is known.

use crate::rectangle::{Point, Rectangle};

/// Region dominating `p`.
pub fn forward_cone(p: &[f64], r: &Rectangle) -> Rectangle {
    Rectangle::from_corners(Point::from(p), r.top().clone())
}

/// Region dominated by `p`.
pub fn backward_cone(p: &[f64], r: &Rectangle) -> Rectangle {
    Rectangle::from_corners(r.bot().clone(), Point::from(p))
}

/// All incomparable regions of `r` around `mid`.
///
/// One rectangle per non-empty proper subset `S` of the free axes: extent
/// `[mid_i, top_i]` on axes in `S`, `[bot_i, mid_i]` on the rest. Yields
/// 2ᵏ−2 rectangles for `k` free axes, none for k < 2.
pub fn generate_incomparables(mid: &[f64], r: &Rectangle) -> Vec<Rectangle> {
    incomparables_between(mid, mid, r)
}

/// Incomparable regions of `r` around the crossing segment `[low, high]`.
///
/// Extent `[low_i, top_i]` on axes in `S` and `[bot_i, high_i]` on the rest,
/// for every non-empty proper subset `S` of the free axes of `r`. Axes where
/// `r` has zero extent keep that extent. Together with `backward_cone(low)`
/// and `forward_cone(high)` these cover `r` when it has at least two free
/// axes. With `low == high` this is [`generate_incomparables`].
pub fn incomparables_between(low: &[f64], high: &[f64], r: &Rectangle) -> Vec<Rectangle> {
    let free = r.free_axes();
    if free.len() < 2 {
        return Vec::new();
    }
    let full = (1usize << free.len()) - 1;
    (1..full)
        .map(|subset| {
            let mut bot = r.bot().to_vec();
            let mut top = r.top().to_vec();
            for (k, &i) in free.iter().enumerate() {
                if subset & (1 << k) != 0 {
                    bot[i] = low[i];
                } else {
                    top[i] = high[i];
                }
            }
            Rectangle::from_corners(Point::new(bot), Point::new(top)).with_error(r.error())
        })
        .collect()
}

/// Backward cone of `low`, forward cone of `high`, and the incomparables of `mid`.
pub fn subdivide(
    low: &[f64],
    mid: &[f64],
    high: &[f64],
    r: &Rectangle,
) -> (Rectangle, Rectangle, Vec<Rectangle>) {
    let incomparables = generate_incomparables(mid, r);
    (backward_cone(low, r), forward_cone(high, r), incomparables)
}
