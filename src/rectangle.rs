//! Geometric value types: points, intervals and axis-aligned rectangles.
//!
//! All three are immutable values. `Point` and `Rectangle` compare and hash
//! by value (bitwise on the coordinates, with `-0.0` folded into `0.0`), so
//! they can live in hash sets and be used as queue payloads without aliasing
//! concerns.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

use crate::error::{Result, ThresholdError};

// ──────────────────────────────────────────────────────────────────────────────
// Point
// ──────────────────────────────────────────────────────────────────────────────

/// An immutable point in n-dimensional space.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point(Box<[f64]>);

#[inline]
fn coord_bits(v: f64) -> u64 {
    if v == 0.0 {
        0
    } else {
        v.to_bits()
    }
}

impl Point {
    pub fn new(coords: Vec<f64>) -> Self {
        Self(coords.into_boxed_slice())
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    /// Componentwise `self >= other`.
    pub fn dominates(&self, other: &[f64]) -> bool {
        self.0.iter().zip(other).all(|(a, b)| a >= b)
    }

    /// Euclidean distance.
    pub fn dist(&self, other: &[f64]) -> f64 {
        self.0
            .iter()
            .zip(other)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    /// `self + t * (other - self)`.
    pub fn lerp(&self, other: &[f64], t: f64) -> Point {
        self.0
            .iter()
            .zip(other)
            .map(|(a, b)| a + t * (b - a))
            .collect()
    }

    pub fn midpoint(&self, other: &[f64]) -> Point {
        self.lerp(other, 0.5)
    }
}

impl Deref for Point {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for Point {
    fn from(v: Vec<f64>) -> Self {
        Self::new(v)
    }
}

impl From<&[f64]> for Point {
    fn from(v: &[f64]) -> Self {
        Self(v.into())
    }
}

impl<const N: usize> From<[f64; N]> for Point {
    fn from(v: [f64; N]) -> Self {
        Self(Box::new(v))
    }
}

impl FromIterator<f64> for Point {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|(&a, &b)| coord_bits(a) == coord_bits(b))
    }
}

impl Eq for Point {}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for &v in self.0.iter() {
            coord_bits(v).hash(state);
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, ")")
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Interval
// ──────────────────────────────────────────────────────────────────────────────

/// A closed interval `[lo, hi]` with `lo <= hi`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawInterval"))]
pub struct Interval {
    lo: f64,
    hi: f64,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawInterval {
    lo: f64,
    hi: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawInterval> for Interval {
    type Error = ThresholdError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        Interval::new(raw.lo, raw.hi)
    }
}

impl Interval {
    pub fn new(lo: f64, hi: f64) -> Result<Self> {
        if !(lo <= hi) {
            return Err(ThresholdError::InvalidArgs(format!(
                "interval lower end {} exceeds upper end {}",
                lo, hi
            )));
        }
        Ok(Self { lo, hi })
    }

    /// Ends already known to be ordered.
    pub(crate) fn from_ordered(lo: f64, hi: f64) -> Self {
        debug_assert!(lo <= hi, "malformed interval [{}, {}]", lo, hi);
        Self { lo, hi }
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    pub fn len(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn midpoint(&self) -> f64 {
        self.lo + (self.hi - self.lo) / 2.0
    }

    pub fn is_degenerate(&self) -> bool {
        self.lo == self.hi
    }

    pub fn contains(&self, v: f64) -> bool {
        self.lo <= v && v <= self.hi
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Rectangle
// ──────────────────────────────────────────────────────────────────────────────

/// An axis-aligned rectangle `[bot, top]` with `bot[i] <= top[i]` on every axis.
///
/// `error` records how far the true boundary may lie from this rectangle
/// because an ancestor was collapsed to a corner. It is metadata: equality
/// and hashing only look at the corners.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawRectangle"))]
pub struct Rectangle {
    bot: Point,
    top: Point,
    error: f64,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawRectangle {
    bot: Point,
    top: Point,
    #[serde(default)]
    error: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawRectangle> for Rectangle {
    type Error = ThresholdError;

    fn try_from(raw: RawRectangle) -> Result<Self> {
        Ok(Rectangle::new(raw.bot, raw.top)?.with_error(raw.error))
    }
}

impl Rectangle {
    /// Build a rectangle, rejecting mismatched dimensions and `bot > top`.
    pub fn new(bot: impl Into<Point>, top: impl Into<Point>) -> Result<Self> {
        let bot = bot.into();
        let top = top.into();
        if bot.dim() == 0 {
            return Err(ThresholdError::InvalidArgs("dimension must be > 0".into()));
        }
        if bot.dim() != top.dim() {
            return Err(ThresholdError::DimensionMismatch {
                expected: bot.dim(),
                found: top.dim(),
            });
        }
        for (i, (b, t)) in bot.iter().zip(top.iter()).enumerate() {
            if !(b <= t) {
                return Err(ThresholdError::InvalidBounds { dim: i });
            }
        }
        Ok(Self {
            bot,
            top,
            error: 0.0,
        })
    }

    /// Build a rectangle from one interval per axis.
    pub fn from_intervals<I>(intervals: I) -> Result<Self>
    where
        I: IntoIterator<Item = Interval>,
    {
        let (bot, top): (Vec<f64>, Vec<f64>) =
            intervals.into_iter().map(|i| (i.lo(), i.hi())).unzip();
        Self::new(bot, top)
    }

    /// The degenerate rectangle `[p, p]`.
    pub fn point(p: impl Into<Point>) -> Self {
        let p = p.into();
        Self {
            bot: p.clone(),
            top: p,
            error: 0.0,
        }
    }

    /// Corners derived from a valid parent; the caller guarantees the order.
    pub(crate) fn from_corners(bot: Point, top: Point) -> Self {
        debug_assert_eq!(bot.dim(), top.dim());
        debug_assert!(
            bot.iter().zip(top.iter()).all(|(b, t)| b <= t),
            "malformed rectangle {} > {}",
            bot,
            top
        );
        Self {
            bot,
            top,
            error: 0.0,
        }
    }

    pub fn with_error(mut self, error: f64) -> Self {
        self.error = error;
        self
    }

    pub fn bot(&self) -> &Point {
        &self.bot
    }

    pub fn top(&self) -> &Point {
        &self.top
    }

    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn dim(&self) -> usize {
        self.bot.dim()
    }

    pub fn interval(&self, axis: usize) -> Interval {
        Interval {
            lo: self.bot[axis],
            hi: self.top[axis],
        }
    }

    pub fn intervals(&self) -> Vec<Interval> {
        (0..self.dim()).map(|i| self.interval(i)).collect()
    }

    /// `top - bot`.
    pub fn diag(&self) -> Vec<f64> {
        self.top
            .iter()
            .zip(self.bot.iter())
            .map(|(t, b)| t - b)
            .collect()
    }

    /// Euclidean length of the diagonal.
    pub fn diag_norm(&self) -> f64 {
        self.bot.dist(&self.top)
    }

    pub fn volume(&self) -> f64 {
        self.diag().iter().product()
    }

    pub fn is_point(&self) -> bool {
        self.bot == self.top
    }

    /// True for points and for rectangles flattened onto a lower-dimensional face.
    pub fn is_degenerate(&self) -> bool {
        self.diag().iter().any(|&d| d == 0.0)
    }

    /// Axes with positive extent.
    pub fn free_axes(&self) -> Vec<usize> {
        self.diag()
            .iter()
            .enumerate()
            .filter(|(_, d)| **d > 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn shortest_edge(&self) -> f64 {
        self.diag().into_iter().fold(f64::INFINITY, f64::min)
    }

    pub fn longest_edge(&self) -> f64 {
        self.diag().into_iter().fold(0.0, f64::max)
    }

    pub fn center(&self) -> Point {
        self.bot.midpoint(&self.top)
    }

    /// Point at parameter `t` along the diagonal, never leaving the rectangle.
    pub fn lerp(&self, t: f64) -> Point {
        if t <= 0.0 {
            return self.bot.clone();
        }
        if t >= 1.0 {
            return self.top.clone();
        }
        self.bot
            .iter()
            .zip(self.top.iter())
            .map(|(&b, &tp)| (b + t * (tp - b)).clamp(b, tp))
            .collect()
    }

    /// All 2ⁿ corners; bit `i` of the index selects `top` on axis `i`.
    pub fn corners(&self) -> Vec<Point> {
        let n = self.dim();
        (0..1usize << n)
            .map(|mask| {
                (0..n)
                    .map(|i| {
                        if mask & (1 << i) != 0 {
                            self.top[i]
                        } else {
                            self.bot[i]
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// `k` evenly spaced points along the diagonal, corners included;
    /// `k == 1` gives the center.
    pub fn discretize(&self, k: usize) -> Vec<Point> {
        match k {
            0 => Vec::new(),
            1 => vec![self.center()],
            _ => (0..k)
                .map(|j| self.lerp(j as f64 / (k - 1) as f64))
                .collect(),
        }
    }

    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.dim()
            && x
                .iter()
                .enumerate()
                .all(|(i, &v)| self.bot[i] <= v && v <= self.top[i])
    }

    /// Every point of `self` dominates every point of `other`.
    pub fn dominates(&self, other: &Rectangle) -> bool {
        self.bot.dominates(&other.top)
    }

    /// Neither rectangle dominates the other.
    pub fn incomparable(&self, other: &Rectangle) -> bool {
        !self.dominates(other) && !other.dominates(self)
    }

    /// Smallest Euclidean distance between a point of `self` and a point of `other`.
    pub fn min_dist(&self, other: &Rectangle) -> f64 {
        (0..self.dim())
            .map(|i| {
                let gap = (other.bot[i] - self.top[i])
                    .max(self.bot[i] - other.top[i])
                    .max(0.0);
                gap * gap
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Largest Euclidean distance between a point of `self` and a point of `other`.
    pub fn max_dist(&self, other: &Rectangle) -> f64 {
        (0..self.dim())
            .map(|i| {
                let span = (other.top[i] - self.bot[i])
                    .abs()
                    .max((self.top[i] - other.bot[i]).abs());
                span * span
            })
            .sum::<f64>()
            .sqrt()
    }
}

impl PartialEq for Rectangle {
    fn eq(&self, other: &Self) -> bool {
        self.bot == other.bot && self.top == other.top
    }
}

impl Eq for Rectangle {}

impl Hash for Rectangle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bot.hash(state);
        self.top.hash(state);
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for i in 0..self.dim() {
            if i > 0 {
                write!(f, " x ")?;
            }
            write!(f, "{}", self.interval(i))?;
        }
        write!(f, "]")
    }
}
