use crate::foundation::error::{TesseraError, TesseraResult};

pub use kurbo::{Affine, Point, Rect as RectD, Vec2};

/// Canonical coordinates beyond this magnitude are treated as "infinite",
/// i.e. an unbounded region-of-interest request.
pub const CANONICAL_INFINITY: f64 = 1.0e15;

/// Axis-aligned integer pixel rectangle, half-open `[x1, x2) x [y1, y2)`.
///
/// A degenerate rectangle (`x1 == x2` or `y1 == y2`) has area 0 and is
/// considered null. `x1 <= x2` and `y1 <= y2` always hold for values built
/// through [`RectI::new`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct RectI {
    /// Left edge, inclusive.
    pub x1: i32,
    /// Bottom edge, inclusive.
    pub y1: i32,
    /// Right edge, exclusive.
    pub x2: i32,
    /// Top edge, exclusive.
    pub y2: i32,
}

impl RectI {
    /// Build a rectangle, rejecting inverted edges.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> TesseraResult<Self> {
        if x1 > x2 || y1 > y2 {
            return Err(TesseraError::validation(
                "RectI requires x1 <= x2 and y1 <= y2",
            ));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// An empty rectangle at the origin.
    pub const NULL: RectI = RectI {
        x1: 0,
        y1: 0,
        x2: 0,
        y2: 0,
    };

    /// Width in pixels.
    pub fn width(self) -> u32 {
        (self.x2 - self.x1).max(0) as u32
    }

    /// Height in pixels.
    pub fn height(self) -> u32 {
        (self.y2 - self.y1).max(0) as u32
    }

    /// Pixel count.
    pub fn area(self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// True when the rectangle covers no pixels.
    pub fn is_null(self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    /// True when the pixel at `(x, y)` lies inside the rectangle.
    pub fn contains(self, x: i32, y: i32) -> bool {
        self.x1 <= x && x < self.x2 && self.y1 <= y && y < self.y2
    }

    /// True when every pixel of `other` lies inside `self`. A null `other`
    /// is contained by anything.
    pub fn contains_rect(self, other: RectI) -> bool {
        if other.is_null() {
            return true;
        }
        self.x1 <= other.x1 && other.x2 <= self.x2 && self.y1 <= other.y1 && other.y2 <= self.y2
    }

    /// Intersection, or `None` when the rectangles do not overlap.
    pub fn intersect(self, other: RectI) -> Option<RectI> {
        let r = RectI {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };
        if r.is_null() { None } else { Some(r) }
    }

    /// Bounding union. A null operand does not grow the result.
    pub fn merge(self, other: RectI) -> RectI {
        if self.is_null() {
            return other;
        }
        if other.is_null() {
            return self;
        }
        RectI {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// The canonical-space rectangle this pixel rectangle covers at `scale`.
    pub fn to_canonical(self, scale: RenderScale) -> RectD {
        RectD::new(
            f64::from(self.x1) / scale.x,
            f64::from(self.y1) / scale.y,
            f64::from(self.x2) / scale.x,
            f64::from(self.y2) / scale.y,
        )
    }
}

/// Smallest pixel rectangle enclosing `rect` at the given render scale.
pub fn canonical_to_pixel(rect: RectD, scale: RenderScale) -> RectI {
    let clamp = |v: f64| v.clamp(f64::from(i32::MIN), f64::from(i32::MAX));
    RectI {
        x1: clamp((rect.x0 * scale.x).floor()) as i32,
        y1: clamp((rect.y0 * scale.y).floor()) as i32,
        x2: clamp((rect.x1 * scale.x).ceil()) as i32,
        y2: clamp((rect.y1 * scale.y).ceil()) as i32,
    }
}

/// Bounding union of two canonical rectangles; an empty operand does not grow
/// the result.
pub fn rect_union(a: RectD, b: RectD) -> RectD {
    if rect_is_empty(a) {
        return b;
    }
    if rect_is_empty(b) {
        return a;
    }
    a.union(b)
}

/// True when the canonical rectangle covers no area.
pub fn rect_is_empty(r: RectD) -> bool {
    r.x1 <= r.x0 || r.y1 <= r.y0
}

/// True when the rectangle requests an unbounded region (any non-finite or
/// out-of-range coordinate).
pub fn rect_is_infinite(r: RectD) -> bool {
    [r.x0, r.y0, r.x1, r.y1]
        .iter()
        .any(|v| !v.is_finite() || v.abs() >= CANONICAL_INFINITY)
}

/// Render scale relative to the full-resolution canonical format.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderScale {
    /// Horizontal scale factor.
    pub x: f64,
    /// Vertical scale factor.
    pub y: f64,
}

impl RenderScale {
    /// Full resolution.
    pub fn one() -> Self {
        Self { x: 1.0, y: 1.0 }
    }

    /// Scale factor for a mip-map level: `1 / 2^level`.
    pub fn from_mip_map_level(level: u32) -> Self {
        let s = 1.0 / f64::from(1u32 << level.min(31));
        Self { x: s, y: s }
    }
}

/// Index of a view in a multi-view project. View 0 is the main view.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct ViewIdx(pub u32);

impl ViewIdx {
    /// The main view.
    pub const MAIN: ViewIdx = ViewIdx(0);
}

/// Frame time usable as a hash-map key.
///
/// Times are snapped to a fixed sub-frame grid on construction so that a time
/// computed through different arithmetic paths still addresses the same
/// request entry.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct TimeKey(f64);

impl TimeKey {
    const GRID: f64 = 10_000.0;

    /// Snap `time` to the sub-frame grid.
    pub fn new(time: f64) -> Self {
        let snapped = (time * Self::GRID).round() / Self::GRID;
        // Normalize -0.0 so bit-pattern equality behaves.
        Self(if snapped == 0.0 { 0.0 } else { snapped })
    }

    /// The snapped time.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for TimeKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for TimeKey {}

impl std::hash::Hash for TimeKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for TimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
