use crate::foundation::core::RectI;

/// Per-pixel "already rendered" tracker over one region of definition.
///
/// The tracker only grows: cells flip from unrendered to rendered through
/// [`Bitmap::mark_rendered`] and never back. Queries report which
/// sub-rectangles of a region still need rendering so that repeated requests
/// re-render only missing pixels.
///
/// The tracker itself is not synchronized; [`crate::Image`] serializes access
/// through its own lock.
#[derive(Clone, Debug)]
pub struct Bitmap {
    bounds: RectI,
    cells: Vec<bool>,
    rendered: u64,
}

impl Bitmap {
    /// New tracker over `bounds` with every cell unrendered.
    pub fn new(bounds: RectI) -> Self {
        Self {
            bounds,
            cells: vec![false; bounds.area() as usize],
            rendered: 0,
        }
    }

    /// Region of definition the tracker covers.
    pub fn bounds(&self) -> RectI {
        self.bounds
    }

    /// Number of cells currently marked rendered. Monotonically increasing.
    pub fn rendered_pixel_count(&self) -> u64 {
        self.rendered
    }

    /// True when the cell at `(x, y)` is marked rendered. Out-of-bounds cells
    /// read as unmarked.
    pub fn is_marked(&self, x: i32, y: i32) -> bool {
        self.bounds.contains(x, y) && self.cells[self.cell_index(x, y)]
    }

    /// Mark every cell of `roi ∩ bounds` rendered. Idempotent.
    pub fn mark_rendered(&mut self, roi: RectI) {
        let Some(roi) = roi.intersect(self.bounds) else {
            return;
        };
        let w = self.bounds.width() as usize;
        for y in roi.y1..roi.y2 {
            let row = (y - self.bounds.y1) as usize * w;
            let start = row + (roi.x1 - self.bounds.x1) as usize;
            let end = row + (roi.x2 - self.bounds.x1) as usize;
            for cell in &mut self.cells[start..end] {
                if !*cell {
                    *cell = true;
                    self.rendered += 1;
                }
            }
        }
    }

    /// Transfer marks from another tracker over the intersection of the two
    /// bounds. Used when an image grows its bounds and keeps its history.
    pub(crate) fn transfer_marks(&mut self, other: &Bitmap) {
        let Some(common) = self.bounds.intersect(other.bounds) else {
            return;
        };
        for y in common.y1..common.y2 {
            let mut x = common.x1;
            while x < common.x2 {
                // Copy marked spans row by row.
                while x < common.x2 && !other.is_marked(x, y) {
                    x += 1;
                }
                let span_start = x;
                while x < common.x2 && other.is_marked(x, y) {
                    x += 1;
                }
                if span_start < x {
                    self.mark_rendered(RectI {
                        x1: span_start,
                        y1: y,
                        x2: x,
                        y2: y + 1,
                    });
                }
            }
        }
    }

    /// Bounding box of the unrendered cells of `roi ∩ bounds`, or `None` when
    /// the region is fully rendered.
    pub fn non_marked_bbox(&self, roi: RectI) -> Option<RectI> {
        let roi = roi.intersect(self.bounds)?;
        let mut bbox: Option<RectI> = None;
        for y in roi.y1..roi.y2 {
            if let Some((sx, ex)) = self.row_unmarked_span(y, roi) {
                let row = RectI {
                    x1: sx,
                    y1: y,
                    x2: ex,
                    y2: y + 1,
                };
                bbox = Some(match bbox {
                    Some(b) => b.merge(row),
                    None => row,
                });
            }
        }
        bbox
    }

    /// Decompose the unrendered portion of `roi ∩ bounds` into non-overlapping
    /// rectangles.
    ///
    /// Per row, the span from the first to the last unrendered cell is taken;
    /// consecutive rows with identical spans merge into one rectangle. The
    /// result may conservatively cover some already-rendered cells (an exact
    /// minimal cover is not required), but never misses an unrendered one, and
    /// every rectangle lies within `roi ∩ bounds`. A fully rendered region
    /// yields an empty vector; a fully unrendered one yields `roi ∩ bounds`
    /// itself.
    pub fn non_marked_rects(&self, roi: RectI) -> Vec<RectI> {
        let Some(roi) = roi.intersect(self.bounds) else {
            return Vec::new();
        };

        let mut rects = Vec::new();
        let mut current: Option<RectI> = None;

        for y in roi.y1..roi.y2 {
            match self.row_unmarked_span(y, roi) {
                Some((sx, ex)) => {
                    match current {
                        Some(ref mut r) if r.x1 == sx && r.x2 == ex && r.y2 == y => {
                            r.y2 = y + 1;
                        }
                        Some(r) => {
                            rects.push(r);
                            current = Some(RectI {
                                x1: sx,
                                y1: y,
                                x2: ex,
                                y2: y + 1,
                            });
                        }
                        None => {
                            current = Some(RectI {
                                x1: sx,
                                y1: y,
                                x2: ex,
                                y2: y + 1,
                            });
                        }
                    };
                }
                None => {
                    if let Some(r) = current.take() {
                        rects.push(r);
                    }
                }
            }
        }
        if let Some(r) = current {
            rects.push(r);
        }
        rects
    }

    fn cell_index(&self, x: i32, y: i32) -> usize {
        debug_assert!(self.bounds.contains(x, y));
        (y - self.bounds.y1) as usize * self.bounds.width() as usize
            + (x - self.bounds.x1) as usize
    }

    /// `(start_x, end_x)` of the unmarked span of row `y` clipped to `roi`, or
    /// `None` when the row is fully marked.
    fn row_unmarked_span(&self, y: i32, roi: RectI) -> Option<(i32, i32)> {
        let w = self.bounds.width() as usize;
        let row = (y - self.bounds.y1) as usize * w;
        let start = row + (roi.x1 - self.bounds.x1) as usize;
        let end = row + (roi.x2 - self.bounds.x1) as usize;
        let cells = &self.cells[start..end];
        let first = cells.iter().position(|c| !*c)?;
        let last = cells.iter().rposition(|c| !*c).unwrap_or(first);
        Some((roi.x1 + first as i32, roi.x1 + last as i32 + 1))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/bitmap.rs"]
mod tests;
