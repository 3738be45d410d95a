use super::*;

fn rect(x1: i32, y1: i32, x2: i32, y2: i32) -> RectI {
    RectI::new(x1, y1, x2, y2).unwrap()
}

fn cover_exactly(bitmap: &Bitmap, roi: RectI, rects: &[RectI]) {
    // Every unrendered cell of roi is covered, every rect lies within roi,
    // and rects are pairwise disjoint.
    for (i, a) in rects.iter().enumerate() {
        assert!(roi.contains_rect(*a), "{a:?} outside {roi:?}");
        for b in rects.iter().skip(i + 1) {
            assert_eq!(a.intersect(*b), None, "{a:?} overlaps {b:?}");
        }
    }
    for y in roi.y1..roi.y2 {
        for x in roi.x1..roi.x2 {
            if !bitmap.is_marked(x, y) {
                assert!(
                    rects.iter().any(|r| r.contains(x, y)),
                    "unrendered ({x}, {y}) not covered"
                );
            }
        }
    }
}

#[test]
fn fresh_tracker_reports_whole_roi() {
    let b = Bitmap::new(rect(0, 0, 8, 8));
    let roi = rect(2, 2, 6, 6);
    assert_eq!(b.non_marked_rects(roi), vec![roi]);
    assert_eq!(b.non_marked_bbox(roi), Some(roi));
    assert_eq!(b.rendered_pixel_count(), 0);
}

#[test]
fn fully_rendered_roi_reports_empty() {
    let mut b = Bitmap::new(rect(0, 0, 8, 8));
    b.mark_rendered(rect(0, 0, 8, 8));
    assert!(b.non_marked_rects(rect(1, 1, 7, 7)).is_empty());
    assert_eq!(b.non_marked_bbox(rect(1, 1, 7, 7)), None);
}

#[test]
fn mark_is_idempotent_and_monotonic() {
    let mut b = Bitmap::new(rect(0, 0, 4, 4));
    b.mark_rendered(rect(0, 0, 2, 2));
    assert_eq!(b.rendered_pixel_count(), 4);
    b.mark_rendered(rect(0, 0, 2, 2));
    assert_eq!(b.rendered_pixel_count(), 4);
    b.mark_rendered(rect(1, 1, 3, 3));
    assert_eq!(b.rendered_pixel_count(), 7);
}

#[test]
fn mark_clips_to_bounds() {
    let mut b = Bitmap::new(rect(0, 0, 4, 4));
    b.mark_rendered(rect(-10, -10, 2, 20));
    assert_eq!(b.rendered_pixel_count(), 8);
    assert!(b.is_marked(0, 3));
    assert!(!b.is_marked(2, 0));
}

#[test]
fn left_edge_rendered_decomposes_into_three_rects() {
    let bounds = rect(0, 0, 10, 10);
    let mut b = Bitmap::new(bounds);
    b.mark_rendered(rect(0, 3, 4, 7));
    let rects = b.non_marked_rects(bounds);
    assert_eq!(
        rects,
        vec![rect(0, 0, 10, 3), rect(4, 3, 10, 7), rect(0, 7, 10, 10)]
    );
    cover_exactly(&b, bounds, &rects);
}

#[test]
fn centered_hole_cover_is_conservative_but_complete() {
    // Unrendered flanks on both sides keep the per-row span full-width, so
    // the cover may include the rendered center. It must still cover every
    // unrendered cell with disjoint rects.
    let bounds = rect(0, 0, 10, 10);
    let mut b = Bitmap::new(bounds);
    b.mark_rendered(rect(3, 3, 7, 7));
    let rects = b.non_marked_rects(bounds);
    assert!(!rects.is_empty());
    cover_exactly(&b, bounds, &rects);
}

#[test]
fn checkerboard_cover_never_misses_a_cell() {
    let bounds = rect(0, 0, 6, 6);
    let mut b = Bitmap::new(bounds);
    for y in 0..6 {
        for x in 0..6 {
            if (x + y) % 2 == 0 {
                b.mark_rendered(rect(x, y, x + 1, y + 1));
            }
        }
    }
    let rects = b.non_marked_rects(bounds);
    cover_exactly(&b, bounds, &rects);
}

#[test]
fn identical_row_spans_merge_vertically() {
    let bounds = rect(0, 0, 8, 8);
    let mut b = Bitmap::new(bounds);
    b.mark_rendered(rect(0, 0, 8, 2));
    b.mark_rendered(rect(0, 6, 8, 8));
    let rects = b.non_marked_rects(bounds);
    assert_eq!(rects, vec![rect(0, 2, 8, 6)]);
}

#[test]
fn non_marked_bbox_tightens_per_axis() {
    let bounds = rect(0, 0, 10, 10);
    let mut b = Bitmap::new(bounds);
    b.mark_rendered(rect(0, 0, 10, 4));
    b.mark_rendered(rect(0, 4, 3, 10));
    let bbox = b.non_marked_bbox(bounds).unwrap();
    assert_eq!(bbox, rect(3, 4, 10, 10));
}

#[test]
fn disjoint_roi_yields_nothing() {
    let b = Bitmap::new(rect(0, 0, 4, 4));
    assert!(b.non_marked_rects(rect(10, 10, 20, 20)).is_empty());
    assert_eq!(b.non_marked_bbox(rect(10, 10, 20, 20)), None);
}

#[test]
fn transfer_marks_preserves_history_across_growth() {
    let mut old = Bitmap::new(rect(0, 0, 4, 4));
    old.mark_rendered(rect(1, 1, 3, 3));
    let mut grown = Bitmap::new(rect(0, 0, 8, 8));
    grown.transfer_marks(&old);
    assert!(grown.is_marked(1, 1));
    assert!(grown.is_marked(2, 2));
    assert!(!grown.is_marked(0, 0));
    assert!(!grown.is_marked(5, 5));
    assert_eq!(grown.rendered_pixel_count(), 4);
}
