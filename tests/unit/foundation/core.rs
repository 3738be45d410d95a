use super::*;

#[test]
fn recti_rejects_inverted_edges() {
    assert!(RectI::new(5, 0, 4, 10).is_err());
    assert!(RectI::new(0, 5, 10, 4).is_err());
    assert!(RectI::new(0, 0, 0, 0).is_ok());
}

#[test]
fn recti_degenerate_is_null_with_zero_area() {
    let r = RectI::new(3, 3, 3, 9).unwrap();
    assert!(r.is_null());
    assert_eq!(r.area(), 0);
    assert_eq!(r.width(), 0);
    assert_eq!(r.height(), 6);
}

#[test]
fn recti_contains_is_half_open() {
    let r = RectI::new(0, 0, 4, 4).unwrap();
    assert!(r.contains(0, 0));
    assert!(r.contains(3, 3));
    assert!(!r.contains(4, 0));
    assert!(!r.contains(0, 4));
}

#[test]
fn recti_intersect_disjoint_is_none() {
    let a = RectI::new(0, 0, 4, 4).unwrap();
    let b = RectI::new(4, 0, 8, 4).unwrap();
    assert_eq!(a.intersect(b), None);

    let c = RectI::new(2, 2, 6, 6).unwrap();
    assert_eq!(a.intersect(c), Some(RectI::new(2, 2, 4, 4).unwrap()));
}

#[test]
fn recti_merge_ignores_null_operand() {
    let a = RectI::new(10, 10, 20, 20).unwrap();
    assert_eq!(a.merge(RectI::NULL), a);
    assert_eq!(RectI::NULL.merge(a), a);

    let b = RectI::new(0, 15, 12, 30).unwrap();
    assert_eq!(a.merge(b), RectI::new(0, 10, 20, 30).unwrap());
}

#[test]
fn canonical_to_pixel_encloses_at_half_scale() {
    let scale = RenderScale::from_mip_map_level(1);
    let r = canonical_to_pixel(RectD::new(1.0, 1.0, 7.0, 7.0), scale);
    // 0.5 and 3.5 round outward.
    assert_eq!(r, RectI::new(0, 0, 4, 4).unwrap());
}

#[test]
fn canonical_pixel_roundtrip_grows_only() {
    let scale = RenderScale::from_mip_map_level(2);
    let rect = RectD::new(3.0, 5.0, 17.0, 21.0);
    let px = canonical_to_pixel(rect, scale);
    let back = px.to_canonical(scale);
    assert!(back.x0 <= rect.x0 && back.y0 <= rect.y0);
    assert!(back.x1 >= rect.x1 && back.y1 >= rect.y1);
}

#[test]
fn rect_union_ignores_empty_operand() {
    let a = RectD::new(0.0, 0.0, 10.0, 10.0);
    let empty = RectD::new(5.0, 5.0, 5.0, 5.0);
    assert_eq!(rect_union(a, empty), a);
    assert_eq!(rect_union(empty, a), a);
    assert_eq!(
        rect_union(a, RectD::new(5.0, -5.0, 15.0, 5.0)),
        RectD::new(0.0, -5.0, 15.0, 10.0)
    );
}

#[test]
fn rect_is_infinite_thresholds() {
    assert!(!rect_is_infinite(RectD::new(0.0, 0.0, 1920.0, 1080.0)));
    assert!(rect_is_infinite(RectD::new(
        -CANONICAL_INFINITY,
        0.0,
        100.0,
        100.0
    )));
    assert!(rect_is_infinite(RectD::new(0.0, 0.0, f64::INFINITY, 1.0)));
    assert!(rect_is_infinite(RectD::new(0.0, f64::NAN, 1.0, 1.0)));
}

#[test]
fn render_scale_from_mip_map_level() {
    assert_eq!(RenderScale::from_mip_map_level(0), RenderScale::one());
    let s = RenderScale::from_mip_map_level(3);
    assert_eq!(s.x, 0.125);
    assert_eq!(s.y, 0.125);
}

#[test]
fn time_key_snaps_arithmetic_noise() {
    let a = TimeKey::new(0.1 + 0.2);
    let b = TimeKey::new(0.3);
    assert_eq!(a, b);

    let mut hasher_input = std::collections::HashMap::new();
    hasher_input.insert(a, "entry");
    assert_eq!(hasher_input.get(&b), Some(&"entry"));
}

#[test]
fn time_key_distinguishes_adjacent_grid_steps() {
    assert_ne!(TimeKey::new(1.0), TimeKey::new(1.0001));
    assert_eq!(TimeKey::new(1.0), TimeKey::new(1.000_001));
}

#[test]
fn time_key_normalizes_negative_zero() {
    assert_eq!(TimeKey::new(-0.0), TimeKey::new(0.0));
}
