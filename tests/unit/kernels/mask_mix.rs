use super::*;

fn rect(x1: i32, y1: i32, x2: i32, y2: i32) -> RectI {
    RectI::new(x1, y1, x2, y2).unwrap()
}

fn one_pixel_dst(px: [f32; 4]) -> Vec<f32> {
    px.to_vec()
}

#[test]
fn unmasked_full_mix_keeps_destination() {
    let mut data = one_pixel_dst([0.1, 0.2, 0.3, 0.4]);
    let bounds = rect(0, 0, 1, 1);
    let mut dst = PlaneViewMut {
        data: &mut data,
        bounds,
        n_comps: 4,
    };
    let orig = OriginalSnapshot {
        data: vec![1.0; 4],
        bounds,
        n_comps: 4,
    };
    apply_mask_mix(&mut dst, None, Some(&orig), bounds, false, false, 1.0);
    assert_eq!(data, vec![0.1, 0.2, 0.3, 0.4]);
}

#[test]
fn mix_zero_restores_original() {
    let mut data = one_pixel_dst([1.0, 1.0, 1.0, 1.0]);
    let bounds = rect(0, 0, 1, 1);
    let mut dst = PlaneViewMut {
        data: &mut data,
        bounds,
        n_comps: 4,
    };
    let orig = OriginalSnapshot {
        data: vec![0.25, 0.5, 0.75, 1.0],
        bounds,
        n_comps: 4,
    };
    apply_mask_mix(&mut dst, None, Some(&orig), bounds, false, false, 0.0);
    assert_eq!(data, vec![0.25, 0.5, 0.75, 1.0]);
}

#[test]
fn half_mix_without_original_halves_destination() {
    let mut data = one_pixel_dst([1.0, 1.0, 1.0, 1.0]);
    let bounds = rect(0, 0, 1, 1);
    let mut dst = PlaneViewMut {
        data: &mut data,
        bounds,
        n_comps: 4,
    };
    apply_mask_mix::<f32>(&mut dst, None, None, bounds, false, false, 0.5);
    assert_eq!(data, vec![0.5, 0.5, 0.5, 0.5]);
}

#[test]
fn mask_value_scales_the_blend_per_pixel() {
    let bounds = rect(0, 0, 3, 1);
    let mut data = vec![1.0_f32; 12];
    let mut dst = PlaneViewMut {
        data: &mut data,
        bounds,
        n_comps: 4,
    };
    let mask = MaskSnapshot {
        data: vec![1.0, 0.5, 0.0],
        bounds,
    };
    apply_mask_mix::<f32>(&mut dst, Some(&mask), None, bounds, true, false, 1.0);
    assert_eq!(&data[0..4], &[1.0; 4]);
    assert_eq!(&data[4..8], &[0.5; 4]);
    assert_eq!(&data[8..12], &[0.0; 4]);
}

#[test]
fn invert_flips_mask_coverage() {
    let bounds = rect(0, 0, 2, 1);
    let mut data = vec![1.0_f32; 8];
    let mut dst = PlaneViewMut {
        data: &mut data,
        bounds,
        n_comps: 4,
    };
    let mask = MaskSnapshot {
        data: vec![1.0, 0.0],
        bounds,
    };
    apply_mask_mix::<f32>(&mut dst, Some(&mask), None, bounds, true, true, 1.0);
    assert_eq!(&data[0..4], &[0.0; 4]);
    assert_eq!(&data[4..8], &[1.0; 4]);
}

#[test]
fn masked_without_mask_image_defaults_to_invert_flag() {
    let bounds = rect(0, 0, 1, 1);

    let mut data = one_pixel_dst([1.0, 1.0, 1.0, 1.0]);
    let mut dst = PlaneViewMut {
        data: &mut data,
        bounds,
        n_comps: 4,
    };
    apply_mask_mix::<f32>(&mut dst, None, None, bounds, true, false, 1.0);
    assert_eq!(data, vec![0.0; 4]);

    let mut data = one_pixel_dst([1.0, 1.0, 1.0, 1.0]);
    let mut dst = PlaneViewMut {
        data: &mut data,
        bounds,
        n_comps: 4,
    };
    apply_mask_mix::<f32>(&mut dst, None, None, bounds, true, true, 1.0);
    assert_eq!(data, vec![1.0; 4]);
}

#[test]
fn u8_blend_rounds_through_f32() {
    let bounds = rect(0, 0, 1, 1);
    let mut data = vec![200_u8, 100, 50, 255];
    let mut dst = PlaneViewMut {
        data: &mut data,
        bounds,
        n_comps: 4,
    };
    let orig = OriginalSnapshot {
        data: vec![0.0; 4],
        bounds,
        n_comps: 4,
    };
    apply_mask_mix(&mut dst, None, Some(&orig), bounds, false, false, 0.5);
    assert_eq!(data, vec![100, 50, 25, 127]);
}
