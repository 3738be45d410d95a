use super::*;

fn rect(x1: i32, y1: i32, x2: i32, y2: i32) -> RectI {
    RectI::new(x1, y1, x2, y2).unwrap()
}

fn params(do_rgba: [bool; 4], premult: bool, original_premult: bool) -> CopyUnprocessedParams {
    CopyUnprocessedParams {
        do_r: do_rgba[0],
        do_g: do_rgba[1],
        do_b: do_rgba[2],
        do_a: do_rgba[3],
        premult,
        original_premult,
    }
}

#[test]
fn alpha_index_per_layout() {
    assert_eq!(alpha_index(1), Some(0));
    assert_eq!(alpha_index(2), None);
    assert_eq!(alpha_index(3), None);
    assert_eq!(alpha_index(4), Some(3));
}

#[test]
fn no_flags_leaves_destination_untouched() {
    let mut data = vec![0.1_f32, 0.2, 0.3, 0.4];
    let src_data = vec![0.9_f32, 0.9, 0.9, 0.9];
    let bounds = rect(0, 0, 1, 1);
    let mut dst = PlaneViewMut {
        data: &mut data,
        bounds,
        n_comps: 4,
    };
    let src = PlaneSnapshot {
        data: src_data,
        bounds,
        n_comps: 4,
    };
    copy_unprocessed(&mut dst, Some(&src), bounds, params([false; 4], false, false));
    assert_eq!(data, vec![0.1, 0.2, 0.3, 0.4]);
}

#[test]
fn raw_copy_when_both_unpremultiplied() {
    let mut data = vec![0.1_f32, 0.2, 0.3, 0.4];
    let src_data = vec![0.9_f32, 0.8, 0.7, 0.6];
    let bounds = rect(0, 0, 1, 1);
    let mut dst = PlaneViewMut {
        data: &mut data,
        bounds,
        n_comps: 4,
    };
    let src = PlaneSnapshot {
        data: src_data,
        bounds,
        n_comps: 4,
    };
    copy_unprocessed(
        &mut dst,
        Some(&src),
        bounds,
        params([false, true, true, false], false, false),
    );
    assert_eq!(data, vec![0.1, 0.8, 0.7, 0.4]);
}

#[test]
fn zero_source_alpha_copies_raw_instead_of_unpremult() {
    let mut data = vec![0.0_f32, 0.0, 0.0, 1.0];
    let src_data = vec![0.9_f32, 0.8, 0.7, 0.0];
    let bounds = rect(0, 0, 1, 1);
    let mut dst = PlaneViewMut {
        data: &mut data,
        bounds,
        n_comps: 4,
    };
    let src = PlaneSnapshot {
        data: src_data,
        bounds,
        n_comps: 4,
    };
    copy_unprocessed(
        &mut dst,
        Some(&src),
        bounds,
        params([true, true, true, false], false, true),
    );
    // Division by zero alpha is not attempted.
    assert_eq!(data, vec![0.9, 0.8, 0.7, 1.0]);
}

#[test]
fn premultiplied_destination_scales_by_its_own_alpha() {
    let mut data = vec![0.0_f32, 0.0, 0.0, 0.5];
    let src_data = vec![0.8_f32, 0.6, 0.4, 1.0];
    let bounds = rect(0, 0, 1, 1);
    let mut dst = PlaneViewMut {
        data: &mut data,
        bounds,
        n_comps: 4,
    };
    let src = PlaneSnapshot {
        data: src_data,
        bounds,
        n_comps: 4,
    };
    // Unpremultiplied source into a premultiplied destination, alpha kept.
    copy_unprocessed(
        &mut dst,
        Some(&src),
        bounds,
        params([true, true, true, false], true, false),
    );
    assert_eq!(data, vec![0.4, 0.3, 0.2, 0.5]);
}

#[test]
fn do_alpha_repremults_kept_channels() {
    // Destination is premultiplied with alpha 0.5; copying only the source
    // alpha (1.0) rescales the processed color to stay consistent.
    let mut data = vec![0.2_f32, 0.3, 0.4, 0.5];
    let src_data = vec![0.0_f32, 0.0, 0.0, 1.0];
    let bounds = rect(0, 0, 1, 1);
    let mut dst = PlaneViewMut {
        data: &mut data,
        bounds,
        n_comps: 4,
    };
    let src = PlaneSnapshot {
        data: src_data,
        bounds,
        n_comps: 4,
    };
    copy_unprocessed(
        &mut dst,
        Some(&src),
        bounds,
        params([false, false, false, true], true, false),
    );
    assert_eq!(data, vec![0.4, 0.6, 0.8, 1.0]);
}

#[test]
fn missing_source_writes_zero_and_transparent_alpha() {
    let mut data = vec![0.2_f32, 0.3, 0.4, 0.5];
    let bounds = rect(0, 0, 1, 1);
    let mut dst = PlaneViewMut {
        data: &mut data,
        bounds,
        n_comps: 4,
    };
    copy_unprocessed::<f32>(&mut dst, None, bounds, params([true; 4], false, false));
    assert_eq!(data, vec![0.0, 0.0, 0.0, 0.0]);
}

#[test]
fn single_channel_source_contributes_no_color() {
    let mut data = vec![0.2_f32, 0.3, 0.4, 0.5];
    let src_data = vec![0.9_f32];
    let bounds = rect(0, 0, 1, 1);
    let mut dst = PlaneViewMut {
        data: &mut data,
        bounds,
        n_comps: 4,
    };
    let src = PlaneSnapshot {
        data: src_data,
        bounds,
        n_comps: 1,
    };
    copy_unprocessed(
        &mut dst,
        Some(&src),
        bounds,
        params([true, true, true, true], false, false),
    );
    // Color channels zero; alpha comes from the source's single channel.
    assert_eq!(data, vec![0.0, 0.0, 0.0, 0.9]);
}

#[test]
fn u8_values_convert_through_f32_with_clamping() {
    let mut data = vec![0_u8, 0, 0, 128];
    let src_data = vec![200_u8, 100, 50, 255];
    let bounds = rect(0, 0, 1, 1);
    let mut dst = PlaneViewMut {
        data: &mut data,
        bounds,
        n_comps: 4,
    };
    let src = PlaneSnapshot {
        data: src_data,
        bounds,
        n_comps: 4,
    };
    copy_unprocessed(
        &mut dst,
        Some(&src),
        bounds,
        params([true, true, true, true], false, false),
    );
    assert_eq!(data, vec![200, 100, 50, 255]);
}
