use crate::foundation::core::RectI;
use crate::kernels::pixel::{Pixel, PlaneSnapshot, PlaneViewMut};

/// Resolved per-call flags for [`copy_unprocessed`].
///
/// `do_*` select the channels to copy back from the original image (the
/// channels the effect did *not* process); `premult` / `original_premult`
/// describe the alpha state of the destination and the original.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CopyUnprocessedParams {
    pub do_r: bool,
    pub do_g: bool,
    pub do_b: bool,
    pub do_a: bool,
    pub premult: bool,
    pub original_premult: bool,
}

/// Copy the non-processed channels of `src` into `dst` over `roi`, converting
/// between premultiplication states per channel.
///
/// `roi` must lie within `dst.bounds`. A missing `src` (or a pixel outside the
/// source bounds) contributes zero color and zero alpha.
pub(crate) fn copy_unprocessed<P: Pixel>(
    dst: &mut PlaneViewMut<'_, P>,
    src: Option<&PlaneSnapshot<P>>,
    roi: RectI,
    p: CopyUnprocessedParams,
) {
    debug_assert!(dst.bounds.contains_rect(roi));

    let dst_ncomps = dst.n_comps;
    let dst_alpha_idx = alpha_index(dst_ncomps);
    let src_ncomps = src.map(|s| s.n_comps).unwrap_or(0);
    let src_alpha_idx = alpha_index(src_ncomps);

    for y in roi.y1..roi.y2 {
        for x in roi.x1..roi.x2 {
            let src_pix = src.and_then(|s| s.pixel(x, y));

            // Opaque for sources without an alpha slot, transparent when the
            // source pixel is absent entirely.
            let src_a: f32 = match (src_pix, src_alpha_idx) {
                (Some(sp), Some(ai)) => sp[ai].to_f32(),
                (Some(_), None) => P::MAX_VALUE,
                (None, _) => 0.0,
            };

            let Some(dst_pix) = dst.pixel_mut(x, y) else {
                continue;
            };

            let dst_a_orig: f32 = match dst_alpha_idx {
                Some(ai) => dst_pix[ai].to_f32(),
                None => P::MAX_VALUE,
            };

            let copy_channel = |c: usize| -> P {
                let Some(sp) = src_pix else {
                    return P::from_f32(0.0);
                };
                if src_ncomps == 1 || c >= src_ncomps {
                    return P::from_f32(0.0);
                }
                let src_c = sp[c];
                if p.original_premult {
                    if src_a == 0.0 {
                        // Cannot safely unpremult, copy raw.
                        src_c
                    } else if p.premult {
                        if p.do_a {
                            // Destination will carry the source alpha, copy raw.
                            src_c
                        } else {
                            P::from_f32(src_c.to_f32() / src_a * dst_a_orig)
                        }
                    } else {
                        P::from_f32(src_c.to_f32() / src_a * P::MAX_VALUE)
                    }
                } else if p.premult {
                    if p.do_a {
                        P::from_f32(src_c.to_f32() / P::MAX_VALUE * src_a)
                    } else {
                        P::from_f32(src_c.to_f32() / P::MAX_VALUE * dst_a_orig)
                    }
                } else {
                    src_c
                }
            };

            if p.do_r && dst_ncomps >= 2 {
                dst_pix[0] = copy_channel(0);
                debug_assert!(!dst_pix[0].to_f32().is_nan());
            }
            if p.do_g && dst_ncomps >= 2 {
                dst_pix[1] = copy_channel(1);
                debug_assert!(!dst_pix[1].to_f32().is_nan());
            }
            if p.do_b && dst_ncomps >= 3 {
                dst_pix[2] = copy_channel(2);
                debug_assert!(!dst_pix[2].to_f32().is_nan());
            }
            if p.do_a {
                if p.premult && dst_a_orig != 0.0 {
                    // The destination alpha changes to the source alpha:
                    // re-premultiply the channels that keep their processed
                    // values so they stay consistent with the new alpha.
                    if dst_ncomps >= 2 && !p.do_r {
                        dst_pix[0] = P::from_f32(dst_pix[0].to_f32() / dst_a_orig * src_a);
                        debug_assert!(!dst_pix[0].to_f32().is_nan());
                    }
                    if dst_ncomps >= 2 && !p.do_g {
                        dst_pix[1] = P::from_f32(dst_pix[1].to_f32() / dst_a_orig * src_a);
                        debug_assert!(!dst_pix[1].to_f32().is_nan());
                    }
                    if dst_ncomps >= 3 && !p.do_b {
                        dst_pix[2] = P::from_f32(dst_pix[2].to_f32() / dst_a_orig * src_a);
                        debug_assert!(!dst_pix[2].to_f32().is_nan());
                    }
                }
                if let Some(ai) = dst_alpha_idx {
                    dst_pix[ai] = P::from_f32(src_a);
                    debug_assert!(!dst_pix[ai].to_f32().is_nan());
                }
            }
        }
    }
}

/// Index of the alpha channel for a component count, if the layout has one.
pub(crate) fn alpha_index(n_comps: usize) -> Option<usize> {
    match n_comps {
        1 => Some(0),
        4 => Some(3),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/copy_channels.rs"]
mod tests;
