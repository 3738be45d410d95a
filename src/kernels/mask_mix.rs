use crate::foundation::core::RectI;
use crate::kernels::pixel::{Pixel, PlaneViewMut};

/// Normalized single-channel mask values over a region (mask pixel / max).
#[derive(Clone, Debug)]
pub(crate) struct MaskSnapshot {
    pub data: Vec<f32>,
    pub bounds: RectI,
}

impl MaskSnapshot {
    fn value(&self, x: i32, y: i32) -> Option<f32> {
        if !self.bounds.contains(x, y) {
            return None;
        }
        let idx =
            (y - self.bounds.y1) as usize * self.bounds.width() as usize + (x - self.bounds.x1) as usize;
        Some(self.data[idx])
    }
}

/// Raw channel values of the original image over a region, one f32 per
/// destination channel, `None` at pixels outside the original's bounds.
#[derive(Clone, Debug)]
pub(crate) struct OriginalSnapshot {
    pub data: Vec<f32>,
    pub bounds: RectI,
    pub n_comps: usize,
}

impl OriginalSnapshot {
    fn pixel(&self, x: i32, y: i32) -> Option<&[f32]> {
        if !self.bounds.contains(x, y) {
            return None;
        }
        let idx = ((y - self.bounds.y1) as usize * self.bounds.width() as usize
            + (x - self.bounds.x1) as usize)
            * self.n_comps;
        Some(&self.data[idx..idx + self.n_comps])
    }
}

/// Dissolve the destination toward the original image, optionally shaped by a
/// mask: `dst = dst * a + (1 - a) * original` with `a = mix * mask_scale`.
///
/// Without a mask image, `mask_scale` defaults to 1 when unmasked, and to
/// `mask_invert as f32` when masked. An absent original pixel blends toward
/// zero. `roi` must lie within `dst.bounds`.
pub(crate) fn apply_mask_mix<P: Pixel>(
    dst: &mut PlaneViewMut<'_, P>,
    mask: Option<&MaskSnapshot>,
    original: Option<&OriginalSnapshot>,
    roi: RectI,
    masked: bool,
    mask_invert: bool,
    mix: f32,
) {
    debug_assert!(dst.bounds.contains_rect(roi));

    let n = dst.n_comps;
    for y in roi.y1..roi.y2 {
        for x in roi.x1..roi.x2 {
            let mask_scale = if !masked {
                1.0
            } else {
                match mask.and_then(|m| m.value(x, y)) {
                    Some(v) => {
                        if mask_invert {
                            1.0 - v
                        } else {
                            v
                        }
                    }
                    None => {
                        if mask_invert {
                            1.0
                        } else {
                            0.0
                        }
                    }
                }
            };
            let alpha = mix * mask_scale;

            let orig_pix = original.and_then(|o| o.pixel(x, y));
            let Some(dst_pix) = dst.pixel_mut(x, y) else {
                continue;
            };
            for (c, d) in dst_pix.iter_mut().enumerate().take(n) {
                let orig = orig_pix.map(|o| o[c]).unwrap_or(0.0);
                let v = d.to_f32() * alpha + (1.0 - alpha) * orig;
                debug_assert!(!v.is_nan());
                *d = P::from_f32(v);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/mask_mix.rs"]
mod tests;
