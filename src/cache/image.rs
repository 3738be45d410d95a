use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::cache::bitmap::Bitmap;
use crate::cache::key::ImageKey;
use crate::foundation::core::{RectI, RenderScale, ViewIdx};
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::kernels::copy_channels::{CopyUnprocessedParams, alpha_index, copy_unprocessed};
use crate::kernels::mask_mix::{MaskSnapshot, OriginalSnapshot, apply_mask_mix};
use crate::kernels::pixel::{
    BitDepth, Pixel, PixelBuffer, PlaneSnapshot, PlaneViewMut, pixel_index,
};

/// Premultiplication state of an image's color channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ImagePremult {
    /// Alpha is 1 everywhere; premultiplied and unpremultiplied coincide.
    Opaque,
    /// Color channels are multiplied by alpha.
    Premultiplied,
    /// Color channels are straight.
    UnPremultiplied,
}

struct Inner {
    bounds: RectI,
    pixels: PixelBuffer,
    bitmap: Bitmap,
}

/// One cache entry: an interleaved pixel buffer for one region of definition
/// at one `(node, time, scale, view)`, together with the tracker of which
/// parts of it have been rendered.
///
/// All pixel and tracker mutation goes through one internal read/write lock:
/// concurrent `get_rest_to_render` / `mark_for_rendered` / compositing calls
/// on the same entry are linearizable. The cache container's contract (one
/// concurrent producer per key) is not enforced here.
pub struct Image {
    key: ImageKey,
    depth: BitDepth,
    n_comps: usize,
    inner: RwLock<Inner>,
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("key", &self.key)
            .field("depth", &self.depth)
            .field("n_comps", &self.n_comps)
            .finish_non_exhaustive()
    }
}

impl Image {
    /// Allocate a zeroed entry over `key.rod`, nothing rendered yet.
    ///
    /// Fails only on invalid parameters; allocation failure aborts the
    /// process as everywhere else in Rust.
    pub fn create(key: ImageKey, depth: BitDepth, n_comps: usize) -> TesseraResult<Self> {
        if n_comps == 0 || n_comps > 4 {
            return Err(TesseraError::validation(
                "Image requires 1 to 4 components",
            ));
        }
        let bounds = key.rod;
        let len = bounds.area() as usize * n_comps;
        Ok(Self {
            key,
            depth,
            n_comps,
            inner: RwLock::new(Inner {
                bounds,
                pixels: PixelBuffer::new(depth, len),
                bitmap: Bitmap::new(bounds),
            }),
        })
    }

    /// A local, uncached scratch image whose lifetime is owner-managed.
    pub fn local(
        bounds: RectI,
        scale: RenderScale,
        depth: BitDepth,
        n_comps: usize,
    ) -> TesseraResult<Self> {
        Self::create(
            ImageKey::new(0, 0.0, scale, ViewIdx::MAIN, bounds),
            depth,
            n_comps,
        )
    }

    /// The cache key this entry is stored under.
    pub fn key(&self) -> &ImageKey {
        &self.key
    }

    /// Region of definition the entry was created with. The live bounds may
    /// have grown since, see [`Image::bounds`].
    pub fn rod(&self) -> RectI {
        self.key.rod
    }

    /// Current live bounds, including any growth since creation.
    pub fn bounds(&self) -> RectI {
        self.read_inner().bounds
    }

    /// Storage depth of the pixel buffer.
    pub fn bit_depth(&self) -> BitDepth {
        self.depth
    }

    /// Interleaved channels per pixel (1 to 4).
    pub fn components_count(&self) -> usize {
        self.n_comps
    }

    /// Render scale the entry was produced at.
    pub fn scale(&self) -> RenderScale {
        self.key.scale
    }

    /// What is left to render within `roi`. The returned rectangles are
    /// owned copies, valid after the internal lock is released.
    pub fn get_rest_to_render(&self, roi: RectI) -> Vec<RectI> {
        self.read_inner().bitmap.non_marked_rects(roi)
    }

    /// Bounding box of what is left to render within `roi`.
    pub fn get_rest_to_render_bbox(&self, roi: RectI) -> Option<RectI> {
        self.read_inner().bitmap.non_marked_bbox(roi)
    }

    /// Record that `roi` has been rendered.
    pub fn mark_for_rendered(&self, roi: RectI) {
        self.write_inner().bitmap.mark_rendered(roi);
    }

    /// Number of pixels marked rendered so far.
    pub fn rendered_pixel_count(&self) -> u64 {
        self.read_inner().bitmap.rendered_pixel_count()
    }

    /// Shared access for the duration of a pixel loop.
    pub fn read(&self) -> ReadAccess<'_> {
        ReadAccess {
            guard: self.read_inner(),
            n_comps: self.n_comps,
        }
    }

    /// Exclusive access for the duration of a pixel loop.
    pub fn write(&self) -> WriteAccess<'_> {
        WriteAccess {
            guard: self.write_inner(),
            n_comps: self.n_comps,
        }
    }

    /// Fill `roi` with a constant color and alpha (normalized `[0, 1]`
    /// values, scaled to the storage depth). Single-channel images take only
    /// the alpha value.
    pub fn fill(&self, roi: RectI, r: f32, g: f32, b: f32, a: f32) {
        let mut inner = self.write_inner();
        let Some(roi) = roi.intersect(inner.bounds) else {
            return;
        };
        let n_comps = self.n_comps;
        match self.depth {
            BitDepth::U8 => fill_impl::<u8>(&mut inner, n_comps, roi, [r, g, b, a]),
            BitDepth::U16 => fill_impl::<u16>(&mut inner, n_comps, roi, [r, g, b, a]),
            BitDepth::F32 => fill_impl::<f32>(&mut inner, n_comps, roi, [r, g, b, a]),
        }
    }

    /// Short for `fill(roi, 0, 0, 0, 0)`.
    pub fn fill_zero(&self, roi: RectI) {
        self.fill(roi, 0.0, 0.0, 0.0, 0.0);
    }

    /// Zero out the whole buffer.
    pub fn default_initialize(&self) {
        self.fill_zero(self.bounds());
    }

    /// Grow the bounds to contain `roi`, preserving pixels and rendered
    /// marks. The key's `rod` keeps its creation value.
    pub fn ensure_bounds(&self, roi: RectI) {
        let mut inner = self.write_inner();
        if inner.bounds.contains_rect(roi) {
            return;
        }
        let new_bounds = inner.bounds.merge(roi);
        let n_comps = self.n_comps;
        match self.depth {
            BitDepth::U8 => grow_impl::<u8>(&mut inner, n_comps, new_bounds),
            BitDepth::U16 => grow_impl::<u16>(&mut inner, n_comps, new_bounds),
            BitDepth::F32 => grow_impl::<f32>(&mut inner, n_comps, new_bounds),
        }
        let mut bitmap = Bitmap::new(new_bounds);
        bitmap.transfer_marks(&inner.bitmap);
        inner.bitmap = bitmap;
        inner.bounds = new_bounds;
    }

    /// Replace non-finite float values in `roi` with zero. Returns whether
    /// anything was fixed. Integer depths never hold NaNs.
    pub fn check_for_nans(&self, roi: RectI) -> bool {
        let mut inner = self.write_inner();
        let Some(roi) = roi.intersect(inner.bounds) else {
            return false;
        };
        let bounds = inner.bounds;
        let n_comps = self.n_comps;
        let PixelBuffer::F32(data) = &mut inner.pixels else {
            return false;
        };
        let mut fixed = false;
        for y in roi.y1..roi.y2 {
            let start = pixel_index(bounds, n_comps, roi.x1, y);
            let end = pixel_index(bounds, n_comps, roi.x2 - 1, y) + n_comps;
            for v in &mut data[start..end] {
                if !v.is_finite() {
                    *v = 0.0;
                    fixed = true;
                }
            }
        }
        fixed
    }

    /// Whether [`Image::copy_unprocessed_channels`] would do anything for the
    /// given processed-channel mask: false when every channel meaningful for
    /// this image's component count is processed.
    pub fn can_call_copy_unprocessed_channels(&self, process: [bool; 4]) -> bool {
        !relevant_channels(self.n_comps).iter().all(|&c| process[c])
    }

    /// Copy the channels NOT selected by `process` from `original` into this
    /// image over `roi`, converting premultiplication state.
    ///
    /// No-op when every relevant channel is processed. A mismatched render
    /// scale or bit depth between the two images logs a warning and skips the
    /// operation without mutating anything. `original` may alias `self`; the
    /// source region is snapshotted before the exclusive lock is taken, so no
    /// nested lock acquisition ever happens.
    pub fn copy_unprocessed_channels(
        &self,
        roi: RectI,
        premult: ImagePremult,
        original_premult: ImagePremult,
        process: [bool; 4],
        original: Option<&Image>,
        ignore_premult: bool,
    ) -> TesseraResult<()> {
        if !self.can_call_copy_unprocessed_channels(process) {
            return Ok(());
        }
        if let Some(orig) = original {
            if !scales_match(self.key.scale, orig.key.scale) {
                tracing::warn!(
                    "copy_unprocessed_channels: render scale mismatch, skipping"
                );
                return Ok(());
            }
            if orig.depth != self.depth {
                tracing::warn!("copy_unprocessed_channels: bit depth mismatch, skipping");
                return Ok(());
            }
        }

        let (do_r, do_g, do_b, do_a) = match self.n_comps {
            1 => (false, false, false, !process[3]),
            2 => (!process[0], !process[1], false, false),
            3 => (!process[0], !process[1], !process[2], false),
            _ => (!process[0], !process[1], !process[2], !process[3]),
        };
        let (premult, original_premult) = if ignore_premult {
            (false, false)
        } else {
            (
                premult == ImagePremult::Premultiplied,
                original_premult == ImagePremult::Premultiplied,
            )
        };
        let params = CopyUnprocessedParams {
            do_r,
            do_g,
            do_b,
            do_a,
            premult,
            original_premult,
        };

        match self.depth {
            BitDepth::U8 => self.copy_unprocessed_impl::<u8>(roi, original, params),
            BitDepth::U16 => self.copy_unprocessed_impl::<u16>(roi, original, params),
            BitDepth::F32 => self.copy_unprocessed_impl::<f32>(roi, original, params),
        }
        Ok(())
    }

    fn copy_unprocessed_impl<P: Pixel>(
        &self,
        roi: RectI,
        original: Option<&Image>,
        params: CopyUnprocessedParams,
    ) {
        let src = original.and_then(|img| snapshot_plane::<P>(img, roi));
        let mut inner = self.write_inner();
        let Some(roi) = roi.intersect(inner.bounds) else {
            return;
        };
        let bounds = inner.bounds;
        let Some(data) = P::plane_mut(&mut inner.pixels) else {
            return;
        };
        let mut dst = PlaneViewMut {
            data,
            bounds,
            n_comps: self.n_comps,
        };
        copy_unprocessed(&mut dst, src.as_ref(), roi, params);
    }

    /// Dissolve this image toward `original` over `roi`, shaped by `mask`:
    /// `dst = dst * a + (1 - a) * original`, `a = mix * mask_scale`.
    ///
    /// No-op when `!masked && mix == 1`. Scale mismatches between this image
    /// and the mask or original log a warning and skip the operation. Either
    /// source may alias `self` (snapshot-before-lock, as for
    /// [`Image::copy_unprocessed_channels`]).
    pub fn apply_mask_mix(
        &self,
        roi: RectI,
        mask: Option<&Image>,
        original: Option<&Image>,
        masked: bool,
        mask_invert: bool,
        mix: f32,
    ) -> TesseraResult<()> {
        if !masked && mix == 1.0 {
            return Ok(());
        }
        for (name, img) in [("mask", mask), ("original", original)] {
            if let Some(img) = img
                && !scales_match(self.key.scale, img.key.scale)
            {
                tracing::warn!(source = name, "apply_mask_mix: render scale mismatch, skipping");
                return Ok(());
            }
        }
        if let Some(orig) = original
            && orig.depth != self.depth
        {
            tracing::warn!("apply_mask_mix: original bit depth mismatch, skipping");
            return Ok(());
        }

        let mask_snap = if masked {
            mask.and_then(|m| snapshot_mask(m, roi))
        } else {
            None
        };
        let orig_snap = original.and_then(|o| snapshot_original(o, roi, self.n_comps));

        let mut inner = self.write_inner();
        let Some(roi) = roi.intersect(inner.bounds) else {
            return Ok(());
        };
        let bounds = inner.bounds;
        let n_comps = self.n_comps;
        match self.depth {
            BitDepth::U8 => {
                if let Some(data) = u8::plane_mut(&mut inner.pixels) {
                    let mut dst = PlaneViewMut { data, bounds, n_comps };
                    apply_mask_mix(
                        &mut dst,
                        mask_snap.as_ref(),
                        orig_snap.as_ref(),
                        roi,
                        masked,
                        mask_invert,
                        mix,
                    );
                }
            }
            BitDepth::U16 => {
                if let Some(data) = u16::plane_mut(&mut inner.pixels) {
                    let mut dst = PlaneViewMut { data, bounds, n_comps };
                    apply_mask_mix(
                        &mut dst,
                        mask_snap.as_ref(),
                        orig_snap.as_ref(),
                        roi,
                        masked,
                        mask_invert,
                        mix,
                    );
                }
            }
            BitDepth::F32 => {
                if let Some(data) = f32::plane_mut(&mut inner.pixels) {
                    let mut dst = PlaneViewMut { data, bounds, n_comps };
                    apply_mask_mix(
                        &mut dst,
                        mask_snap.as_ref(),
                        orig_snap.as_ref(),
                        roi,
                        masked,
                        mask_invert,
                        mix,
                    );
                }
            }
        }
        Ok(())
    }

    fn read_inner(&self) -> RwLockReadGuard<'_, Inner> {
        match self.inner.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, Inner> {
        match self.inner.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Scoped shared access to an image's pixels. Holds the internal lock for its
/// whole lifetime, releasing it on every exit path.
pub struct ReadAccess<'a> {
    guard: RwLockReadGuard<'a, Inner>,
    n_comps: usize,
}

impl ReadAccess<'_> {
    /// Bounds of the locked buffer.
    pub fn bounds(&self) -> RectI {
        self.guard.bounds
    }

    /// Channel slice at `(x, y)`, or `None` outside the bounds or at a
    /// mismatched depth. Callers are expected to intersect with the bounds
    /// first; the `None` path is not an error condition.
    pub fn pixel<P: Pixel>(&self, x: i32, y: i32) -> Option<&[P]> {
        if !self.guard.bounds.contains(x, y) {
            return None;
        }
        let data = P::plane(&self.guard.pixels)?;
        let idx = pixel_index(self.guard.bounds, self.n_comps, x, y);
        Some(&data[idx..idx + self.n_comps])
    }
}

/// Scoped exclusive access to an image's pixels.
pub struct WriteAccess<'a> {
    guard: RwLockWriteGuard<'a, Inner>,
    n_comps: usize,
}

impl WriteAccess<'_> {
    /// Bounds of the locked buffer.
    pub fn bounds(&self) -> RectI {
        self.guard.bounds
    }

    /// Channel slice at `(x, y)`, or `None` outside the bounds or at a
    /// mismatched depth.
    pub fn pixel<P: Pixel>(&self, x: i32, y: i32) -> Option<&[P]> {
        if !self.guard.bounds.contains(x, y) {
            return None;
        }
        let data = P::plane(&self.guard.pixels)?;
        let idx = pixel_index(self.guard.bounds, self.n_comps, x, y);
        Some(&data[idx..idx + self.n_comps])
    }

    /// Mutable channel slice at `(x, y)`, or `None` outside the bounds or at
    /// a mismatched depth.
    pub fn pixel_mut<P: Pixel>(&mut self, x: i32, y: i32) -> Option<&mut [P]> {
        if !self.guard.bounds.contains(x, y) {
            return None;
        }
        let n = self.n_comps;
        let bounds = self.guard.bounds;
        let data = P::plane_mut(&mut self.guard.pixels)?;
        let idx = pixel_index(bounds, n, x, y);
        Some(&mut data[idx..idx + n])
    }
}

fn scales_match(a: RenderScale, b: RenderScale) -> bool {
    a.x.to_bits() == b.x.to_bits() && a.y.to_bits() == b.y.to_bits()
}

fn relevant_channels(n_comps: usize) -> &'static [usize] {
    match n_comps {
        1 => &[3],
        2 => &[0, 1],
        3 => &[0, 1, 2],
        _ => &[0, 1, 2, 3],
    }
}

fn fill_impl<P: Pixel>(inner: &mut Inner, n_comps: usize, roi: RectI, rgba: [f32; 4]) {
    let bounds = inner.bounds;
    let Some(data) = P::plane_mut(&mut inner.pixels) else {
        return;
    };
    let mut values = [P::from_f32(0.0); 4];
    for (c, v) in values.iter_mut().enumerate().take(n_comps) {
        let norm = if n_comps == 1 {
            rgba[3]
        } else if c < 3 {
            rgba[c]
        } else {
            rgba[3]
        };
        *v = P::from_f32(norm * P::MAX_VALUE);
    }
    for y in roi.y1..roi.y2 {
        let start = pixel_index(bounds, n_comps, roi.x1, y);
        let end = pixel_index(bounds, n_comps, roi.x2 - 1, y) + n_comps;
        for px in data[start..end].chunks_exact_mut(n_comps) {
            px.copy_from_slice(&values[..n_comps]);
        }
    }
}

fn grow_impl<P: Pixel>(inner: &mut Inner, n_comps: usize, new_bounds: RectI) {
    let old_bounds = inner.bounds;
    let mut grown = PixelBuffer::new(P::DEPTH, new_bounds.area() as usize * n_comps);
    {
        let Some(old) = P::plane(&inner.pixels) else {
            return;
        };
        let Some(new) = P::plane_mut(&mut grown) else {
            return;
        };
        for y in old_bounds.y1..old_bounds.y2 {
            if old_bounds.width() == 0 {
                break;
            }
            let src_start = pixel_index(old_bounds, n_comps, old_bounds.x1, y);
            let src_end = src_start + old_bounds.width() as usize * n_comps;
            let dst_start = pixel_index(new_bounds, n_comps, old_bounds.x1, y);
            let dst_end = dst_start + old_bounds.width() as usize * n_comps;
            new[dst_start..dst_end].copy_from_slice(&old[src_start..src_end]);
        }
    }
    inner.pixels = grown;
}

fn snapshot_plane<P: Pixel>(img: &Image, roi: RectI) -> Option<PlaneSnapshot<P>> {
    let inner = img.read_inner();
    let roi = roi.intersect(inner.bounds)?;
    let data = P::plane(&inner.pixels)?;
    let n = img.n_comps;
    let mut out = Vec::with_capacity(roi.area() as usize * n);
    for y in roi.y1..roi.y2 {
        let start = pixel_index(inner.bounds, n, roi.x1, y);
        let end = pixel_index(inner.bounds, n, roi.x2 - 1, y) + n;
        out.extend_from_slice(&data[start..end]);
    }
    Some(PlaneSnapshot {
        data: out,
        bounds: roi,
        n_comps: n,
    })
}

/// Snapshot of a mask region as normalized values, taken from the mask's
/// alpha slot (or its last channel when the layout has no alpha).
fn snapshot_mask(img: &Image, roi: RectI) -> Option<MaskSnapshot> {
    let channel = alpha_index(img.n_comps).unwrap_or(img.n_comps - 1);
    let values = snapshot_normalized(img, roi, channel)?;
    Some(values)
}

fn snapshot_normalized(img: &Image, roi: RectI, channel: usize) -> Option<MaskSnapshot> {
    let inner = img.read_inner();
    let roi = roi.intersect(inner.bounds)?;
    let n = img.n_comps;
    let mut out = Vec::with_capacity(roi.area() as usize);
    let mut push_all = |read: &mut dyn FnMut(usize) -> f32, max: f32| {
        for y in roi.y1..roi.y2 {
            for x in roi.x1..roi.x2 {
                let idx = pixel_index(inner.bounds, n, x, y) + channel;
                out.push(read(idx) / max);
            }
        }
    };
    match &inner.pixels {
        PixelBuffer::U8(d) => push_all(&mut |i| f32::from(d[i]), u8::MAX_VALUE),
        PixelBuffer::U16(d) => push_all(&mut |i| f32::from(d[i]), u16::MAX_VALUE),
        PixelBuffer::F32(d) => push_all(&mut |i| d[i], f32::MAX_VALUE),
    }
    Some(MaskSnapshot {
        data: out,
        bounds: roi,
    })
}

/// Snapshot of the original image's raw channel values as f32, padded with
/// zeros up to `n_comps` channels.
fn snapshot_original(img: &Image, roi: RectI, n_comps: usize) -> Option<OriginalSnapshot> {
    let inner = img.read_inner();
    let roi = roi.intersect(inner.bounds)?;
    let src_n = img.n_comps;
    let mut out = Vec::with_capacity(roi.area() as usize * n_comps);
    let mut push_all = |read: &mut dyn FnMut(usize) -> f32| {
        for y in roi.y1..roi.y2 {
            for x in roi.x1..roi.x2 {
                let idx = pixel_index(inner.bounds, src_n, x, y);
                for c in 0..n_comps {
                    out.push(if c < src_n { read(idx + c) } else { 0.0 });
                }
            }
        }
    };
    match &inner.pixels {
        PixelBuffer::U8(d) => push_all(&mut |i| f32::from(d[i])),
        PixelBuffer::U16(d) => push_all(&mut |i| f32::from(d[i])),
        PixelBuffer::F32(d) => push_all(&mut |i| d[i]),
    }
    Some(OriginalSnapshot {
        data: out,
        bounds: roi,
        n_comps,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/cache/image.rs"]
mod tests;
