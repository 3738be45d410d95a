use crate::foundation::core::RectI;

/// Storage bit depth of an image buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BitDepth {
    /// 8-bit unsigned integer channels.
    U8,
    /// 16-bit unsigned integer channels.
    U16,
    /// 32-bit float channels.
    F32,
}

impl BitDepth {
    /// Bytes per channel value.
    pub fn size_of(self) -> usize {
        match self {
            BitDepth::U8 => 1,
            BitDepth::U16 => 2,
            BitDepth::F32 => 4,
        }
    }
}

/// Interleaved pixel storage at one of the supported bit depths.
///
/// Kernels are written once as generic loop bodies over [`Pixel`] and
/// dispatched at runtime over the depth; the cross product is small and the
/// inner loop is what matters.
#[derive(Clone, Debug)]
pub enum PixelBuffer {
    /// 8-bit storage.
    U8(Vec<u8>),
    /// 16-bit storage.
    U16(Vec<u16>),
    /// Float storage.
    F32(Vec<f32>),
}

impl PixelBuffer {
    pub(crate) fn new(depth: BitDepth, len: usize) -> Self {
        match depth {
            BitDepth::U8 => PixelBuffer::U8(vec![0; len]),
            BitDepth::U16 => PixelBuffer::U16(vec![0; len]),
            BitDepth::F32 => PixelBuffer::F32(vec![0.0; len]),
        }
    }

}

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for f32 {}
}

/// A storable channel value: u8, u16 or f32.
pub trait Pixel: Copy + Send + Sync + PartialEq + std::fmt::Debug + sealed::Sealed + 'static {
    /// Channel value representing full intensity / opaque alpha.
    const MAX_VALUE: f32;
    /// The [`BitDepth`] this channel type stores.
    const DEPTH: BitDepth;

    /// Widen to f32 without rescaling.
    fn to_f32(self) -> f32;
    /// Convert back from f32, clamping to the representable range for
    /// integer depths.
    fn from_f32(v: f32) -> Self;

    /// The buffer's slice at this depth, or `None` on a depth mismatch.
    fn plane(buf: &PixelBuffer) -> Option<&[Self]>;
    /// Mutable variant of [`Pixel::plane`].
    fn plane_mut(buf: &mut PixelBuffer) -> Option<&mut [Self]>;
}

impl Pixel for u8 {
    const MAX_VALUE: f32 = 255.0;
    const DEPTH: BitDepth = BitDepth::U8;

    fn to_f32(self) -> f32 {
        f32::from(self)
    }

    fn from_f32(v: f32) -> Self {
        v.clamp(0.0, Self::MAX_VALUE) as u8
    }

    fn plane(buf: &PixelBuffer) -> Option<&[Self]> {
        match buf {
            PixelBuffer::U8(d) => Some(d),
            _ => None,
        }
    }

    fn plane_mut(buf: &mut PixelBuffer) -> Option<&mut [Self]> {
        match buf {
            PixelBuffer::U8(d) => Some(d),
            _ => None,
        }
    }
}

impl Pixel for u16 {
    const MAX_VALUE: f32 = 65535.0;
    const DEPTH: BitDepth = BitDepth::U16;

    fn to_f32(self) -> f32 {
        f32::from(self)
    }

    fn from_f32(v: f32) -> Self {
        v.clamp(0.0, Self::MAX_VALUE) as u16
    }

    fn plane(buf: &PixelBuffer) -> Option<&[Self]> {
        match buf {
            PixelBuffer::U16(d) => Some(d),
            _ => None,
        }
    }

    fn plane_mut(buf: &mut PixelBuffer) -> Option<&mut [Self]> {
        match buf {
            PixelBuffer::U16(d) => Some(d),
            _ => None,
        }
    }
}

impl Pixel for f32 {
    const MAX_VALUE: f32 = 1.0;
    const DEPTH: BitDepth = BitDepth::F32;

    fn to_f32(self) -> f32 {
        self
    }

    fn from_f32(v: f32) -> Self {
        v
    }

    fn plane(buf: &PixelBuffer) -> Option<&[Self]> {
        match buf {
            PixelBuffer::F32(d) => Some(d),
            _ => None,
        }
    }

    fn plane_mut(buf: &mut PixelBuffer) -> Option<&mut [Self]> {
        match buf {
            PixelBuffer::F32(d) => Some(d),
            _ => None,
        }
    }
}

/// Borrowed mutable view over an interleaved plane, used by the kernel loop
/// bodies.
pub(crate) struct PlaneViewMut<'a, P> {
    pub data: &'a mut [P],
    pub bounds: RectI,
    pub n_comps: usize,
}

impl<'a, P: Pixel> PlaneViewMut<'a, P> {
    pub fn pixel_mut(&mut self, x: i32, y: i32) -> Option<&mut [P]> {
        if !self.bounds.contains(x, y) {
            return None;
        }
        let n = self.n_comps;
        let idx = pixel_index(self.bounds, n, x, y);
        Some(&mut self.data[idx..idx + n])
    }
}

/// Owned copy of a plane region, taken before a kernel acquires the exclusive
/// lock on its destination (no nested lock acquisition, no aliasing hazard).
#[derive(Clone, Debug)]
pub(crate) struct PlaneSnapshot<P> {
    pub data: Vec<P>,
    pub bounds: RectI,
    pub n_comps: usize,
}

impl<P: Pixel> PlaneSnapshot<P> {
    pub fn pixel(&self, x: i32, y: i32) -> Option<&[P]> {
        if !self.bounds.contains(x, y) {
            return None;
        }
        let idx = pixel_index(self.bounds, self.n_comps, x, y);
        Some(&self.data[idx..idx + self.n_comps])
    }
}

pub(crate) fn pixel_index(bounds: RectI, n_comps: usize, x: i32, y: i32) -> usize {
    debug_assert!(bounds.contains(x, y));
    ((y - bounds.y1) as usize * bounds.width() as usize + (x - bounds.x1) as usize) * n_comps
}
