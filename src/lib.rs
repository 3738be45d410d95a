//! Tessera is the render core of a node-based image compositor.
//!
//! A compositor graph is a DAG of effect nodes. Rendering one frame of it is
//! a two-phase affair:
//!
//! 1. **Request**: [`compute_request_pass`] walks the graph top-down from the
//!    viewed node and memoizes, per `(node, time, view)`, the region of
//!    definition, the identity status, the frames needed from each input and
//!    the union of every region of interest requested of the node
//!    ([`FrameRequestMap`]).
//! 2. **Render**: [`render_tree`] walks the same graph bottom-up, renders each
//!    node's accumulated region exactly once into its cache entry
//!    ([`Image`]), and only produces the rectangles the partial-render
//!    tracker ([`Bitmap`]) reports as missing.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic keys**: [`ImageKey`] identifies a cache entry by the
//!   node-configuration hash, time, scale and view, never by the region of
//!   definition, so an entry survives pan and zoom.
//! - **Grow-only requests**: a node's accumulated region of interest only
//!   ever grows within one pass, which is what makes overlapping downstream
//!   requests cheap.
//! - **Expensive hooks run once**: identity tests and regions of definition
//!   are computed a single time per `(node, time, view)` and looked up
//!   thereafter, including by the render driver.
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(missing_docs_in_private_items)]

mod cache;
mod foundation;
mod graph;
mod kernels;
mod render;
mod request;

pub use cache::bitmap::Bitmap;
pub use cache::image::{Image, ImagePremult, ReadAccess, WriteAccess};
pub use cache::key::ImageKey;
pub use cache::store::{ImageCache, MemoryImageCache};
pub use foundation::core::{
    Affine, CANONICAL_INFINITY, Point, RectD, RectI, RenderScale, TimeKey, Vec2, ViewIdx,
    canonical_to_pixel, rect_is_empty, rect_is_infinite, rect_union,
};
pub use foundation::error::{TesseraError, TesseraResult};
pub use graph::effect::{
    Effect, FrameRangeD, FrameRangesMap, FramesNeededMap, IdentityState, RenderArgs, RoIMap,
    TransformLink, ViewInvariance,
};
pub use graph::node::{NodeGraph, NodeId};
pub use kernels::pixel::{BitDepth, Pixel, PixelBuffer};
pub use request::frame_view::{FrameRequestMap, FrameViewRequest, NodeFrameRequest, RerouteTarget};
pub use request::propagate::{
    MAX_FRAMES_NEEDED_PREFETCH, PersistentMessage, RenderContext, compute_request_pass,
};
pub use render::{RenderTreeArgs, render_tree};
