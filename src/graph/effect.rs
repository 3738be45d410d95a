use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cache::image::Image;
use crate::foundation::core::{Affine, RectD, RectI, RenderScale, ViewIdx};
use crate::foundation::error::TesseraResult;

/// Inclusive frame range an effect needs from an input.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameRangeD {
    /// First frame time of the range.
    pub min: f64,
    /// Last frame time of the range.
    pub max: f64,
}

impl FrameRangeD {
    /// A range covering exactly one time.
    pub fn single(time: f64) -> Self {
        Self { min: time, max: time }
    }
}

/// Per-view frame ranges needed from one input.
pub type FrameRangesMap = BTreeMap<ViewIdx, Vec<FrameRangeD>>;

/// Frames needed upstream, per input index.
pub type FramesNeededMap = BTreeMap<usize, FrameRangesMap>;

/// Canonical region of interest requested from each input.
pub type RoIMap = BTreeMap<usize, RectD>;

/// Outcome of an effect's identity test for one render window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IdentityState {
    /// The effect produces its own pixels.
    NotIdentity,
    /// Output is identical to this same node at another time (and view 0 for
    /// view-invariant effects).
    SelfTime {
        /// Time the output is taken from.
        time: f64,
    },
    /// Output is identical to an input at the given time and view.
    Input {
        /// Input slot the output is taken from.
        input: usize,
        /// Time the input is sampled at.
        time: f64,
        /// View the input is sampled at.
        view: ViewIdx,
    },
}

/// Whether an effect's output depends on the requested view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewInvariance {
    /// Output differs across views.
    Varying,
    /// Output is mathematically identical for every view.
    AllViewsInvariant,
}

/// One link of an affine transform chain that can be concatenated across
/// nodes: pixels for this node are really produced by `input`, displaced by
/// `transform` (a map from this node's canonical space into the input's).
#[derive(Clone, Copy, Debug)]
pub struct TransformLink {
    /// Input slot the chain continues into.
    pub input: usize,
    /// Map from this node's canonical space into the input's.
    pub transform: Affine,
}

/// Arguments handed to [`Effect::render`] for one rectangle of missing
/// pixels.
pub struct RenderArgs<'a> {
    /// Frame time being rendered.
    pub time: f64,
    /// View being rendered.
    pub view: ViewIdx,
    /// Render scale of the output.
    pub scale: RenderScale,
    /// Pixel rectangle to produce, within the output's bounds.
    pub roi: RectI,
    /// Pre-rendered upstream images, keyed by input index.
    pub inputs: &'a BTreeMap<usize, Vec<Arc<Image>>>,
    /// Destination cache entry.
    pub output: &'a Image,
}

/// Capability interface of one effect in the node graph.
///
/// The graph hands these hooks to the request-propagation pass and the render
/// driver; everything about parameters, plugins and UI stays behind this
/// trait. Hooks that most effects never customize have defaults.
pub trait Effect: Send + Sync {
    /// Full canonical extent this effect can produce at `(time, scale, view)`.
    fn region_of_definition(
        &self,
        node_hash: u64,
        time: f64,
        scale: RenderScale,
        view: ViewIdx,
    ) -> TesseraResult<RectD>;

    /// Identity test over a pixel window. Called at most once per
    /// `(node, time, view)` within a request pass.
    fn is_identity(
        &self,
        _node_hash: u64,
        _time: f64,
        _scale: RenderScale,
        _pixel_window: RectI,
        _view: ViewIdx,
    ) -> TesseraResult<IdentityState> {
        Ok(IdentityState::NotIdentity)
    }

    /// Frames needed from each input to produce one frame of output. The
    /// default needs every input at the current time and view.
    fn frames_needed(
        &self,
        _node_hash: u64,
        time: f64,
        view: ViewIdx,
        _mip_map_level: u32,
        n_inputs: usize,
    ) -> FramesNeededMap {
        (0..n_inputs)
            .map(|input| {
                let mut per_view = FrameRangesMap::new();
                per_view.insert(view, vec![FrameRangeD::single(time)]);
                (input, per_view)
            })
            .collect()
    }

    /// Canonical region each input must produce for this render window. The
    /// default requests the window itself from every input.
    fn regions_of_interest(
        &self,
        _time: f64,
        _scale: RenderScale,
        _rod: RectD,
        window: RectD,
        _view: ViewIdx,
        n_inputs: usize,
    ) -> RoIMap {
        (0..n_inputs).map(|input| (input, window)).collect()
    }

    /// Whether the output depends on the requested view.
    fn view_invariance(&self) -> ViewInvariance {
        ViewInvariance::Varying
    }

    /// Whether the given input slot is a mask input.
    fn is_input_mask(&self, _input: usize) -> bool {
        false
    }

    /// Whether a mask input is currently enabled.
    fn is_mask_enabled(&self, _input: usize) -> bool {
        true
    }

    /// Channel the mask reads from, `None` when the mask resolves to
    /// "no mask" and the input can be skipped entirely.
    fn mask_channel(&self, _input: usize) -> Option<usize> {
        Some(3)
    }

    /// Affine link for transform concatenation, when this effect is a pure
    /// transform that can be folded into its input chain.
    fn concatenated_transform(&self, _time: f64, _view: ViewIdx) -> Option<TransformLink> {
        None
    }

    /// Produce pixels for one missing rectangle. The default leaves the
    /// zero-initialized buffer untouched.
    fn render(&self, _args: RenderArgs<'_>) -> TesseraResult<()> {
        Ok(())
    }
}
