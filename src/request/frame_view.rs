use std::collections::HashMap;

use crate::foundation::core::{Affine, RectD, RenderScale, TimeKey, ViewIdx, rect_union};
use crate::graph::effect::{FramesNeededMap, IdentityState};
use crate::graph::node::NodeId;

/// Substitution recorded when a transform chain reroutes an input: pixels for
/// the input slot are really pulled from `node`, with `transform` mapping the
/// requesting node's canonical space into that producer's space.
#[derive(Clone, Copy, Debug)]
pub struct RerouteTarget {
    /// Actual upstream producer.
    pub node: NodeId,
    /// Concatenated affine along the chain.
    pub transform: Affine,
}

/// Outcome of folding a new render window into a memoized request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RoiGrowth {
    /// The window was already covered; nothing new to render upstream.
    Contained,
    /// The accumulated region grew and the request must recurse.
    Grew,
}

/// Memo for one `(node, time, view)`: everything the request pass computes
/// exactly once, plus the accumulated region of interest.
#[derive(Clone, Debug)]
pub struct FrameViewRequest {
    rod: RectD,
    identity: IdentityState,
    frames_needed: FramesNeededMap,
    reroutes: HashMap<usize, RerouteTarget>,
    final_roi: Option<RectD>,
}

impl FrameViewRequest {
    pub(crate) fn new(
        rod: RectD,
        identity: IdentityState,
        frames_needed: FramesNeededMap,
        reroutes: HashMap<usize, RerouteTarget>,
    ) -> Self {
        Self {
            rod,
            identity,
            frames_needed,
            reroutes,
            final_roi: None,
        }
    }

    /// Region of definition at this `(time, view)`, computed once.
    pub fn rod(&self) -> RectD {
        self.rod
    }

    /// Identity status, computed once and never re-evaluated.
    pub fn identity(&self) -> IdentityState {
        self.identity
    }

    /// Frames needed from each input, computed once.
    pub fn frames_needed(&self) -> &FramesNeededMap {
        &self.frames_needed
    }

    /// Transform-chain substitution for an input slot, if one was recorded.
    pub fn reroute(&self, input: usize) -> Option<RerouteTarget> {
        self.reroutes.get(&input).copied()
    }

    pub(crate) fn reroutes(&self) -> &HashMap<usize, RerouteTarget> {
        &self.reroutes
    }

    /// Bounding union of every render window requested so far. Grow-only.
    pub fn final_roi(&self) -> Option<RectD> {
        self.final_roi
    }

    /// Fold a render window into the accumulated region of interest.
    pub(crate) fn note_render_window(&mut self, window: RectD) -> RoiGrowth {
        match self.final_roi {
            Some(roi) if contains(roi, window) => RoiGrowth::Contained,
            Some(roi) => {
                self.final_roi = Some(rect_union(roi, window));
                RoiGrowth::Grew
            }
            None => {
                self.final_roi = Some(window);
                RoiGrowth::Grew
            }
        }
    }
}

fn contains(outer: RectD, inner: RectD) -> bool {
    outer.x0 <= inner.x0 && inner.x1 <= outer.x1 && outer.y0 <= inner.y0 && inner.y1 <= outer.y1
}

/// Per-node memo for one request pass: stamped once with the node hash and
/// the scale the node renders at, then filled per `(time, view)`.
#[derive(Clone, Debug)]
pub struct NodeFrameRequest {
    node_hash: u64,
    mapped_scale: RenderScale,
    frames: HashMap<(TimeKey, ViewIdx), FrameViewRequest>,
}

impl NodeFrameRequest {
    /// Node-configuration hash stamped when the node was first visited.
    pub fn node_hash(&self) -> u64 {
        self.node_hash
    }

    /// Render scale the node renders at within this pass.
    pub fn mapped_scale(&self) -> RenderScale {
        self.mapped_scale
    }

    /// The memo for `(time, view)`, with `time` snapped to the key grid.
    pub fn frame_view(&self, time: f64, view: ViewIdx) -> Option<&FrameViewRequest> {
        self.frames.get(&(TimeKey::new(time), view))
    }

    /// Precomputed canonical region of interest for a `(time, view)`, for the
    /// render function to fetch instead of recomputing it.
    pub fn frame_view_canonical_roi(&self, time: f64, view: ViewIdx) -> Option<RectD> {
        self.frame_view(time, view).and_then(FrameViewRequest::final_roi)
    }

    pub(crate) fn frame_view_mut(
        &mut self,
        time: TimeKey,
        view: ViewIdx,
    ) -> Option<&mut FrameViewRequest> {
        self.frames.get_mut(&(time, view))
    }

    pub(crate) fn insert_frame_view(
        &mut self,
        time: TimeKey,
        view: ViewIdx,
        request: FrameViewRequest,
    ) {
        self.frames.insert((time, view), request);
    }
}

/// Everything one request pass memoized, keyed by node.
///
/// The map is private state of a single top-level pass: it is created by
/// [`crate::compute_request_pass`], handed to the render driver of the same
/// render, and discarded. Two concurrently-executing passes must each own
/// their own map.
#[derive(Clone, Debug, Default)]
pub struct FrameRequestMap {
    nodes: HashMap<NodeId, NodeFrameRequest>,
}

impl FrameRequestMap {
    /// The per-node memo, if the node was visited by the pass.
    pub fn node(&self, id: NodeId) -> Option<&NodeFrameRequest> {
        self.nodes.get(&id)
    }

    /// The memo for `(node, time, view)`, if that tuple was visited.
    pub fn frame_view(&self, id: NodeId, time: f64, view: ViewIdx) -> Option<&FrameViewRequest> {
        self.nodes.get(&id).and_then(|n| n.frame_view(time, view))
    }

    /// Precomputed canonical RoI for `(node, time, view)`, if that tuple was
    /// visited by the pass.
    pub fn frame_view_canonical_roi(&self, id: NodeId, time: f64, view: ViewIdx) -> Option<RectD> {
        self.nodes
            .get(&id)
            .and_then(|n| n.frame_view_canonical_roi(time, view))
    }

    /// Number of nodes visited by the pass.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the pass visited no node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn get_or_create_node(
        &mut self,
        id: NodeId,
        node_hash: u64,
        mapped_scale: RenderScale,
    ) -> &mut NodeFrameRequest {
        self.nodes.entry(id).or_insert_with(|| NodeFrameRequest {
            node_hash,
            mapped_scale,
            frames: HashMap::new(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/request/frame_view.rs"]
mod tests;
