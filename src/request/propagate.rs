use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::foundation::core::{
    RectD, RenderScale, TimeKey, ViewIdx, canonical_to_pixel, rect_is_empty, rect_is_infinite,
};
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::graph::effect::{FramesNeededMap, IdentityState, RoIMap, ViewInvariance};
use crate::graph::node::{NodeGraph, NodeId};
use crate::request::frame_view::{
    FrameRequestMap, FrameViewRequest, RerouteTarget, RoiGrowth,
};

/// Hard cap on how many frames a single frame range may pull from one input.
/// Retimers sometimes declare huge ranges; anything past this many frames is
/// left for the effect to fetch lazily during render.
pub const MAX_FRAMES_NEEDED_PREFETCH: usize = 4;

/// Diagnostic attached to a node when a render fails, surviving the failed
/// render so a caller can display it.
#[derive(Clone, Debug)]
pub struct PersistentMessage {
    /// Label of the node the message is about.
    pub node: String,
    /// Human-readable description of the failure.
    pub message: String,
}

/// Shared state of one top-level render: cooperative abort flag, failure
/// diagnostics and the switches that alter propagation behavior.
#[derive(Debug)]
pub struct RenderContext {
    /// Fold chains of pure affine transforms into a single fetch.
    pub transforms_enabled: bool,
    /// Scan float output for NaN values after each render and repair them.
    pub nan_handling: bool,
    abort: Arc<AtomicBool>,
    messages: Mutex<Vec<PersistentMessage>>,
}

impl RenderContext {
    /// Fresh context with transforms and NaN handling enabled.
    pub fn new() -> Self {
        Self {
            transforms_enabled: true,
            nan_handling: true,
            abort: Arc::new(AtomicBool::new(false)),
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Toggle transform-chain concatenation.
    pub fn with_transforms(mut self, enabled: bool) -> Self {
        self.transforms_enabled = enabled;
        self
    }

    /// Toggle post-render NaN scrubbing of float output.
    pub fn with_nan_handling(mut self, enabled: bool) -> Self {
        self.nan_handling = enabled;
        self
    }

    /// Flag another thread can set to cancel this render cooperatively.
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// Set the abort flag.
    pub fn request_abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    /// True once an abort has been requested.
    pub fn aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    /// Diagnostics recorded so far, oldest first.
    pub fn messages(&self) -> Vec<PersistentMessage> {
        self.lock_messages().clone()
    }

    pub(crate) fn post_message(&self, node: &str, message: impl Into<String>) {
        self.lock_messages().push(PersistentMessage {
            node: node.to_owned(),
            message: message.into(),
        });
    }

    fn lock_messages(&self) -> std::sync::MutexGuard<'_, Vec<PersistentMessage>> {
        match self.messages.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk the graph once from `root` and memoize, for every reachable
/// `(node, time, view)`, the region of definition, identity status, frames
/// needed and the union of all regions of interest requested of it.
///
/// The returned map is what makes the subsequent render cheap: the render
/// driver looks regions and identities up instead of recomputing them, and
/// each node renders its accumulated region exactly once even when several
/// downstream consumers overlap.
#[tracing::instrument(level = "debug", skip(graph, ctx), fields(root = graph.label(root)))]
pub fn compute_request_pass(
    graph: &NodeGraph,
    ctx: &RenderContext,
    root: NodeId,
    time: f64,
    view: ViewIdx,
    mip_map_level: u32,
    window: RectD,
) -> TesseraResult<FrameRequestMap> {
    let mut map = FrameRequestMap::default();
    propagate_input_rois(
        graph,
        ctx,
        &mut map,
        PropagateArgs {
            node: root,
            time,
            view,
            mip_map_level,
            window,
        },
    )?;
    Ok(map)
}

struct PropagateArgs {
    node: NodeId,
    time: f64,
    view: ViewIdx,
    mip_map_level: u32,
    window: RectD,
}

fn propagate_input_rois(
    graph: &NodeGraph,
    ctx: &RenderContext,
    map: &mut FrameRequestMap,
    args: PropagateArgs,
) -> TesseraResult<()> {
    let PropagateArgs {
        node,
        time,
        view,
        mip_map_level,
        window,
    } = args;
    let scale = RenderScale::from_mip_map_level(mip_map_level);
    let time_key = TimeKey::new(time);
    let node_hash = graph.node_hash(node);
    let effect = graph.effect(node);
    let n_inputs = graph.input_count(node);

    let entry = map.get_or_create_node(node, node_hash, scale);

    if entry.frame_view(time, view).is_none() {
        // First visit of this (time, view): run the expensive hooks once.
        let identity = if view != ViewIdx::MAIN
            && effect.view_invariance() == ViewInvariance::AllViewsInvariant
        {
            // View-invariant nodes collapse every view onto the main view
            // without consulting the identity hook.
            IdentityState::SelfTime { time }
        } else {
            let pixel_window = canonical_to_pixel(window, scale);
            match effect.is_identity(node_hash, time, scale, pixel_window, view) {
                Ok(state) => state,
                Err(e) if e.is_aborted() => return Err(e),
                Err(e) => {
                    ctx.post_message(graph.label(node), format!("identity test failed: {e}"));
                    return Err(TesseraError::propagation(format!(
                        "identity test failed on node '{}'",
                        graph.label(node)
                    )));
                }
            }
        };

        let rod = match effect.region_of_definition(node_hash, time, scale, view) {
            Ok(rod) => rod,
            Err(e) if e.is_aborted() => return Err(e),
            Err(e) => {
                ctx.post_message(
                    graph.label(node),
                    format!("could not compute the region of definition: {e}"),
                );
                return Err(TesseraError::propagation(format!(
                    "region of definition failed on node '{}'",
                    graph.label(node)
                )));
            }
        };

        let reroutes = if ctx.transforms_enabled {
            concatenate_transforms(graph, node, time, view)
        } else {
            HashMap::new()
        };

        let frames_needed = effect.frames_needed(node_hash, time, view, mip_map_level, n_inputs);

        let entry = map.get_or_create_node(node, node_hash, scale);
        entry.insert_frame_view(
            time_key,
            view,
            FrameViewRequest::new(rod, identity, frames_needed, reroutes),
        );
    }

    let entry = map.get_or_create_node(node, node_hash, scale);
    let fvr = entry
        .frame_view_mut(time_key, view)
        .ok_or_else(|| TesseraError::propagation("request entry vanished during propagation"))?;
    if fvr.note_render_window(window) == RoiGrowth::Contained {
        // Everything below was already requested for a covering window.
        return Ok(());
    }
    let identity = fvr.identity();
    let rod = fvr.rod();
    let frames_needed = fvr.frames_needed().clone();
    let reroutes = fvr.reroutes().clone();

    match identity {
        IdentityState::SelfTime { time: id_time } => {
            let id_view = if view != ViewIdx::MAIN
                && effect.view_invariance() == ViewInvariance::AllViewsInvariant
            {
                ViewIdx::MAIN
            } else {
                view
            };
            if TimeKey::new(id_time) == time_key && id_view == view {
                ctx.post_message(
                    graph.label(node),
                    "the identity test points the node at itself",
                );
                return Err(TesseraError::propagation(format!(
                    "node '{}' is identity on itself at the same time and view",
                    graph.label(node)
                )));
            }
            return propagate_input_rois(
                graph,
                ctx,
                map,
                PropagateArgs {
                    node,
                    time: id_time,
                    view: id_view,
                    mip_map_level,
                    window,
                },
            );
        }
        IdentityState::Input {
            input,
            time: id_time,
            view: id_view,
        } => {
            // A disconnected identity input simply yields nothing.
            let Some(target) = graph.input(node, input) else {
                return Ok(());
            };
            return propagate_input_rois(
                graph,
                ctx,
                map,
                PropagateArgs {
                    node: target,
                    time: id_time,
                    view: id_view,
                    mip_map_level,
                    window,
                },
            );
        }
        IdentityState::NotIdentity => {}
    }

    let rois = effect.regions_of_interest(time, scale, rod, window, view, n_inputs);

    for_each_frame_needed(
        graph,
        ctx,
        node,
        &frames_needed,
        &rois,
        &reroutes,
        |item| {
            propagate_input_rois(
                graph,
                ctx,
                map,
                PropagateArgs {
                    node: item.node,
                    time: item.time,
                    view: item.view,
                    mip_map_level,
                    window: item.roi,
                },
            )
        },
    )
}

/// Follow a chain of pure affine transforms starting at `node` and record,
/// for the transform's input slot, the deepest producer reached and the
/// combined affine mapping this node's canonical space into that producer's.
fn concatenate_transforms(
    graph: &NodeGraph,
    node: NodeId,
    time: f64,
    view: ViewIdx,
) -> HashMap<usize, RerouteTarget> {
    let mut reroutes = HashMap::new();
    let Some(link) = graph.effect(node).concatenated_transform(time, view) else {
        return reroutes;
    };
    let Some(mut cursor) = graph.input(node, link.input) else {
        return reroutes;
    };
    let mut transform = link.transform;
    while let Some(next) = graph.effect(cursor).concatenated_transform(time, view) {
        let Some(upstream) = graph.input(cursor, next.input) else {
            break;
        };
        transform = next.transform * transform;
        cursor = upstream;
    }
    reroutes.insert(
        link.input,
        RerouteTarget {
            node: cursor,
            transform,
        },
    );
    reroutes
}

/// One upstream fetch produced by expanding a frames-needed map.
pub(crate) struct FrameNeeded {
    /// Upstream node to fetch from, reroutes already applied.
    pub(crate) node: NodeId,
    /// Input slot of the requesting node the fetch is for.
    pub(crate) input: usize,
    pub(crate) time: f64,
    pub(crate) view: ViewIdx,
    /// Canonical region to request, in the upstream node's space.
    pub(crate) roi: RectD,
}

/// Expand a frames-needed map into concrete upstream fetches, applying the
/// skip rules shared by propagation and the render driver: disabled masks,
/// empty regions, paint sub-tree bottom edges, the prefetch cap. An infinite
/// region of interest is a hard failure.
pub(crate) fn for_each_frame_needed(
    graph: &NodeGraph,
    ctx: &RenderContext,
    node: NodeId,
    frames_needed: &FramesNeededMap,
    rois: &RoIMap,
    reroutes: &HashMap<usize, RerouteTarget>,
    mut visit: impl FnMut(FrameNeeded) -> TesseraResult<()>,
) -> TesseraResult<()> {
    let effect = graph.effect(node);
    for (&input, per_view) in frames_needed {
        if effect.is_input_mask(input)
            && (!effect.is_mask_enabled(input) || effect.mask_channel(input).is_none())
        {
            continue;
        }
        let Some(connected) = graph.input(node, input) else {
            continue;
        };
        let Some(&roi) = rois.get(&input) else {
            continue;
        };
        if rect_is_infinite(roi) {
            ctx.post_message(
                graph.label(node),
                format!("input {input} was asked for an infinite region of interest"),
            );
            return Err(TesseraError::propagation(format!(
                "node '{}' requests an infinite region from input {input}",
                graph.label(node)
            )));
        }
        if rect_is_empty(roi) {
            continue;
        }

        let (target, roi) = match reroutes.get(&input) {
            Some(rr) => (rr.node, rr.transform.transform_rect_bbox(roi)),
            None => (connected, roi),
        };

        // Inside an attached paint sub-tree, the edge back into the host's
        // bottom merge has already been handled by the host itself.
        if let Some(host) = graph.subtree_host(node) {
            if graph.subtree_bottom(host) == Some(target) {
                continue;
            }
        }

        for (&view, ranges) in per_view {
            for range in ranges {
                if range.min != range.max
                    && (range.min.fract() != 0.0 || range.max.fract() != 0.0)
                {
                    warn!(
                        node = graph.label(node),
                        input,
                        min = range.min,
                        max = range.max,
                        "skipping non-integer multi-frame range"
                    );
                    continue;
                }
                let mut frame = range.min;
                let mut prefetched = 0usize;
                while frame <= range.max {
                    if prefetched >= MAX_FRAMES_NEEDED_PREFETCH {
                        break;
                    }
                    visit(FrameNeeded {
                        node: target,
                        input,
                        time: frame,
                        view,
                        roi,
                    })?;
                    prefetched += 1;
                    if range.min == range.max {
                        break;
                    }
                    frame += 1.0;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/request/propagate.rs"]
mod tests;
