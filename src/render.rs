use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::cache::image::Image;
use crate::cache::key::ImageKey;
use crate::cache::store::ImageCache;
use crate::foundation::core::{TimeKey, ViewIdx, canonical_to_pixel};
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::graph::effect::{IdentityState, RenderArgs, ViewInvariance};
use crate::graph::node::{NodeGraph, NodeId};
use crate::kernels::pixel::BitDepth;
use crate::request::frame_view::FrameRequestMap;
use crate::request::propagate::{RenderContext, for_each_frame_needed};

/// Everything a tree render shares across its recursion.
pub struct RenderTreeArgs<'a> {
    /// Graph being rendered.
    pub graph: &'a NodeGraph,
    /// Cache container entries are fetched from and stored into.
    pub cache: &'a dyn ImageCache,
    /// Request map produced by [`crate::compute_request_pass`] for the same
    /// root, time, view and window.
    pub requests: &'a FrameRequestMap,
    /// Shared abort flag and diagnostics of this render.
    pub ctx: &'a RenderContext,
    /// Storage depth of every produced image.
    pub depth: BitDepth,
    /// Component count of every produced image.
    pub n_comps: usize,
}

/// Render `node` and everything upstream of it, bottom-up, returning the
/// node's cache entry with its accumulated region of interest fully rendered.
///
/// Inputs render before the node itself. Each node's missing rectangles are
/// computed against its partial-render tracker and produced in parallel, so
/// re-rendering after a small invalidation only touches what is actually
/// missing.
#[tracing::instrument(level = "debug", skip(args), fields(node = args.graph.label(node)))]
pub fn render_tree(
    args: &RenderTreeArgs<'_>,
    node: NodeId,
    time: f64,
    view: ViewIdx,
    mip_map_level: u32,
) -> TesseraResult<Arc<Image>> {
    if args.ctx.aborted() {
        return Err(TesseraError::Aborted);
    }
    let graph = args.graph;
    let effect = graph.effect(node);
    let fvr = args.requests.frame_view(node, time, view).ok_or_else(|| {
        TesseraError::render(format!(
            "no request entry for node '{}'; run compute_request_pass first",
            graph.label(node)
        ))
    })?;
    let entry = args
        .requests
        .node(node)
        .ok_or_else(|| TesseraError::render("request entry vanished during render"))?;
    let scale = entry.mapped_scale();

    match fvr.identity() {
        IdentityState::SelfTime { time: id_time } => {
            let id_view = if view != ViewIdx::MAIN
                && effect.view_invariance() == ViewInvariance::AllViewsInvariant
            {
                ViewIdx::MAIN
            } else {
                view
            };
            if TimeKey::new(id_time) == TimeKey::new(time) && id_view == view {
                return Err(TesseraError::render(format!(
                    "node '{}' is identity on itself at the same time and view",
                    graph.label(node)
                )));
            }
            return render_tree(args, node, id_time, id_view, mip_map_level);
        }
        IdentityState::Input {
            input,
            time: id_time,
            view: id_view,
        } => {
            return match graph.input(node, input) {
                Some(target) => render_tree(args, target, id_time, id_view, mip_map_level),
                // A disconnected identity input yields transparent black.
                None => {
                    let bounds = canonical_to_pixel(fvr.rod(), scale);
                    let image = Image::local(bounds, scale, args.depth, args.n_comps)?;
                    image.mark_for_rendered(bounds);
                    Ok(Arc::new(image))
                }
            };
        }
        IdentityState::NotIdentity => {}
    }

    let rod = fvr.rod();
    let window = fvr.final_roi().unwrap_or(rod);
    let frames_needed = fvr.frames_needed().clone();
    let reroutes = fvr.reroutes().clone();
    let rois = effect.regions_of_interest(
        time,
        scale,
        rod,
        window,
        view,
        graph.input_count(node),
    );

    let mut inputs: BTreeMap<usize, Vec<Arc<Image>>> = BTreeMap::new();
    for_each_frame_needed(
        graph,
        args.ctx,
        node,
        &frames_needed,
        &rois,
        &reroutes,
        |item| {
            let image = render_tree(args, item.node, item.time, item.view, mip_map_level)?;
            if args.ctx.aborted() {
                return Err(TesseraError::Aborted);
            }
            inputs.entry(item.input).or_default().push(image);
            Ok(())
        },
    )?;

    let key = ImageKey::new(
        graph.node_hash(node),
        TimeKey::new(time).value(),
        scale,
        view,
        canonical_to_pixel(rod, scale),
    );
    let image = match args.cache.get(&key) {
        Some(image) => image,
        None => {
            let image = Arc::new(Image::create(key, args.depth, args.n_comps)?);
            args.cache.insert(Arc::clone(&image));
            image
        }
    };

    let pixel_roi = canonical_to_pixel(window, scale);
    if pixel_roi.is_null() {
        return Ok(image);
    }
    image.ensure_bounds(pixel_roi);

    let rest = image.get_rest_to_render(pixel_roi);
    if rest.is_empty() {
        debug!(node = graph.label(node), "fully cached, nothing to render");
        return Ok(image);
    }
    rest.par_iter().try_for_each(|&roi| {
        if args.ctx.aborted() {
            return Err(TesseraError::Aborted);
        }
        effect.render(RenderArgs {
            time,
            view,
            scale,
            roi,
            inputs: &inputs,
            output: &image,
        })?;
        image.mark_for_rendered(roi);
        Ok(())
    })?;

    if args.ctx.nan_handling && args.depth == BitDepth::F32 && image.check_for_nans(pixel_roi) {
        tracing::warn!(node = graph.label(node), "replaced non-finite pixel values");
    }

    Ok(image)
}

#[cfg(test)]
#[path = "../tests/unit/render.rs"]
mod tests;
