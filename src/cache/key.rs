use crate::foundation::core::{RectI, RenderScale, ViewIdx};

/// Addresses one cache entry: one node configuration rendered at one frame
/// time, render scale and view.
///
/// The region of definition travels along as a convenience payload but is
/// excluded from equality and hashing: two keys for the same
/// `(node_hash, scale, time, view)` address the same entry even when their
/// `rod` differ (the entry's bounds may have grown since it was created).
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct ImageKey {
    /// Hash of the producing node's configuration (parameters + upstream).
    pub node_hash: u64,
    /// Frame time.
    pub time: f64,
    /// Render scale the entry was produced at.
    pub scale: RenderScale,
    /// View index.
    pub view: ViewIdx,
    /// Region of definition at creation time. Not part of the identity.
    pub rod: RectI,
}

impl ImageKey {
    /// Build a key from its fields.
    pub fn new(node_hash: u64, time: f64, scale: RenderScale, view: ViewIdx, rod: RectI) -> Self {
        Self {
            node_hash,
            time,
            scale,
            view,
            rod,
        }
    }
}

impl PartialEq for ImageKey {
    fn eq(&self, other: &Self) -> bool {
        self.node_hash == other.node_hash
            && self.scale.x.to_bits() == other.scale.x.to_bits()
            && self.scale.y.to_bits() == other.scale.y.to_bits()
            && self.time.to_bits() == other.time.to_bits()
            && self.view == other.view
    }
}

impl Eq for ImageKey {}

impl std::hash::Hash for ImageKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.node_hash.hash(state);
        self.scale.x.to_bits().hash(state);
        self.scale.y.to_bits().hash(state);
        self.time.to_bits().hash(state);
        self.view.hash(state);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/key.rs"]
mod tests;
