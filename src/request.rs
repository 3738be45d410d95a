pub(crate) mod frame_view;
pub(crate) mod propagate;
