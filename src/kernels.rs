pub(crate) mod copy_channels;
pub(crate) mod mask_mix;
pub(crate) mod pixel;
