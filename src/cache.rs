pub(crate) mod bitmap;
pub(crate) mod image;
pub(crate) mod key;
pub(crate) mod store;
