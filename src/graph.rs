pub(crate) mod effect;
pub(crate) mod node;
