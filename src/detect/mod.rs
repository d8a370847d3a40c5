pub(crate) mod chain;
pub(crate) mod color;
pub(crate) mod edges;
pub(crate) mod region;
