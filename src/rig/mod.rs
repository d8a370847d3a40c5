pub(crate) mod blendshape;
pub(crate) mod builder;
pub(crate) mod model;
