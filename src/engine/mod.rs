pub(crate) mod acquire;
pub(crate) mod config;
pub(crate) mod selection;
pub(crate) mod session;
