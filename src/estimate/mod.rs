pub(crate) mod pose;
