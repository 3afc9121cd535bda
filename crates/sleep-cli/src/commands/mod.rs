//! Command implementations

pub(crate) mod info;
pub(crate) mod predict;
pub(crate) mod train;
