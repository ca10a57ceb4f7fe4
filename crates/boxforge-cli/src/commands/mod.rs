//! Command handlers grouped by record type.

pub(crate) mod inbounds;
pub(crate) mod log;
pub(crate) mod records;
pub(crate) mod render;
pub(crate) mod users;
