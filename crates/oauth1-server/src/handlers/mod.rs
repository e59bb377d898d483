//! Request handlers.

pub(crate) mod initiate;
