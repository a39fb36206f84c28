pub(crate) mod gesture;
pub(crate) mod session;
