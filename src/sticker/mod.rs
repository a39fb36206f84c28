pub(crate) mod crop;
pub(crate) mod model;
pub(crate) mod stack;
