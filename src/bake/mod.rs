pub(crate) mod material;
pub(crate) mod pipeline;
pub(crate) mod raster;
pub(crate) mod schedule;
