pub mod charset;
pub mod color;
pub mod encoder;
pub mod optimizer;
pub mod raster;
pub mod renderer;
pub mod request;
pub mod size;
