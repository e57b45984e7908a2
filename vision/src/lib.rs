mod cluster;
pub use cluster::*;
mod frame;
pub use frame::*;
mod geometry;
pub use geometry::*;
mod scan;
pub use scan::*;

pub mod bars;
pub mod marker;
pub mod mobs;
pub mod vitals;
