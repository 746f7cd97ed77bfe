pub mod binarization;
pub mod extraction;
pub mod boxes;
pub mod mapping;

pub use binarization::*;
pub use extraction::*;
pub use boxes::{get_mini_box, order_points_clockwise, rect_extent, unclip, BoxBuilder, MiniBox};
pub use mapping::*;
