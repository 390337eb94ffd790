mod grid;
mod legend;
mod misc;
mod usage;

pub use grid::{column_major, columns, pad, Cell, PartitionGrid};
pub use legend::legend;
pub use misc::plain_text;
pub use usage::{Load, Status, Usage};
