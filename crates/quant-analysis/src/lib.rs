pub mod alignment;
pub mod correlation;

pub use alignment::align;
pub use correlation::{correlate, scatter_points};
