mod model;

pub use model::{DragBreakdown, DragModel, DragModelError};
