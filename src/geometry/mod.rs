mod lloyd;
mod points;
pub mod validation;

pub use lloyd::*;
pub use points::*;
