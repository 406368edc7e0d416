//! Domain types for SqueezeLab

pub mod annotated;
pub mod bar;
pub mod outcome;
pub mod region;

pub use annotated::{AnnotatedBar, Bands};
pub use bar::Bar;
pub use outcome::{BreakoutDirection, OutcomeRecord};
pub use region::SqueezeRegion;
