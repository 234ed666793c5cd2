pub mod platypus;
pub mod types;

pub use platypus::{Platypus, RollingState, Transform, TransformError, TransformStats};
pub use types::{OutputRecord, Parseable, Payload, TimeFormat};
