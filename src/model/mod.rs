//! Pure data structures: resource names and schemas, entities, and test cases.

pub mod entity;
pub mod resource;
pub mod test_case;

pub use entity::*;
pub use resource::*;
pub use test_case::*;
