//! Domain model for otto
//!
//! The typed ottofile schema and the pure transformations over it,
//! without any I/O concerns.

mod document;
mod param;
mod partition;

pub use document::{DocumentError, Layout, ParamAction, Parameter, Scalar, SpecDocument, Task};
pub use param::{ParamError, ParamForms};
pub use partition::{partition, Partition, TaskRun};
