//! otto - a configuration-driven task dispatcher
//!
//! An ottofile (`otto.yml`) declares named tasks and their parameters.
//! otto takes one combined command line such as
//! `otto build --release test --fast`, splits it at task names, and
//! parses each piece against a grammar synthesized from the ottofile.

pub mod domain;
pub mod storage;
pub mod grammar;
pub mod dispatch;
pub mod cli;

pub use dispatch::{Dispatch, DispatchError, Dispatcher, Mode, TaskArgs, Values};
pub use domain::{Parameter, SpecDocument, Task};
