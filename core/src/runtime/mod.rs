//! The VM handle the binding layer plugs into.

mod attr;
mod error;
mod ops;
mod vm;


pub use error::{ErrorKind, VmError, VmResult};
pub use vm::{Vm, VmOptions};
