//! The native binding layer: registry, builders, marshalling and dispatch.

mod args;
mod binder;
mod dispatch;
mod error;
mod marshal;
mod native;
mod registry;
mod signature;

#[cfg(test)]
mod binder_test;
#[cfg(test)]
mod dispatch_test;
#[cfg(test)]
mod marshal_test;

pub use args::ArgsView;
pub use binder::{BINARY_OPERATORS, ClassBuilder, ModuleBinder, UNARY_OPERATORS};
pub use dispatch::Callable;
pub use error::BindError;
pub use marshal::{FromVal, IntoVal, NativeClass, Obj, cast_arg};
pub use native::{ByMut, ByRef, NativeFn, NativeMethod, ReturnsSelf};
pub use registry::{ClassDescriptor, ClassId, ClassInfo, MemberBinding, MemberInfo, MemberKind, TypeRegistry};
pub use signature::{Param, Signature};

pub(crate) use marshal::short_type_name;
pub(crate) use registry::MemberSlot;
