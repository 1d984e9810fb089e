//! tether core: bind Rust types into an embedded scripting VM.
//!
//! The [`bind`] module holds the binding layer proper (registry, builders,
//! marshalling and dispatch). [`runtime`] and [`script`] provide the small
//! interpreter those bindings are exercised through.

pub mod bind;
pub mod runtime;
pub mod script;
pub mod value;

#[cfg(test)]
mod testing;

pub use bind::{
    ArgsView, BindError, ClassBuilder, ClassDescriptor, ClassId, ClassInfo, FromVal, IntoVal, MemberBinding,
    MemberInfo, MemberKind, ModuleBinder, NativeClass, NativeFn, NativeMethod, Obj, Signature, TypeRegistry,
    cast_arg,
};
pub use runtime::{ErrorKind, Vm, VmError, VmOptions, VmResult};
pub use value::{Instance, ModuleObj, Val};
