//! Host builtins for tether scripts.
//!
//! Everything here is bound through the same registration API embedders use:
//! [`register_builtins`] fills the `builtins` module, [`demo::register_demo`]
//! adds the `Point` demo class and its helper functions.

pub mod console;
pub mod demo;

#[cfg(test)]
mod demo_test;

use std::rc::Rc;

use anyhow::Result;
use tether_core::{ArgsView, Val, Vm};
use tracing::debug;

pub use console::Console;

/// Bind `print`, `input`, `repr`, `str`, `len`, `id` and `type_name` into
/// the `builtins` module of `vm`.
pub fn register_builtins(vm: &mut Vm, console: Rc<Console>) -> Result<()> {
    let out = console.clone();
    vm.bind_module("builtins")
        .function_raw("print(*args, sep=' ', end='\\n')", move |vm, args| print(vm, args, &out))?
        .function_raw("input(prompt=None) -> str", move |vm, args| input(vm, args, &console))?
        .function_raw("repr(o) -> str", |vm, args| Ok(Val::from(vm.repr(&args[0])?)))?
        .function_raw("str(o) -> str", |vm, args| Ok(Val::from(vm.to_str(&args[0])?)))?
        .function_raw("len(o) -> int", |vm, args| {
            let len = vm.length_of(&args[0])?;
            Ok(Val::Int(i64::try_from(len)?))
        })?
        .function_raw("id(o)", |_vm, args| Ok(identity(&args[0])))?
        .function_raw("type_name(o) -> str", |vm, args| Ok(Val::from(vm.type_name(&args[0]))))?;
    debug!(target: "tether::stdlib", "builtins registered");
    Ok(())
}

fn print(vm: &mut Vm, args: ArgsView<'_>, console: &Console) -> Result<Val> {
    let sep: String = args.cast(vm, 0)?;
    let end: String = args.cast(vm, 1)?;
    let mut parts = Vec::with_capacity(args.rest().len());
    for value in args.rest() {
        parts.push(vm.to_str(value)?);
    }
    let mut line = parts.join(&sep);
    line.push_str(&end);
    console.write(&line);
    Ok(Val::None)
}

fn input(vm: &mut Vm, args: ArgsView<'_>, console: &Console) -> Result<Val> {
    if let Some(prompt) = args.cast::<Option<Val>>(vm, 0)? {
        let prompt = vm.to_str(&prompt)?;
        console.write(&prompt);
    }
    Ok(Val::from(console.read_line().unwrap_or_default()))
}

/// Heap values report their address; immediates have no identity.
fn identity(value: &Val) -> Val {
    match value.identity().and_then(|id| i64::try_from(id).ok()) {
        Some(id) => Val::Int(id),
        None => Val::None,
    }
}
