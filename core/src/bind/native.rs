//! Typed native callables.
//!
//! Plain Rust functions and closures become bindable through [`NativeFn`]
//! (free functions and constructors) and [`NativeMethod`] (methods and
//! operators). Both are implemented for arities 0 to 6. The `Args` type
//! parameter only exists to keep the impls apart and is inferred.
//!
//! A method receiver can be taken three ways:
//! - `&T` for read-only methods,
//! - `&mut T` for mutating methods,
//! - `&mut T` returning `&mut T`, which returns the receiver itself and
//!   therefore keeps its identity (`a += b` yields `a`).
//!
//! Every argument is marshalled before the receiver is borrowed.

use super::args::ArgsView;
use super::marshal::{FromVal, IntoVal, NativeClass};
use crate::runtime::{Vm, VmError, VmResult};
use crate::value::{Instance, Val};

pub trait NativeFn<Args>: 'static {
    type Output;
    const ARITY: usize;

    fn invoke(&self, vm: &mut Vm, args: &ArgsView<'_>) -> VmResult<Val>;
}

pub trait NativeMethod<T, Args>: 'static {
    const ARITY: usize;

    fn invoke(&self, vm: &mut Vm, receiver: &Val, args: &ArgsView<'_>) -> VmResult<Val>;
}

/// Receiver taken as `&T`.
pub struct ByRef;
/// Receiver taken as `&mut T`.
pub struct ByMut;
/// Receiver taken as `&mut T` and returned.
pub struct ReturnsSelf;

fn receiver_instance<'v>(vm: &Vm, receiver: &'v Val, expected: &str) -> VmResult<&'v Instance> {
    match receiver {
        Val::Instance(inst) => Ok(inst),
        other => Err(VmError::type_error(format!(
            "descriptor requires a '{}' object but received '{}'",
            expected,
            vm.type_name(other)
        ))),
    }
}

macro_rules! count {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

macro_rules! impl_native {
    ($($arg:ident $idx:tt),*) => {
        impl<Func, Ret, $($arg,)*> NativeFn<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Ret + 'static,
            Ret: IntoVal,
            $($arg: FromVal,)*
        {
            type Output = Ret;
            const ARITY: usize = count!($($arg)*);

            #[allow(non_snake_case, unused_variables)]
            fn invoke(&self, vm: &mut Vm, args: &ArgsView<'_>) -> VmResult<Val> {
                $(let $arg = args.cast::<$arg>(vm, $idx)?;)*
                (self)($($arg),*).into_val(vm)
            }
        }

        impl<Func, T, Ret, $($arg,)*> NativeMethod<T, (ByRef, $($arg,)*)> for Func
        where
            T: NativeClass,
            Func: Fn(&T, $($arg),*) -> Ret + 'static,
            Ret: IntoVal,
            $($arg: FromVal,)*
        {
            const ARITY: usize = count!($($arg)*);

            #[allow(non_snake_case, unused_variables)]
            fn invoke(&self, vm: &mut Vm, receiver: &Val, args: &ArgsView<'_>) -> VmResult<Val> {
                $(let $arg = args.cast::<$arg>(vm, $idx)?;)*
                let inst = receiver_instance(vm, receiver, args.owner())?;
                let ret = {
                    let this = inst.borrow_as::<T>()?;
                    (self)(&*this, $($arg),*)
                };
                ret.into_val(vm)
            }
        }

        impl<Func, T, Ret, $($arg,)*> NativeMethod<T, (ByMut, $($arg,)*)> for Func
        where
            T: NativeClass,
            Func: Fn(&mut T, $($arg),*) -> Ret + 'static,
            Ret: IntoVal,
            $($arg: FromVal,)*
        {
            const ARITY: usize = count!($($arg)*);

            #[allow(non_snake_case, unused_variables)]
            fn invoke(&self, vm: &mut Vm, receiver: &Val, args: &ArgsView<'_>) -> VmResult<Val> {
                $(let $arg = args.cast::<$arg>(vm, $idx)?;)*
                let inst = receiver_instance(vm, receiver, args.owner())?;
                let ret = {
                    let mut this = inst.borrow_mut_as::<T>()?;
                    (self)(&mut *this, $($arg),*)
                };
                ret.into_val(vm)
            }
        }

        impl<Func, T, $($arg,)*> NativeMethod<T, (ReturnsSelf, $($arg,)*)> for Func
        where
            T: NativeClass,
            Func: for<'a> Fn(&'a mut T, $($arg),*) -> &'a mut T + 'static,
            $($arg: FromVal,)*
        {
            const ARITY: usize = count!($($arg)*);

            #[allow(non_snake_case, unused_variables)]
            fn invoke(&self, vm: &mut Vm, receiver: &Val, args: &ArgsView<'_>) -> VmResult<Val> {
                $(let $arg = args.cast::<$arg>(vm, $idx)?;)*
                let inst = receiver_instance(vm, receiver, args.owner())?;
                {
                    let mut this = inst.borrow_mut_as::<T>()?;
                    (self)(&mut *this, $($arg),*);
                }
                Ok(receiver.clone())
            }
        }
    };
}

impl_native!();
impl_native!(A0 0);
impl_native!(A0 0, A1 1);
impl_native!(A0 0, A1 1, A2 2);
impl_native!(A0 0, A1 1, A2 2, A3 3);
impl_native!(A0 0, A1 1, A2 2, A3 3, A4 4);
impl_native!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5);
