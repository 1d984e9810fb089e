//! Conversions across the native/dynamic boundary.
//!
//! [`FromVal`] is the argument marshaller: it never fails loudly, a value
//! that does not fit the target type yields `None` so callers can try
//! several candidate types in a fixed order. [`IntoVal`] boxes native return
//! values back into [`Val`]s.

use std::any::type_name;
use std::cell::{Ref, RefMut};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::runtime::{Vm, VmError, VmResult};
use crate::value::{Instance, Val};

/// Marker for Rust types that can be registered as script classes.
pub trait NativeClass: 'static {}

pub trait FromVal: Sized {
    fn from_val(vm: &Vm, val: &Val) -> Option<Self>;

    /// Human readable name of the accepted dynamic type, for error messages.
    fn expected() -> String;
}

pub trait IntoVal {
    fn into_val(self, vm: &Vm) -> VmResult<Val>;
}

/// Try to cast `val` to `T`; `None` means no match.
#[inline]
pub fn cast_arg<T: FromVal>(vm: &Vm, val: &Val) -> Option<T> {
    T::from_val(vm, val)
}

pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

fn instance_of<T: NativeClass>(vm: &Vm, val: &Val) -> Option<Rc<Instance>> {
    let inst = val.as_instance()?;
    let class = vm.registry().id_of::<T>()?;
    (inst.class() == class).then(|| inst.clone())
}

impl FromVal for Val {
    fn from_val(_vm: &Vm, val: &Val) -> Option<Self> {
        Some(val.clone())
    }

    fn expected() -> String {
        "object".to_string()
    }
}

impl IntoVal for Val {
    fn into_val(self, _vm: &Vm) -> VmResult<Val> {
        Ok(self)
    }
}

macro_rules! impl_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromVal for $ty {
                fn from_val(_vm: &Vm, val: &Val) -> Option<Self> {
                    match val {
                        Val::Int(i) => <$ty>::try_from(*i).ok(),
                        Val::Bool(b) => Some(*b as $ty),
                        _ => None,
                    }
                }

                fn expected() -> String {
                    "int".to_string()
                }
            }

            impl IntoVal for $ty {
                fn into_val(self, _vm: &Vm) -> VmResult<Val> {
                    i64::try_from(self).map(Val::Int).map_err(|_| {
                        VmError::new(crate::runtime::ErrorKind::ValueError, format!("integer {} does not fit in int", self))
                    })
                }
            }
        )*
    };
}

impl_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromVal for f64 {
    fn from_val(_vm: &Vm, val: &Val) -> Option<Self> {
        match val {
            Val::Float(x) => Some(*x),
            Val::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    fn expected() -> String {
        "float".to_string()
    }
}

impl FromVal for f32 {
    fn from_val(vm: &Vm, val: &Val) -> Option<Self> {
        f64::from_val(vm, val).map(|x| x as f32)
    }

    fn expected() -> String {
        "float".to_string()
    }
}

impl IntoVal for f64 {
    fn into_val(self, _vm: &Vm) -> VmResult<Val> {
        Ok(Val::Float(self))
    }
}

impl IntoVal for f32 {
    fn into_val(self, _vm: &Vm) -> VmResult<Val> {
        Ok(Val::Float(self as f64))
    }
}

impl FromVal for bool {
    fn from_val(_vm: &Vm, val: &Val) -> Option<Self> {
        match val {
            Val::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn expected() -> String {
        "bool".to_string()
    }
}

impl IntoVal for bool {
    fn into_val(self, _vm: &Vm) -> VmResult<Val> {
        Ok(Val::Bool(self))
    }
}

impl IntoVal for () {
    fn into_val(self, _vm: &Vm) -> VmResult<Val> {
        Ok(Val::None)
    }
}

impl FromVal for String {
    fn from_val(_vm: &Vm, val: &Val) -> Option<Self> {
        match val {
            Val::Str(s) => Some(s.to_string()),
            _ => None,
        }
    }

    fn expected() -> String {
        "str".to_string()
    }
}

impl FromVal for Rc<str> {
    fn from_val(_vm: &Vm, val: &Val) -> Option<Self> {
        match val {
            Val::Str(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn expected() -> String {
        "str".to_string()
    }
}

impl IntoVal for String {
    fn into_val(self, _vm: &Vm) -> VmResult<Val> {
        Ok(Val::from(self))
    }
}

impl IntoVal for &str {
    fn into_val(self, _vm: &Vm) -> VmResult<Val> {
        Ok(Val::str(self))
    }
}

impl IntoVal for Rc<str> {
    fn into_val(self, _vm: &Vm) -> VmResult<Val> {
        Ok(Val::Str(self))
    }
}

/// `None` marshals to `Some(None)`: the "no value" sentinel is a match.
impl<T: FromVal> FromVal for Option<T> {
    fn from_val(vm: &Vm, val: &Val) -> Option<Self> {
        match val {
            Val::None => Some(None),
            other => T::from_val(vm, other).map(Some),
        }
    }

    fn expected() -> String {
        format!("{} or None", T::expected())
    }
}

impl<T: IntoVal> IntoVal for Option<T> {
    fn into_val(self, vm: &Vm) -> VmResult<Val> {
        match self {
            Some(v) => v.into_val(vm),
            None => Ok(Val::None),
        }
    }
}

impl<T: FromVal> FromVal for Vec<T> {
    fn from_val(vm: &Vm, val: &Val) -> Option<Self> {
        match val {
            Val::List(items) => items.borrow().iter().map(|v| T::from_val(vm, v)).collect(),
            Val::Tuple(items) => items.iter().map(|v| T::from_val(vm, v)).collect(),
            _ => None,
        }
    }

    fn expected() -> String {
        format!("list[{}]", T::expected())
    }
}

impl<T: IntoVal> IntoVal for Vec<T> {
    fn into_val(self, vm: &Vm) -> VmResult<Val> {
        let items = self.into_iter().map(|v| v.into_val(vm)).collect::<VmResult<Vec<_>>>()?;
        Ok(Val::list(items))
    }
}

impl<T: IntoVal> IntoVal for VmResult<T> {
    fn into_val(self, vm: &Vm) -> VmResult<Val> {
        self?.into_val(vm)
    }
}

impl<T: IntoVal> IntoVal for anyhow::Result<T> {
    fn into_val(self, vm: &Vm) -> VmResult<Val> {
        self.map_err(VmError::from_native)?.into_val(vm)
    }
}

/// A native-class argument taken by value is a snapshot of the object.
///
/// This is what keeps `p.append(p)` well defined: `other` is copied out
/// before the receiver is borrowed mutably.
impl<T: NativeClass + Clone> FromVal for T {
    fn from_val(vm: &Vm, val: &Val) -> Option<Self> {
        let inst = instance_of::<T>(vm, val)?;
        let value = inst.borrow_as::<T>().ok()?.clone();
        Some(value)
    }

    fn expected() -> String {
        short_type_name::<T>().to_string()
    }
}

/// Returning a native value moves it into a fresh managed slot.
impl<T: NativeClass> IntoVal for T {
    fn into_val(self, vm: &Vm) -> VmResult<Val> {
        vm.instantiate(self)
    }
}

/// Typed handle to a native object that shares the object's identity.
pub struct Obj<T> {
    inst: Rc<Instance>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: NativeClass> Obj<T> {
    /// Downcast a value to a handle, checking the registered class.
    pub fn from_val_checked(vm: &Vm, val: &Val) -> Option<Self> {
        instance_of::<T>(vm, val).map(|inst| Obj {
            inst,
            _marker: PhantomData,
        })
    }

    pub fn borrow(&self) -> VmResult<Ref<'_, T>> {
        self.inst.borrow_as::<T>()
    }

    pub fn borrow_mut(&self) -> VmResult<RefMut<'_, T>> {
        self.inst.borrow_mut_as::<T>()
    }

    pub fn instance(&self) -> &Rc<Instance> {
        &self.inst
    }

    pub fn ptr_eq(&self, other: &Obj<T>) -> bool {
        Rc::ptr_eq(&self.inst, &other.inst)
    }

    pub fn to_val(&self) -> Val {
        Val::Instance(self.inst.clone())
    }
}

impl<T> Clone for Obj<T> {
    fn clone(&self) -> Self {
        Obj {
            inst: self.inst.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Obj<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Obj<{}>({:p})", short_type_name::<T>(), Rc::as_ptr(&self.inst))
    }
}

impl<T: NativeClass> FromVal for Obj<T> {
    fn from_val(vm: &Vm, val: &Val) -> Option<Self> {
        Obj::from_val_checked(vm, val)
    }

    fn expected() -> String {
        short_type_name::<T>().to_string()
    }
}

impl<T> IntoVal for Obj<T> {
    fn into_val(self, _vm: &Vm) -> VmResult<Val> {
        Ok(Val::Instance(self.inst))
    }
}
