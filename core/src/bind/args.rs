use std::ops::Index;

use super::marshal::FromVal;
use super::signature::Signature;
use crate::runtime::{Vm, VmError, VmResult};
use crate::value::Val;

/// Read-only view over the arguments of one call, after keyword binding and
/// default substitution. Slot `i` is the `i`-th declared parameter; when the
/// signature has a `*rest` collector its tuple sits in the last slot.
#[derive(Clone, Copy)]
pub struct ArgsView<'a> {
    slots: &'a [Val],
    signature: &'a Signature,
    owner: &'a str,
}

impl<'a> ArgsView<'a> {
    pub(crate) fn new(slots: &'a [Val], signature: &'a Signature, owner: &'a str) -> Self {
        Self {
            slots,
            signature,
            owner,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a Val> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'a, Val> {
        self.slots.iter()
    }

    pub fn signature(&self) -> &'a Signature {
        self.signature
    }

    /// Class or module the called member belongs to.
    pub fn owner(&self) -> &'a str {
        self.owner
    }

    /// Look a parameter up by its declared name.
    pub fn named(&self, name: &str) -> Option<&'a Val> {
        self.signature.param_index(name).and_then(|i| self.slots.get(i))
    }

    /// Values collected by `*rest`; empty when the signature has none.
    pub fn rest(&self) -> &'a [Val] {
        if self.signature.rest().is_none() {
            return &[];
        }
        match self.slots.last() {
            Some(Val::Tuple(items)) => items,
            _ => &[],
        }
    }

    /// Try one candidate type for slot `index`. No match is not an error.
    pub fn try_cast<T: FromVal>(&self, vm: &Vm, index: usize) -> Option<T> {
        self.slots.get(index).and_then(|v| T::from_val(vm, v))
    }

    /// Marshal slot `index` as `T`, reporting an `ArgumentTypeError` when the
    /// value does not fit.
    pub fn cast<T: FromVal>(&self, vm: &Vm, index: usize) -> VmResult<T> {
        let value = self.slots.get(index).ok_or_else(|| {
            VmError::type_error(format!(
                "{}() missing argument '{}'",
                self.signature.name(),
                self.signature.param_name(index)
            ))
        })?;
        T::from_val(vm, value).ok_or_else(|| {
            VmError::argument(format!(
                "{}.{}() argument '{}' must be {}, not {}",
                self.owner,
                self.signature.name(),
                self.signature.param_name(index),
                T::expected(),
                vm.type_name(value)
            ))
        })
    }
}

impl Index<usize> for ArgsView<'_> {
    type Output = Val;

    fn index(&self, index: usize) -> &Val {
        &self.slots[index]
    }
}
