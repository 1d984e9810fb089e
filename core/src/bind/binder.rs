//! Registration API.
//!
//! ```ignore
//! let point = ClassBuilder::<Point>::new("Point")
//!     .constructor("__new__(cls, x=0, y=0)", |x: i64, y: i64| Point { x, y })?
//!     .field("x", |p| &p.x, |p| &mut p.x)?
//!     .method("__add__(self, other)", |a: &Point, b: Point| a.add(&b))?;
//! vm.register_class("builtins", point)?;
//! ```

use std::any::{TypeId, type_name};
use std::marker::PhantomData;
use std::rc::Rc;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::args::ArgsView;
use super::dispatch::Callable;
use super::error::BindError;
use super::marshal::{FromVal, IntoVal, NativeClass};
use super::native::{NativeFn, NativeMethod};
use super::registry::{ClassId, Getter, MemberBinding, MemberKind, MemberSlot, Setter};
use super::signature::Signature;
use crate::runtime::{Vm, VmError};
use crate::value::{Instance, ModuleObj, NativeFunction, Val};

pub const BINARY_OPERATORS: &[&str] = &[
    "__add__",
    "__sub__",
    "__mul__",
    "__truediv__",
    "__iadd__",
    "__isub__",
    "__imul__",
    "__eq__",
    "__ne__",
];

pub const UNARY_OPERATORS: &[&str] = &["__repr__", "__str__", "__len__", "__neg__"];

fn check_arity(signature: &Signature, native: usize) -> Result<(), BindError> {
    if signature.slot_count() != native {
        return Err(BindError::ArityMismatch {
            signature: signature.text().to_string(),
            declared: signature.slot_count(),
            native,
        });
    }
    Ok(())
}

/// Reserved operator name -> parameter count after `self`.
static OPERATOR_ARITY: Lazy<FxHashMap<&'static str, usize>> = Lazy::new(|| {
    let binary = BINARY_OPERATORS.iter().map(|name| (*name, 1));
    let unary = UNARY_OPERATORS.iter().map(|name| (*name, 0));
    binary.chain(unary).collect()
});

fn classify(signature: &Signature) -> Result<MemberKind, BindError> {
    let name = signature.name();
    let bad = |reason: &str| BindError::BadOperator {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    match OPERATOR_ARITY.get(name) {
        Some(&arity) if signature.arity() != arity || signature.rest().is_some() => Err(bad(if arity == 1 {
            "expects exactly (self, other)"
        } else {
            "expects exactly (self)"
        })),
        Some(_) => Ok(MemberKind::Operator),
        None if name == "__new__" => Err(bad("bind constructors with ClassBuilder::constructor")),
        None => Ok(MemberKind::Method),
    }
}

/// Accumulates the members of one native class. Consumed by
/// [`Vm::register_class`].
pub struct ClassBuilder<T> {
    name: Rc<str>,
    members: Vec<MemberBinding>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: NativeClass> ClassBuilder<T> {
    pub fn new(name: &str) -> Self {
        Self {
            name: Rc::from(name),
            members: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[MemberBinding] {
        &self.members
    }

    fn push(mut self, binding: MemberBinding) -> Result<Self, BindError> {
        if self.members.iter().any(|m| m.name == binding.name) {
            return Err(BindError::DuplicateMember {
                owner: self.name.to_string(),
                name: binding.name.to_string(),
            });
        }
        self.members.push(binding);
        Ok(self)
    }

    /// Bind `__new__`. The signature starts with `cls`; the remaining
    /// parameters feed `f`, whose result is moved into a fresh managed slot.
    pub fn constructor<Args, F>(self, sig: &str, f: F) -> Result<Self, BindError>
    where
        F: NativeFn<Args, Output = T>,
    {
        let mut signature = Signature::parse(sig)?;
        if signature.name() != "__new__" {
            return Err(BindError::MalformedSignature {
                signature: signature.text().to_string(),
                reason: "a constructor must be named __new__".to_string(),
            });
        }
        signature.strip_receiver("cls")?;
        check_arity(&signature, <F as NativeFn<Args>>::ARITY)?;
        let callable = Callable::Typed(Rc::new(move |vm: &mut Vm, _cls: &Val, args: &ArgsView<'_>| {
            f.invoke(vm, args)
        }));
        self.push(MemberBinding {
            kind: MemberKind::Constructor,
            name: Rc::from("__new__"),
            signature: Some(Rc::new(signature)),
            slot: MemberSlot::Call(callable),
        })
    }

    /// Read/write field through a pair of accessors.
    pub fn field<V, G, S>(self, name: &str, get: G, get_mut: S) -> Result<Self, BindError>
    where
        V: FromVal + IntoVal + Clone + 'static,
        G: Fn(&T) -> &V + 'static,
        S: Fn(&mut T) -> &mut V + 'static,
    {
        let owner = self.name.clone();
        let field: Rc<str> = Rc::from(name);
        let field_name = field.clone();
        let set: Setter = Rc::new(move |vm: &Vm, inst: &Instance, value: &Val| {
            let value = V::from_val(vm, value).ok_or_else(|| {
                VmError::argument(format!(
                    "{}.{} must be {}, not {}",
                    owner,
                    field_name,
                    V::expected(),
                    vm.type_name(value)
                ))
            })?;
            let mut this = inst.borrow_mut_as::<T>()?;
            *get_mut(&mut *this) = value;
            Ok(())
        });
        self.push(MemberBinding {
            kind: MemberKind::Field,
            name: field,
            signature: None,
            slot: MemberSlot::Field {
                get: getter(get),
                set: Some(set),
            },
        })
    }

    /// Getter-only field; assigning to it is an `AttributeError`.
    pub fn readonly<V, G>(self, name: &str, get: G) -> Result<Self, BindError>
    where
        V: IntoVal + Clone + 'static,
        G: Fn(&T) -> &V + 'static,
    {
        self.push(MemberBinding {
            kind: MemberKind::Field,
            name: Rc::from(name),
            signature: None,
            slot: MemberSlot::Field {
                get: getter(get),
                set: None,
            },
        })
    }

    /// Typed method or operator. The signature starts with `self` and lists
    /// exactly as many further parameters as `f` takes after its receiver.
    pub fn method<Args, F>(self, sig: &str, f: F) -> Result<Self, BindError>
    where
        F: NativeMethod<T, Args>,
    {
        let mut signature = Signature::parse(sig)?;
        signature.strip_receiver("self")?;
        check_arity(&signature, <F as NativeMethod<T, Args>>::ARITY)?;
        let kind = classify(&signature)?;
        let callable = Callable::Typed(Rc::new(move |vm: &mut Vm, receiver: &Val, args: &ArgsView<'_>| {
            f.invoke(vm, receiver, args)
        }));
        self.push(MemberBinding {
            kind,
            name: Rc::from(signature.name()),
            signature: Some(Rc::new(signature)),
            slot: MemberSlot::Call(callable),
        })
    }

    /// Method whose body marshals its own arguments.
    pub fn method_raw<F>(self, sig: &str, f: F) -> Result<Self, BindError>
    where
        F: Fn(&mut Vm, &Val, ArgsView<'_>) -> anyhow::Result<Val> + 'static,
    {
        let mut signature = Signature::parse(sig)?;
        signature.strip_receiver("self")?;
        let kind = classify(&signature)?;
        self.push(MemberBinding {
            kind,
            name: Rc::from(signature.name()),
            signature: Some(Rc::new(signature)),
            slot: MemberSlot::Call(Callable::Raw(Rc::new(f))),
        })
    }

    /// Class-level attribute, shared by every instance.
    pub fn constant(self, name: &str, value: impl Into<Val>) -> Result<Self, BindError> {
        self.push(MemberBinding {
            kind: MemberKind::Constant,
            name: Rc::from(name),
            signature: None,
            slot: MemberSlot::Constant(value.into()),
        })
    }
}

fn getter<T, V, G>(get: G) -> Getter
where
    T: NativeClass,
    V: IntoVal + Clone + 'static,
    G: Fn(&T) -> &V + 'static,
{
    Rc::new(move |vm: &Vm, inst: &Instance| {
        let value = {
            let this = inst.borrow_as::<T>()?;
            get(&*this).clone()
        };
        value.into_val(vm)
    })
}

/// Adds free functions and values to a module namespace.
pub struct ModuleBinder {
    module: Rc<ModuleObj>,
}

impl ModuleBinder {
    pub fn module(&self) -> &Rc<ModuleObj> {
        &self.module
    }

    fn define(self, name: &str, value: Val) -> Result<Self, BindError> {
        if self.module.contains(name) {
            return Err(BindError::DuplicateMember {
                owner: self.module.name().to_string(),
                name: name.to_string(),
            });
        }
        self.module.set(name, value);
        Ok(self)
    }

    fn define_function(self, signature: Signature, callable: Callable) -> Result<Self, BindError> {
        debug!(target: "tether::bind", module = self.module.name(), function = signature.text(), "bound native function");
        let name = signature.name().to_string();
        let function = NativeFunction {
            module: Rc::from(self.module.name()),
            signature: Rc::new(signature),
            callable,
        };
        self.define(&name, Val::Function(Rc::new(function)))
    }

    /// Typed free function.
    pub fn function<Args, F>(self, sig: &str, f: F) -> Result<Self, BindError>
    where
        F: NativeFn<Args>,
    {
        let signature = Signature::parse(sig)?;
        check_arity(&signature, <F as NativeFn<Args>>::ARITY)?;
        let callable = Callable::Typed(Rc::new(move |vm: &mut Vm, _recv: &Val, args: &ArgsView<'_>| {
            f.invoke(vm, args)
        }));
        self.define_function(signature, callable)
    }

    /// Free function that receives the raw argument view, for entry points
    /// that branch over several unrelated argument types.
    pub fn function_raw<F>(self, sig: &str, f: F) -> Result<Self, BindError>
    where
        F: Fn(&mut Vm, ArgsView<'_>) -> anyhow::Result<Val> + 'static,
    {
        let signature = Signature::parse(sig)?;
        let callable = Callable::Raw(Rc::new(move |vm: &mut Vm, _recv: &Val, args: ArgsView<'_>| f(vm, args)));
        self.define_function(signature, callable)
    }

    pub fn value(self, name: &str, value: impl Into<Val>) -> Result<Self, BindError> {
        self.define(name, value.into())
    }
}

impl Vm {
    /// Freeze `builder` into a class descriptor and publish the class object
    /// in `module` (created on demand). The name must not already be taken
    /// by another attribute of that module.
    pub fn register_class<T: NativeClass>(&mut self, module: &str, builder: ClassBuilder<T>) -> Result<ClassId, BindError> {
        let ClassBuilder { name, members, .. } = builder;
        // A same-named class is reported by the registry as a duplicate class.
        let taken = self.module(module).is_some_and(|m| m.contains(&name));
        if taken && self.registry.lookup(module, &name).is_none() {
            return Err(BindError::DuplicateMember {
                owner: module.to_string(),
                name: name.to_string(),
            });
        }
        let id = self
            .registry
            .insert(module, name.clone(), TypeId::of::<T>(), type_name::<T>(), members)?;
        self.ensure_module(module).set(&name, Val::Class(id));
        Ok(id)
    }

    /// Start binding free functions into `module` (created on demand).
    pub fn bind_module(&mut self, module: &str) -> ModuleBinder {
        ModuleBinder {
            module: self.ensure_module(module),
        }
    }
}
