//! Dynamic values of the script runtime.

mod instance;

#[cfg(test)]
mod value_test;

pub use instance::Instance;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::bind::{Callable, ClassId, Signature};

/// A boxed runtime value, tagged with its dynamic type.
///
/// Heap values are reference counted; cloning a `Val` never copies the
/// underlying object, so identity is preserved across the native boundary.
#[derive(Clone, Default)]
pub enum Val {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Val>>>),
    Tuple(Rc<[Val]>),
    /// A native object living in its managed slot
    Instance(Rc<Instance>),
    /// A registered native class; calling it runs `__new__`
    Class(ClassId),
    Function(Rc<NativeFunction>),
    BoundMethod(Rc<BoundMethod>),
    Module(Rc<ModuleObj>),
}

impl Val {
    pub fn str(s: &str) -> Val {
        Val::Str(Rc::from(s))
    }

    pub fn list(items: Vec<Val>) -> Val {
        Val::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Val>) -> Val {
        Val::Tuple(Rc::from(items))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Val::None)
    }

    /// Built-in type name; instances report `"object"`, use `Vm::type_name`
    /// for the registered class name.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Val::None => "NoneType",
            Val::Bool(_) => "bool",
            Val::Int(_) => "int",
            Val::Float(_) => "float",
            Val::Str(_) => "str",
            Val::List(_) => "list",
            Val::Tuple(_) => "tuple",
            Val::Instance(_) => "object",
            Val::Class(_) => "type",
            Val::Function(_) => "builtin_function",
            Val::BoundMethod(_) => "method",
            Val::Module(_) => "module",
        }
    }

    pub fn as_instance(&self) -> Option<&Rc<Instance>> {
        match self {
            Val::Instance(inst) => Some(inst),
            _ => None,
        }
    }

    /// Address of the managed allocation for heap values.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Val::Str(s) => Some(Rc::as_ptr(s) as *const u8 as usize),
            Val::List(l) => Some(Rc::as_ptr(l) as usize),
            Val::Tuple(t) => Some(Rc::as_ptr(t) as *const Val as usize),
            Val::Instance(i) => Some(Rc::as_ptr(i) as usize),
            Val::Function(f) => Some(Rc::as_ptr(f) as usize),
            Val::BoundMethod(m) => Some(Rc::as_ptr(m) as usize),
            Val::Module(m) => Some(Rc::as_ptr(m) as usize),
            _ => None,
        }
    }

    /// The `is` operator: same object for heap values, equal payload for
    /// immediates.
    pub fn is_same(&self, other: &Val) -> bool {
        match (self, other) {
            (Val::None, Val::None) => true,
            (Val::Bool(a), Val::Bool(b)) => a == b,
            (Val::Int(a), Val::Int(b)) => a == b,
            (Val::Float(a), Val::Float(b)) => a.to_bits() == b.to_bits(),
            (Val::Class(a), Val::Class(b)) => a == b,
            _ => match (self.identity(), other.identity()) {
                (Some(a), Some(b)) => a == b && std::mem::discriminant(self) == std::mem::discriminant(other),
                _ => false,
            },
        }
    }
}

impl PartialEq for Val {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Val::None, Val::None) => true,
            (Val::Bool(a), Val::Bool(b)) => a == b,
            (Val::Int(a), Val::Int(b)) => a == b,
            (Val::Float(a), Val::Float(b)) => a == b,
            (Val::Int(a), Val::Float(b)) | (Val::Float(b), Val::Int(a)) => (*a as f64) == *b,
            (Val::Str(a), Val::Str(b)) => a == b,
            (Val::List(a), Val::List(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Val::Tuple(a), Val::Tuple(b)) => a == b,
            _ => self.is_same(other),
        }
    }
}

impl fmt::Debug for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::None => f.write_str("None"),
            Val::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Val::Int(i) => write!(f, "{}", i),
            Val::Float(x) => write!(f, "{:?}", x),
            Val::Str(s) => write!(f, "{:?}", s),
            Val::List(l) => f.debug_list().entries(l.borrow().iter()).finish(),
            Val::Tuple(t) => {
                let mut tuple = f.debug_tuple("");
                for item in t.iter() {
                    tuple.field(item);
                }
                tuple.finish()
            }
            Val::Instance(inst) => write!(f, "<instance {:?} at {:p}>", inst.class(), Rc::as_ptr(inst)),
            Val::Class(id) => write!(f, "<class {:?}>", id),
            Val::Function(func) => write!(f, "<native function {}>", func.name()),
            Val::BoundMethod(m) => write!(f, "<bound method #{} of {:?}>", m.member, m.receiver),
            Val::Module(m) => write!(f, "<module '{}'>", m.name),
        }
    }
}

impl From<bool> for Val {
    fn from(v: bool) -> Self {
        Val::Bool(v)
    }
}

impl From<i64> for Val {
    fn from(v: i64) -> Self {
        Val::Int(v)
    }
}

impl From<f64> for Val {
    fn from(v: f64) -> Self {
        Val::Float(v)
    }
}

impl From<&str> for Val {
    fn from(v: &str) -> Self {
        Val::str(v)
    }
}

impl From<String> for Val {
    fn from(v: String) -> Self {
        Val::Str(Rc::from(v))
    }
}

/// A free function bound into a module.
pub struct NativeFunction {
    pub(crate) module: Rc<str>,
    pub(crate) signature: Rc<Signature>,
    pub(crate) callable: Callable,
}

impl NativeFunction {
    pub fn name(&self) -> &str {
        self.signature.name()
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// A class member looked up through an instance (or through the class, in
/// which case the receiver is taken from the first argument).
pub struct BoundMethod {
    pub(crate) receiver: Val,
    pub(crate) class: ClassId,
    pub(crate) member: usize,
}

impl BoundMethod {
    pub fn receiver(&self) -> &Val {
        &self.receiver
    }
}

/// A module namespace (`builtins`, `__main__`, ...).
pub struct ModuleObj {
    name: Rc<str>,
    attrs: RefCell<FxHashMap<Rc<str>, Val>>,
}

impl ModuleObj {
    pub fn new(name: &str) -> Self {
        Self {
            name: Rc::from(name),
            attrs: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, name: &str) -> Option<Val> {
        self.attrs.borrow().get(name).cloned()
    }

    pub fn set(&self, name: &str, value: Val) {
        self.attrs.borrow_mut().insert(Rc::from(name), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attrs.borrow().contains_key(name)
    }

    pub fn remove(&self, name: &str) -> Option<Val> {
        self.attrs.borrow_mut().remove(name)
    }

    /// Attribute names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.attrs.borrow().keys().map(|k| k.to_string()).collect();
        names.sort();
        names
    }
}
