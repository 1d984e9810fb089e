use std::rc::Rc;

use tracing::trace;

use super::args::ArgsView;
use super::registry::{ClassId, MemberKind, MemberSlot};
use super::signature::Signature;
use crate::runtime::{Vm, VmError, VmResult};
use crate::value::Val;

/// Native implementation behind a bound callable.
#[derive(Clone)]
pub enum Callable {
    /// Marshalling generated from the Rust signature; a failed cast is an
    /// `ArgumentTypeError`.
    Typed(Rc<dyn Fn(&mut Vm, &Val, &ArgsView<'_>) -> VmResult<Val>>),
    /// Receives the raw view and checks argument types itself.
    Raw(Rc<dyn Fn(&mut Vm, &Val, ArgsView<'_>) -> anyhow::Result<Val>>),
}

/// Match positional and keyword arguments to parameter slots and fill in
/// declared defaults.
pub(crate) fn bind_arguments(
    sig: &Signature,
    positional: Vec<Val>,
    keywords: Vec<(Rc<str>, Val)>,
) -> VmResult<Vec<Val>> {
    let given = positional.len();
    let accepts = sig.positional();
    let mut slots: Vec<Option<Val>> = vec![None; sig.arity()];
    let mut extra = Vec::new();

    for (i, value) in positional.into_iter().enumerate() {
        if i < accepts {
            slots[i] = Some(value);
        } else if sig.rest().is_some() {
            extra.push(value);
        } else {
            return Err(VmError::type_error(format!(
                "{}() takes {} positional argument{} but {} were given",
                sig.name(),
                accepts,
                if accepts == 1 { "" } else { "s" },
                given
            )));
        }
    }

    for (name, value) in keywords {
        let index = sig.param_index(&name).ok_or_else(|| {
            VmError::type_error(format!(
                "{}() got an unexpected keyword argument '{}'",
                sig.name(),
                name
            ))
        })?;
        if slots[index].is_some() {
            return Err(VmError::type_error(format!(
                "{}() got multiple values for argument '{}'",
                sig.name(),
                name
            )));
        }
        slots[index] = Some(value);
    }

    let mut bound = Vec::with_capacity(sig.slot_count());
    for (slot, param) in slots.into_iter().zip(sig.params()) {
        match (slot, &param.default) {
            (Some(value), _) => bound.push(value),
            (None, Some(default)) => bound.push(default.clone()),
            (None, None) => {
                return Err(VmError::type_error(format!(
                    "{}() missing required argument '{}'",
                    sig.name(),
                    param.name
                )));
            }
        }
    }
    if sig.rest().is_some() {
        bound.push(Val::tuple(extra));
    }
    Ok(bound)
}

impl Vm {
    /// Call any callable value with positional arguments.
    pub fn call(&mut self, callee: &Val, args: Vec<Val>) -> VmResult<Val> {
        self.call_with_kwargs(callee, args, Vec::new())
    }

    pub fn call_with_kwargs(
        &mut self,
        callee: &Val,
        mut args: Vec<Val>,
        kwargs: Vec<(Rc<str>, Val)>,
    ) -> VmResult<Val> {
        match callee {
            Val::Function(func) => {
                let func = func.clone();
                self.invoke(&func.signature, &func.callable, &func.module, &Val::None, args, kwargs)
            }
            Val::BoundMethod(method) => {
                let (signature, callable, owner, kind) = self.member_callable(method.class, method.member)?;
                let receiver = match &method.receiver {
                    // Looked up through the class: the receiver is the first argument.
                    Val::Class(_) if kind != MemberKind::Constructor => {
                        if args.is_empty() {
                            return Err(VmError::type_error(format!(
                                "unbound method {}.{}() needs an argument",
                                owner,
                                signature.name()
                            )));
                        }
                        args.remove(0)
                    }
                    receiver => receiver.clone(),
                };
                self.invoke(&signature, &callable, &owner, &receiver, args, kwargs)
            }
            Val::Class(id) => {
                let id = *id;
                let (signature, callable, owner) = {
                    let desc = self.class(id)?;
                    let (index, _) = desc
                        .constructor()
                        .ok_or_else(|| VmError::type_error(format!("cannot create '{}' instances", desc.name())))?;
                    let (signature, callable, owner, _) = self.member_callable(id, index)?;
                    (signature, callable, owner)
                };
                self.invoke(&signature, &callable, &owner, &Val::Class(id), args, kwargs)
            }
            other => Err(VmError::type_error(format!(
                "'{}' object is not callable",
                self.type_name(other)
            ))),
        }
    }

    fn member_callable(
        &self,
        class: ClassId,
        member: usize,
    ) -> VmResult<(Rc<Signature>, Callable, Rc<str>, MemberKind)> {
        let desc = self.class(class)?;
        let binding = desc
            .member_at(member)
            .ok_or_else(|| VmError::runtime(format!("stale member #{} on '{}'", member, desc.name())))?;
        match (&binding.slot, &binding.signature) {
            (MemberSlot::Call(callable), Some(signature)) => Ok((
                signature.clone(),
                callable.clone(),
                Rc::from(desc.name()),
                binding.kind,
            )),
            _ => Err(VmError::type_error(format!(
                "'{}.{}' is not callable",
                desc.name(),
                binding.name
            ))),
        }
    }

    fn invoke(
        &mut self,
        signature: &Signature,
        callable: &Callable,
        owner: &str,
        receiver: &Val,
        args: Vec<Val>,
        kwargs: Vec<(Rc<str>, Val)>,
    ) -> VmResult<Val> {
        self.enter_call()?;
        let result = self.invoke_bound(signature, callable, owner, receiver, args, kwargs);
        self.leave_call();
        result
    }

    fn invoke_bound(
        &mut self,
        signature: &Signature,
        callable: &Callable,
        owner: &str,
        receiver: &Val,
        args: Vec<Val>,
        kwargs: Vec<(Rc<str>, Val)>,
    ) -> VmResult<Val> {
        let slots = bind_arguments(signature, args, kwargs)?;
        let view = ArgsView::new(&slots, signature, owner);
        trace!(target: "tether::dispatch", owner, callee = signature.name(), argc = slots.len(), "dispatch");
        match callable {
            Callable::Typed(f) => f(self, receiver, &view),
            Callable::Raw(f) => f(self, receiver, view).map_err(VmError::from_native),
        }
    }
}
