use std::rc::Rc;

use super::error::{VmError, VmResult};
use super::vm::Vm;
use crate::bind::{ClassId, MemberSlot};
use crate::value::{BoundMethod, Val};

impl Vm {
    pub fn get_attr(&self, target: &Val, name: &str) -> VmResult<Val> {
        match target {
            Val::Instance(inst) => {
                let desc = self.class(inst.class())?;
                if name == "__class__" {
                    return Ok(Val::Class(desc.id()));
                }
                let (index, member) = desc.member(name).ok_or_else(|| {
                    VmError::attribute(format!("'{}' object has no attribute '{}'", desc.name(), name))
                })?;
                match &member.slot {
                    MemberSlot::Field { get, .. } => get(self, &**inst),
                    MemberSlot::Call(_) => Ok(bound(target.clone(), desc.id(), index)),
                    MemberSlot::Constant(value) => Ok(value.clone()),
                }
            }
            Val::Class(id) => {
                let desc = self.class(*id)?;
                if name == "__name__" {
                    return Ok(Val::str(desc.name()));
                }
                if name == "__module__" {
                    return Ok(Val::str(desc.module()));
                }
                match desc.member(name) {
                    Some((index, member)) => match &member.slot {
                        MemberSlot::Call(_) => Ok(bound(target.clone(), *id, index)),
                        MemberSlot::Constant(value) => Ok(value.clone()),
                        MemberSlot::Field { .. } => Err(VmError::attribute(format!(
                            "field '{}' of '{}' needs an instance",
                            name,
                            desc.name()
                        ))),
                    },
                    None => Err(VmError::attribute(format!(
                        "type object '{}' has no attribute '{}'",
                        desc.name(),
                        name
                    ))),
                }
            }
            Val::Module(module) => {
                if name == "__name__" {
                    return Ok(Val::str(module.name()));
                }
                module.get(name).ok_or_else(|| {
                    VmError::attribute(format!("module '{}' has no attribute '{}'", module.name(), name))
                })
            }
            Val::BoundMethod(method) if name == "__self__" => Ok(method.receiver.clone()),
            other => Err(VmError::attribute(format!(
                "'{}' object has no attribute '{}'",
                self.type_name(other),
                name
            ))),
        }
    }

    pub fn set_attr(&self, target: &Val, name: &str, value: Val) -> VmResult<()> {
        match target {
            Val::Instance(inst) => {
                let desc = self.class(inst.class())?;
                let (_, member) = desc.member(name).ok_or_else(|| {
                    VmError::attribute(format!("'{}' object has no attribute '{}'", desc.name(), name))
                })?;
                match &member.slot {
                    MemberSlot::Field { set: Some(set), .. } => set(self, &**inst, &value),
                    _ => Err(VmError::attribute(format!(
                        "'{}' object attribute '{}' is read-only",
                        desc.name(),
                        name
                    ))),
                }
            }
            Val::Module(module) => {
                module.set(name, value);
                Ok(())
            }
            Val::Class(id) => Err(VmError::attribute(format!(
                "cannot set '{}' on native class '{}'",
                name,
                self.class(*id)?.name()
            ))),
            other => Err(VmError::attribute(format!(
                "'{}' object has no attribute '{}'",
                self.type_name(other),
                name
            ))),
        }
    }

    /// Bound method for the member `name` of a native instance, if the
    /// class defines a callable member of that name.
    pub(crate) fn lookup_method(&self, target: &Val, name: &str) -> Option<Val> {
        let inst = target.as_instance()?;
        let desc = self.registry.get(inst.class())?;
        let (index, member) = desc.member(name)?;
        match member.slot {
            MemberSlot::Call(_) => Some(bound(target.clone(), desc.id(), index)),
            _ => None,
        }
    }
}

fn bound(receiver: Val, class: ClassId, member: usize) -> Val {
    Val::BoundMethod(Rc::new(BoundMethod {
        receiver,
        class,
        member,
    }))
}
