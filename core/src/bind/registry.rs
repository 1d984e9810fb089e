use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

use super::BindError;
use super::dispatch::Callable;
use super::signature::Signature;
use crate::runtime::{Vm, VmResult};
use crate::value::{Instance, Val};

/// Registry id of a native class. Assigned once, never reused within a VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ClassId(u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Field,
    Method,
    Operator,
    Constructor,
    Constant,
}

pub(crate) type Getter = Rc<dyn Fn(&Vm, &Instance) -> VmResult<Val>>;
pub(crate) type Setter = Rc<dyn Fn(&Vm, &Instance, &Val) -> VmResult<()>>;

pub(crate) enum MemberSlot {
    Field { get: Getter, set: Option<Setter> },
    Call(Callable),
    Constant(Val),
}

/// One exposed member of a class.
pub struct MemberBinding {
    pub(crate) kind: MemberKind,
    pub(crate) name: Rc<str>,
    pub(crate) signature: Option<Rc<Signature>>,
    pub(crate) slot: MemberSlot,
}

impl MemberBinding {
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_deref()
    }

    pub fn is_writable(&self) -> bool {
        matches!(self.slot, MemberSlot::Field { set: Some(_), .. })
    }
}

impl fmt::Debug for MemberBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberBinding")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("signature", &self.signature.as_ref().map(|s| s.text().to_string()))
            .finish()
    }
}

/// Immutable description of a registered class.
pub struct ClassDescriptor {
    id: ClassId,
    name: Rc<str>,
    module: Rc<str>,
    type_id: TypeId,
    type_name: &'static str,
    members: Vec<MemberBinding>,
    index: FxHashMap<Rc<str>, usize>,
}

impl ClassDescriptor {
    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type backing the class.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn members(&self) -> &[MemberBinding] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<(usize, &MemberBinding)> {
        let idx = *self.index.get(name)?;
        Some((idx, &self.members[idx]))
    }

    pub fn member_at(&self, index: usize) -> Option<&MemberBinding> {
        self.members.get(index)
    }

    pub fn constructor(&self) -> Option<(usize, &MemberBinding)> {
        self.member("__new__")
    }

    pub fn info(&self) -> ClassInfo {
        ClassInfo {
            id: self.id,
            module: self.module.to_string(),
            name: self.name.to_string(),
            rust_type: self.type_name.to_string(),
            members: self
                .members
                .iter()
                .map(|m| MemberInfo {
                    kind: m.kind,
                    name: m.name.to_string(),
                    signature: m.signature.as_ref().map(|s| s.text().to_string()),
                })
                .collect(),
        }
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("id", &self.id)
            .field("module", &self.module)
            .field("name", &self.name)
            .field("members", &self.members)
            .finish()
    }
}

/// Serialisable summary of a class, used for introspection.
#[derive(Debug, Clone, Serialize)]
pub struct ClassInfo {
    pub id: ClassId,
    pub module: String,
    pub name: String,
    pub rust_type: String,
    pub members: Vec<MemberInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberInfo {
    pub kind: MemberKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Per-VM table of class descriptors. There is no unregister: a class lives
/// as long as the VM that owns the registry.
#[derive(Default)]
pub struct TypeRegistry {
    classes: Vec<ClassDescriptor>,
    by_name: FxHashMap<(Rc<str>, Rc<str>), ClassId>,
    by_type: FxHashMap<TypeId, ClassId>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(
        &mut self,
        module: &str,
        name: Rc<str>,
        type_id: TypeId,
        type_name: &'static str,
        members: Vec<MemberBinding>,
    ) -> Result<ClassId, BindError> {
        let module: Rc<str> = Rc::from(module);
        if self.by_name.contains_key(&(module.clone(), name.clone())) {
            return Err(BindError::DuplicateClass {
                module: module.to_string(),
                name: name.to_string(),
            });
        }
        if let Some(existing) = self.by_type.get(&type_id) {
            let existing = &self.classes[existing.index()];
            return Err(BindError::DuplicateType {
                type_name,
                existing: format!("{}.{}", existing.module, existing.name),
            });
        }

        let id = ClassId(self.classes.len() as u32);
        let index = members
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        debug!(
            target: "tether::bind",
            %module, class = %name, id = id.0, members = members.len(), "registered native class"
        );
        self.by_name.insert((module.clone(), name.clone()), id);
        self.by_type.insert(type_id, id);
        self.classes.push(ClassDescriptor {
            id,
            name,
            module,
            type_id,
            type_name,
            members,
            index,
        });
        Ok(id)
    }

    pub fn lookup(&self, module: &str, name: &str) -> Option<ClassId> {
        self.by_name.get(&(Rc::from(module), Rc::from(name))).copied()
    }

    pub fn get(&self, id: ClassId) -> Option<&ClassDescriptor> {
        self.classes.get(id.index())
    }

    pub fn id_of<T: 'static>(&self) -> Option<ClassId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.classes.iter()
    }

    pub fn describe(&self) -> Vec<ClassInfo> {
        self.classes.iter().map(ClassDescriptor::info).collect()
    }
}
