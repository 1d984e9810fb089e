use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use super::error::{ErrorKind, VmError, VmResult};
use crate::bind::{ClassDescriptor, ClassId, NativeClass, TypeRegistry, short_type_name};
use crate::script::{self, Interpreter};
use crate::value::{Instance, ModuleObj, Val};

pub const BUILTINS: &str = "builtins";
pub const MAIN: &str = "__main__";

#[derive(Debug, Clone)]
pub struct VmOptions {
    /// Nesting limit for native and script calls.
    pub max_call_depth: usize,
}

impl Default for VmOptions {
    fn default() -> Self {
        Self { max_call_depth: 256 }
    }
}

/// One interpreter instance. Owns its class registry, module namespaces and
/// value stack; dropping the VM releases all of them.
pub struct Vm {
    options: VmOptions,
    pub(crate) registry: TypeRegistry,
    modules: FxHashMap<Rc<str>, Rc<ModuleObj>>,
    builtins: Rc<ModuleObj>,
    main: Rc<ModuleObj>,
    stack: Vec<Val>,
    depth: usize,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Self::with_options(VmOptions::default())
    }

    pub fn with_options(options: VmOptions) -> Self {
        let builtins = Rc::new(ModuleObj::new(BUILTINS));
        let main = Rc::new(ModuleObj::new(MAIN));
        let mut modules = FxHashMap::default();
        modules.insert(Rc::from(BUILTINS), builtins.clone());
        modules.insert(Rc::from(MAIN), main.clone());
        debug!(target: "tether::vm", max_call_depth = options.max_call_depth, "vm created");
        Self {
            options,
            registry: TypeRegistry::new(),
            modules,
            builtins,
            main,
            stack: Vec::new(),
            depth: 0,
        }
    }

    pub fn options(&self) -> &VmOptions {
        &self.options
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub(crate) fn class(&self, id: ClassId) -> VmResult<&ClassDescriptor> {
        self.registry
            .get(id)
            .ok_or_else(|| VmError::runtime(format!("unknown class {}", id)))
    }

    pub fn module(&self, name: &str) -> Option<Rc<ModuleObj>> {
        self.modules.get(name).cloned()
    }

    /// Look up `name`, creating an empty module on first use.
    pub fn ensure_module(&mut self, name: &str) -> Rc<ModuleObj> {
        if let Some(module) = self.modules.get(name) {
            return module.clone();
        }
        debug!(target: "tether::vm", module = name, "created module");
        let module = Rc::new(ModuleObj::new(name));
        self.modules.insert(Rc::from(name), module.clone());
        module
    }

    pub fn main_module(&self) -> &Rc<ModuleObj> {
        &self.main
    }

    pub fn builtins_module(&self) -> &Rc<ModuleObj> {
        &self.builtins
    }

    pub fn push(&mut self, value: Val) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> VmResult<Val> {
        self.stack
            .pop()
            .ok_or_else(|| VmError::new(ErrorKind::StackError, "pop from an empty stack"))
    }

    pub fn peek(&self) -> Option<&Val> {
        self.stack.last()
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Pop an object and push its attribute `name`.
    pub fn getattr(&mut self, name: &str) -> VmResult<()> {
        let target = self.pop()?;
        let value = self.get_attr(&target, name)?;
        self.push(value);
        Ok(())
    }

    /// Pop a value, then the target object, and assign `target.name = value`.
    pub fn setattr(&mut self, name: &str) -> VmResult<()> {
        let value = self.pop()?;
        let target = self.pop()?;
        self.set_attr(&target, name, value)
    }

    /// Run `source` in `__main__`.
    pub fn exec(&mut self, source: &str, filename: &str) -> VmResult<()> {
        let program = script::parse_program(source).map_err(|e| e.at(filename, 0))?;
        debug!(target: "tether::vm", filename, statements = program.len(), "exec");
        Interpreter::new(self, filename).run(&program)
    }

    /// Evaluate a single expression in `__main__`.
    pub fn eval(&mut self, source: &str) -> VmResult<Val> {
        let expr = script::parse_expression(source)?;
        Interpreter::new(self, "<eval>").eval(&expr)
    }

    /// Resolve a name the way scripts do: `__main__` first, then `builtins`.
    pub fn get_global(&self, name: &str) -> Option<Val> {
        self.main.get(name).or_else(|| self.builtins.get(name))
    }

    pub fn set_global(&mut self, name: &str, value: Val) {
        self.main.set(name, value);
    }

    /// Move a native value into a fresh managed slot of its registered class.
    pub fn instantiate<T: NativeClass>(&self, value: T) -> VmResult<Val> {
        let class = self.registry.id_of::<T>().ok_or_else(|| {
            VmError::type_error(format!("native type {} is not registered", short_type_name::<T>()))
        })?;
        Ok(Val::Instance(Instance::new(class, Box::new(value))))
    }

    /// Script-visible type name; instances report their class name.
    pub fn type_name(&self, value: &Val) -> String {
        match value {
            Val::Instance(inst) => match self.registry.get(inst.class()) {
                Some(desc) => desc.name().to_string(),
                None => "object".to_string(),
            },
            other => other.kind_name().to_string(),
        }
    }

    pub(crate) fn enter_call(&mut self) -> VmResult<()> {
        if self.depth >= self.options.max_call_depth {
            return Err(VmError::new(
                ErrorKind::RecursionError,
                format!("maximum call depth of {} exceeded", self.options.max_call_depth),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave_call(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn call_depth(&self) -> usize {
        self.depth
    }
}

impl Drop for Vm {
    fn drop(&mut self) {
        trace!(target: "tether::vm", classes = self.registry.len(), stack = self.stack.len(), "vm dropped");
    }
}
