use tracing::debug;

use super::ast::{Expr, Stmt, StmtKind, Target};
use crate::runtime::{ErrorKind, Vm, VmError, VmResult};
use crate::value::Val;

/// Executes parsed statements against the globals of `__main__`.
pub struct Interpreter<'a> {
    vm: &'a mut Vm,
    filename: &'a str,
}

impl<'a> Interpreter<'a> {
    pub fn new(vm: &'a mut Vm, filename: &'a str) -> Self {
        Self { vm, filename }
    }

    pub fn run(&mut self, stmts: &[Stmt]) -> VmResult<()> {
        for stmt in stmts {
            self.exec(stmt).map_err(|e| e.at(self.filename, stmt.line))?;
        }
        Ok(())
    }

    fn exec(&mut self, stmt: &Stmt) -> VmResult<()> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval(expr)?;
            }
            StmtKind::Assign(target, expr) => {
                let value = self.eval(expr)?;
                self.assign(target, value)?;
            }
            StmtKind::AugAssign(Target::Name(name), op, expr) => {
                let current = self.load(name)?;
                let rhs = self.eval(expr)?;
                let result = self.vm.inplace_op(*op, &current, &rhs)?;
                self.vm.set_global(name, result);
            }
            StmtKind::AugAssign(Target::Attr(object, name), op, expr) => {
                let object = self.eval(object)?;
                let current = self.vm.get_attr(&object, name)?;
                let rhs = self.eval(expr)?;
                let result = self.vm.inplace_op(*op, &current, &rhs)?;
                self.vm.set_attr(&object, name, result)?;
            }
            StmtKind::Pass => {}
            StmtKind::Try { body, handlers } => {
                let err = match self.run(body) {
                    Ok(()) => return Ok(()),
                    Err(err) => err,
                };
                let Some(handler) = handlers
                    .iter()
                    .find(|h| h.kind.as_deref().is_none_or(|kind| err.kind.matches(kind)))
                else {
                    return Err(err);
                };
                debug!(target: "tether::script", kind = %err.kind, line = stmt.line, "exception handled");
                if let Some(alias) = &handler.alias {
                    self.vm.set_global(alias, Val::from(err.message.clone()));
                }
                self.run(&handler.body)?;
            }
        }
        Ok(())
    }

    fn assign(&mut self, target: &Target, value: Val) -> VmResult<()> {
        match target {
            Target::Name(name) => {
                self.vm.set_global(name, value);
                Ok(())
            }
            Target::Attr(object, name) => {
                let object = self.eval(object)?;
                self.vm.set_attr(&object, name, value)
            }
        }
    }

    fn load(&self, name: &str) -> VmResult<Val> {
        self.vm
            .get_global(name)
            .ok_or_else(|| VmError::new(ErrorKind::NameError, format!("name '{}' is not defined", name)))
    }

    pub fn eval(&mut self, expr: &Expr) -> VmResult<Val> {
        match expr {
            Expr::Lit(value) => Ok(value.clone()),
            Expr::Name(name) => self.load(name),
            Expr::Attr(object, name) => {
                let object = self.eval(object)?;
                self.vm.get_attr(&object, name)
            }
            Expr::Call { func, args, kwargs } => {
                let callee = self.eval(func)?;
                let mut positional = Vec::with_capacity(args.len());
                for arg in args {
                    positional.push(self.eval(arg)?);
                }
                let mut keywords = Vec::with_capacity(kwargs.len());
                for (name, arg) in kwargs {
                    keywords.push((name.clone(), self.eval(arg)?));
                }
                self.vm.call_with_kwargs(&callee, positional, keywords)
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                self.vm.binary_op(*op, &lhs, &rhs)
            }
            Expr::Neg(operand) => {
                let operand = self.eval(operand)?;
                self.vm.negate(&operand)
            }
            Expr::List(items) => Ok(Val::list(self.eval_all(items)?)),
            Expr::Tuple(items) => Ok(Val::tuple(self.eval_all(items)?)),
        }
    }

    fn eval_all(&mut self, items: &[Expr]) -> VmResult<Vec<Val>> {
        items.iter().map(|item| self.eval(item)).collect()
    }
}
