use super::error::{ErrorKind, VmError, VmResult};
use super::vm::Vm;
use crate::script::ast::BinOp;
use crate::value::Val;

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

fn number(value: &Val) -> Option<Num> {
    match value {
        Val::Int(i) => Some(Num::Int(*i)),
        Val::Bool(b) => Some(Num::Int(i64::from(*b))),
        Val::Float(x) => Some(Num::Float(*x)),
        _ => None,
    }
}

fn truthy(value: &Val) -> bool {
    match value {
        Val::None => false,
        Val::Bool(b) => *b,
        Val::Int(i) => *i != 0,
        Val::Float(x) => *x != 0.0,
        Val::Str(s) => !s.is_empty(),
        Val::List(items) => !items.borrow().is_empty(),
        Val::Tuple(items) => !items.is_empty(),
        _ => true,
    }
}

fn overflow() -> VmError {
    VmError::new(ErrorKind::ValueError, "integer overflow")
}

fn arithmetic(op: BinOp, lhs: Num, rhs: Num) -> VmResult<Val> {
    match (lhs, rhs) {
        (Num::Int(a), Num::Int(b)) => match op {
            BinOp::Add => a.checked_add(b).map(Val::Int).ok_or_else(overflow),
            BinOp::Sub => a.checked_sub(b).map(Val::Int).ok_or_else(overflow),
            BinOp::Mul => a.checked_mul(b).map(Val::Int).ok_or_else(overflow),
            _ => float_arithmetic(op, a as f64, b as f64),
        },
        (Num::Int(a), Num::Float(b)) => float_arithmetic(op, a as f64, b),
        (Num::Float(a), Num::Int(b)) => float_arithmetic(op, a, b as f64),
        (Num::Float(a), Num::Float(b)) => float_arithmetic(op, a, b),
    }
}

fn float_arithmetic(op: BinOp, a: f64, b: f64) -> VmResult<Val> {
    let value = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div if b == 0.0 => {
            return Err(VmError::new(ErrorKind::ZeroDivisionError, "division by zero"));
        }
        BinOp::Div => a / b,
        _ => return Err(VmError::runtime(format!("'{}' is not an arithmetic operator", op.symbol()))),
    };
    Ok(Val::Float(value))
}

/// Upper bound on the element (or byte) count a repetition may produce.
const MAX_REPEAT_LEN: usize = 1 << 28;

/// Repetition count for `len` units repeated `times` times. Negative counts
/// and empty operands repeat zero times.
fn repeat_count(len: usize, times: i64) -> VmResult<usize> {
    let times = usize::try_from(times).unwrap_or(0);
    if len == 0 {
        return Ok(0);
    }
    match len.checked_mul(times) {
        Some(total) if total <= MAX_REPEAT_LEN => Ok(times),
        _ => Err(VmError::new(ErrorKind::ValueError, "repeat count too large")),
    }
}

fn repeat(items: &[Val], times: i64) -> VmResult<Vec<Val>> {
    let times = repeat_count(items.len(), times)?;
    let mut out = Vec::with_capacity(items.len() * times);
    for _ in 0..times {
        out.extend(items.iter().cloned());
    }
    Ok(out)
}

fn format_float(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        ryu::Buffer::new().format_finite(x).to_string()
    }
}

fn quote(s: &str) -> String {
    let delim = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

impl Vm {
    /// Call the dunder `name` on a native operand, if its class binds one.
    fn call_dunder(&mut self, target: &Val, name: &str, args: Vec<Val>) -> VmResult<Option<Val>> {
        match self.lookup_method(target, name) {
            Some(method) => self.call(&method, args).map(Some),
            None => Ok(None),
        }
    }

    fn unsupported(&self, op: BinOp, lhs: &Val, rhs: &Val) -> VmError {
        VmError::type_error(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            self.type_name(lhs),
            self.type_name(rhs)
        ))
    }

    pub fn binary_op(&mut self, op: BinOp, lhs: &Val, rhs: &Val) -> VmResult<Val> {
        match op {
            BinOp::Is => return Ok(Val::Bool(lhs.is_same(rhs))),
            BinOp::IsNot => return Ok(Val::Bool(!lhs.is_same(rhs))),
            _ => {}
        }
        if let Some(dunder) = op.dunder()
            && let Some(result) = self.call_dunder(lhs, dunder, vec![rhs.clone()])?
        {
            return Ok(result);
        }
        if op == BinOp::Ne
            && let Some(equal) = self.call_dunder(lhs, "__eq__", vec![rhs.clone()])?
        {
            return Ok(Val::Bool(!truthy(&equal)));
        }
        match op {
            BinOp::Eq => return Ok(Val::Bool(lhs == rhs)),
            BinOp::Ne => return Ok(Val::Bool(lhs != rhs)),
            _ => {}
        }
        if let (Some(a), Some(b)) = (number(lhs), number(rhs)) {
            return arithmetic(op, a, b);
        }
        let value = match (op, lhs, rhs) {
            (BinOp::Add, Val::Str(a), Val::Str(b)) => Val::from(format!("{}{}", a, b)),
            (BinOp::Mul, Val::Str(s), Val::Int(n)) => Val::from(s.repeat(repeat_count(s.len(), *n)?)),
            (BinOp::Add, Val::List(a), Val::List(b)) => {
                let mut items = a.borrow().clone();
                items.extend(b.borrow().iter().cloned());
                Val::list(items)
            }
            (BinOp::Mul, Val::List(a), Val::Int(n)) => Val::list(repeat(&a.borrow(), *n)?),
            (BinOp::Add, Val::Tuple(a), Val::Tuple(b)) => Val::tuple(a.iter().chain(b.iter()).cloned().collect()),
            _ => return Err(self.unsupported(op, lhs, rhs)),
        };
        Ok(value)
    }

    /// `lhs op= rhs`: the in-place dunder when bound, else the plain operator.
    /// The caller rebinds the target to the result either way.
    pub fn inplace_op(&mut self, op: BinOp, lhs: &Val, rhs: &Val) -> VmResult<Val> {
        if let Some(dunder) = op.inplace_dunder()
            && let Some(result) = self.call_dunder(lhs, dunder, vec![rhs.clone()])?
        {
            return Ok(result);
        }
        if let (BinOp::Add, Val::List(items)) = (op, lhs) {
            let extra: Vec<Val> = match rhs {
                Val::List(other) => other.borrow().clone(),
                Val::Tuple(other) => other.to_vec(),
                _ => return Err(self.unsupported(op, lhs, rhs)),
            };
            items.borrow_mut().extend(extra);
            return Ok(lhs.clone());
        }
        self.binary_op(op, lhs, rhs)
    }

    pub fn negate(&mut self, value: &Val) -> VmResult<Val> {
        match number(value) {
            Some(Num::Int(i)) => i.checked_neg().map(Val::Int).ok_or_else(overflow),
            Some(Num::Float(x)) => Ok(Val::Float(-x)),
            None => self.call_dunder(value, "__neg__", Vec::new())?.ok_or_else(|| {
                VmError::type_error(format!("bad operand type for unary -: '{}'", self.type_name(value)))
            }),
        }
    }

    pub fn repr(&mut self, value: &Val) -> VmResult<String> {
        let text = match value {
            Val::None => "None".to_string(),
            Val::Bool(true) => "True".to_string(),
            Val::Bool(false) => "False".to_string(),
            Val::Int(i) => itoa::Buffer::new().format(*i).to_string(),
            Val::Float(x) => format_float(*x),
            Val::Str(s) => quote(s),
            Val::List(items) => {
                let items = items.borrow().clone();
                format!("[{}]", self.join_repr(&items)?)
            }
            Val::Tuple(items) if items.len() == 1 => format!("({},)", self.repr(&items[0])?),
            Val::Tuple(items) => format!("({})", self.join_repr(items)?),
            Val::Instance(inst) => match self.call_dunder(value, "__repr__", Vec::new())? {
                Some(Val::Str(s)) => s.to_string(),
                Some(other) => {
                    return Err(VmError::type_error(format!(
                        "__repr__ returned non-string (type {})",
                        self.type_name(&other)
                    )));
                }
                None => format!("<{} object at {:p}>", self.type_name(value), std::rc::Rc::as_ptr(inst)),
            },
            Val::Class(id) => format!("<class '{}'>", self.class(*id)?.name()),
            Val::Function(f) => format!("<built-in function {}>", f.name()),
            Val::BoundMethod(m) => {
                let desc = self.class(m.class)?;
                let member = desc.member_at(m.member).map(|b| b.name().to_string()).unwrap_or_default();
                format!("<bound method {}.{}>", desc.name(), member)
            }
            Val::Module(m) => format!("<module '{}'>", m.name()),
        };
        Ok(text)
    }

    fn join_repr(&mut self, items: &[Val]) -> VmResult<String> {
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            parts.push(self.repr(item)?);
        }
        Ok(parts.join(", "))
    }

    /// `str(value)`: text is printed raw, natives may bind `__str__`.
    pub fn to_str(&mut self, value: &Val) -> VmResult<String> {
        match value {
            Val::Str(s) => Ok(s.to_string()),
            Val::Instance(_) => match self.call_dunder(value, "__str__", Vec::new())? {
                Some(Val::Str(s)) => Ok(s.to_string()),
                Some(other) => Err(VmError::type_error(format!(
                    "__str__ returned non-string (type {})",
                    self.type_name(&other)
                ))),
                None => self.repr(value),
            },
            other => self.repr(other),
        }
    }

    pub fn length_of(&mut self, value: &Val) -> VmResult<usize> {
        let len = match value {
            Val::Str(s) => s.chars().count(),
            Val::List(items) => items.borrow().len(),
            Val::Tuple(items) => items.len(),
            Val::Instance(_) => match self.call_dunder(value, "__len__", Vec::new())? {
                Some(Val::Int(n)) => usize::try_from(n)
                    .map_err(|_| VmError::new(ErrorKind::ValueError, "__len__() should return >= 0"))?,
                Some(other) => {
                    return Err(VmError::type_error(format!(
                        "'{}' object cannot be interpreted as an integer",
                        self.type_name(&other)
                    )));
                }
                None => return Err(self.no_len(value)),
            },
            other => return Err(self.no_len(other)),
        };
        Ok(len)
    }

    fn no_len(&self, value: &Val) -> VmError {
        VmError::type_error(format!("object of type '{}' has no len()", self.type_name(value)))
    }
}
