//! Demo bindings run by `tether` when no script is given.

use std::rc::Rc;

use anyhow::Result;
use tether_core::{ArgsView, ClassBuilder, NativeClass, Obj, Val, Vm, VmResult};
use tracing::debug;

use crate::console::Console;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl NativeClass for Point {}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Point({}, {})", self.x, self.y)
    }
}

fn add(a: &Point, b: Point) -> Point {
    Point::new(a.x + b.x, a.y + b.y)
}

fn append(a: &mut Point, b: Point) -> &mut Point {
    a.x += b.x;
    a.y += b.y;
    a
}

fn testf(vm: &mut Vm, args: ArgsView<'_>) -> Result<Val> {
    let text = if let Some(n) = args.try_cast::<i64>(vm, 0) {
        format!("Int: {}", n)
    } else if let Some(s) = args.try_cast::<String>(vm, 0) {
        format!("String: {}", s)
    } else if let Some(p) = args.try_cast::<Point>(vm, 0) {
        p.to_string()
    } else {
        "Something else".to_string()
    };
    Ok(Val::from(text))
}

/// Register `Point` in `builtins` and the `nonempty`/`testf` helpers in
/// `__main__`. Expects [`crate::register_builtins`] to have run for `print`.
pub fn register_demo(vm: &mut Vm, console: Rc<Console>) -> Result<()> {
    let out = console.clone();
    let point = ClassBuilder::<Point>::new("Point")
        .constant("half", 0.5)?
        .constructor("__new__(cls, x: float = 0, y: float = 0)", Point::new)?
        .field("x", |p| &p.x, |p| &mut p.x)?
        .field("y", |p| &p.y, |p| &mut p.y)?
        .method("length(self) -> float", Point::length)?
        .method("__repr__(self) -> str", |p: &Point| p.to_string())?
        .method("__add__(self, other)", add)?
        .method("__iadd__(self, other)", append)?
        .method("append(self, other: Point)", append)?
        .method("print(self, s: str)", move |p: &Point, s: String| {
            out.write(&format!("{} {}\n", s, p));
        })?;
    vm.register_class("builtins", point)?;

    vm.bind_module("__main__")
        .function("nonempty(p: Point = None) -> bool", move |p: Option<Obj<Point>>| -> VmResult<bool> {
            let Some(p) = p else {
                console.write("Passed None\n");
                return Ok(false);
            };
            let p = p.borrow()?;
            console.write(&format!("Passed {}\n", p));
            Ok(p.length() > 0.0)
        })?
        .function_raw("testf(o=None) -> str", testf)?;
    debug!(target: "tether::stdlib", "demo bindings registered");
    Ok(())
}

pub const DEMO_SCRIPT: &str = "\
# Point lives in builtins; nonempty and testf in __main__.
a = Point(1, 2)
b = Point(2, 3)
print('a + b =', a + b)
c = a
a += b
print('a += b ->', a, 'same object:', a is c)
p = Point(1, 1)
p.append(p)
print('p.append(p) ->', p)
p.print('p is')
print('half =', Point.half, 'length =', Point(3, 4).length())
print(nonempty(Point(0, 0)), nonempty(a), nonempty())
print(testf(7), testf('seven'), testf(a), testf(7.5), sep=' | ')
try:
    a.append(1)
except ArgumentTypeError as err:
    print('ArgumentTypeError:', err)
try:
    Point('x')
except TypeError as err:
    print('TypeError:', err)
print('done')
";
