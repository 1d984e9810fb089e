//! Native types shared by the unit tests.

use std::cell::Cell;
use std::rc::Rc;

use crate::bind::{BindError, ClassBuilder, NativeClass};
use crate::runtime::Vm;

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl NativeClass for Point {}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

fn append(p: &mut Point, other: Point) {
    p.x += other.x;
    p.y += other.y;
}

fn add(a: &Point, b: Point) -> Point {
    Point::new(a.x + b.x, a.y + b.y)
}

fn iadd(a: &mut Point, b: Point) -> &mut Point {
    a.x += b.x;
    a.y += b.y;
    a
}

fn sub(a: &Point, b: Point) -> Point {
    Point::new(a.x - b.x, a.y - b.y)
}

fn eq(a: &Point, b: Point) -> bool {
    *a == b
}

fn repr(p: &Point) -> String {
    format!("Point({}, {})", p.x, p.y)
}

fn describe(p: &Point, prefix: String, sep: String) -> String {
    format!("{}{}{}{}", prefix, p.x, sep, p.y)
}

pub fn point_class() -> Result<ClassBuilder<Point>, BindError> {
    ClassBuilder::<Point>::new("Point")
        .constructor("__new__(cls, x: int = 0, y: int = 0)", |x: i64, y: i64| Point::new(x, y))?
        .field("x", |p| &p.x, |p| &mut p.x)?
        .field("y", |p| &p.y, |p| &mut p.y)?
        .method("append(self, other: Point)", append)?
        .method("__add__(self, other)", add)?
        .method("__iadd__(self, other)", iadd)?
        .method("__sub__(self, other)", sub)?
        .method("__eq__(self, other)", eq)?
        .method("__repr__(self) -> str", repr)?
        .method("describe(self, prefix, sep=' ') -> str", describe)?
        .constant("half", 0.5)
}

/// A VM with `Point` registered in `builtins`.
pub fn point_vm() -> anyhow::Result<Vm> {
    let mut vm = Vm::new();
    vm.register_class("builtins", point_class()?)?;
    Ok(vm)
}

/// Counts how many times values of this type were dropped.
#[derive(Debug)]
pub struct Tracked {
    pub drops: Rc<Cell<usize>>,
}

impl NativeClass for Tracked {}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}
