#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use anyhow::{Result, anyhow};

    use crate::bind::{ArgsView, ClassBuilder, NativeClass, Obj};
    use crate::runtime::{ErrorKind, Vm, VmOptions};
    use crate::testing::{Point, Tracked, point_vm};
    use crate::value::Val;

    fn point(vm: &mut Vm, x: i64, y: i64) -> Result<Val> {
        let class = vm.get_global("Point").ok_or_else(|| anyhow!("Point is not bound"))?;
        Ok(vm.call(&class, vec![Val::Int(x), Val::Int(y)])?)
    }

    fn coords(vm: &Vm, val: &Val) -> Result<(i64, i64)> {
        let handle = Obj::<Point>::from_val_checked(vm, val).ok_or_else(|| anyhow!("not a Point"))?;
        let p = handle.borrow()?;
        Ok((p.x, p.y))
    }

    #[test]
    fn test_constructor_round_trip() -> Result<()> {
        let mut vm = point_vm()?;
        let p = point(&mut vm, 3, 4)?;
        assert_eq!(vm.get_attr(&p, "x")?, Val::Int(3));
        assert_eq!(vm.get_attr(&p, "y")?, Val::Int(4));

        let class = vm.get_global("Point").expect("Point");
        let origin = vm.call(&class, vec![])?;
        assert_eq!(coords(&vm, &origin)?, (0, 0));

        let by_name = vm.call_with_kwargs(&class, vec![], vec![(Rc::from("y"), Val::Int(9))])?;
        assert_eq!(coords(&vm, &by_name)?, (0, 9));
        Ok(())
    }

    #[test]
    fn test_default_argument_matches_explicit_argument() -> Result<()> {
        let mut vm = point_vm()?;
        let p = point(&mut vm, 1, 2)?;
        let describe = vm.get_attr(&p, "describe")?;
        let omitted = vm.call(&describe, vec![Val::str("p=")])?;
        let supplied = vm.call(&describe, vec![Val::str("p="), Val::str(" ")])?;
        assert_eq!(omitted, supplied);
        assert_eq!(omitted, Val::str("p=1 2"));
        Ok(())
    }

    #[test]
    fn test_self_aliasing_append() -> Result<()> {
        let mut vm = point_vm()?;
        let p = point(&mut vm, 1, 1)?;
        let append = vm.get_attr(&p, "append")?;
        vm.call(&append, vec![p.clone()])?;
        assert_eq!(coords(&vm, &p)?, (2, 2));
        Ok(())
    }

    #[test]
    fn test_binding_errors_are_type_errors() -> Result<()> {
        let mut vm = point_vm()?;
        let class = vm.get_global("Point").expect("Point");

        let too_many = vm.call(&class, vec![Val::Int(1), Val::Int(2), Val::Int(3)]).unwrap_err();
        assert_eq!(too_many.kind, ErrorKind::TypeError);
        assert!(too_many.message.contains("takes 2 positional arguments but 3 were given"));

        let unknown = vm
            .call_with_kwargs(&class, vec![], vec![(Rc::from("z"), Val::Int(1))])
            .unwrap_err();
        assert!(unknown.message.contains("unexpected keyword argument 'z'"));

        let twice = vm
            .call_with_kwargs(&class, vec![Val::Int(1)], vec![(Rc::from("x"), Val::Int(1))])
            .unwrap_err();
        assert!(twice.message.contains("multiple values for argument 'x'"));

        let p = point(&mut vm, 0, 0)?;
        let append = vm.get_attr(&p, "append")?;
        let missing = vm.call(&append, vec![]).unwrap_err();
        assert_eq!(missing.kind, ErrorKind::TypeError);
        assert!(missing.message.contains("missing required argument 'other'"));
        Ok(())
    }

    #[test]
    fn test_failed_cast_is_argument_type_error() -> Result<()> {
        let mut vm = point_vm()?;
        let class = vm.get_global("Point").expect("Point");
        let err = vm.call(&class, vec![Val::str("one")]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArgumentTypeError);
        assert_eq!(err.message, "Point.__new__() argument 'x' must be int, not str");
        assert!(err.kind.matches("TypeError"));
        assert!(err.kind.matches("Exception"));

        let p = point(&mut vm, 0, 0)?;
        let append = vm.get_attr(&p, "append")?;
        let err = vm.call(&append, vec![Val::Float(1.5)]).unwrap_err();
        assert_eq!(err.message, "Point.append() argument 'other' must be Point, not float");
        Ok(())
    }

    #[test]
    fn test_field_assignment_marshals_value() -> Result<()> {
        let mut vm = point_vm()?;
        let p = point(&mut vm, 0, 0)?;
        vm.set_attr(&p, "x", Val::Bool(true))?;
        assert_eq!(coords(&vm, &p)?, (1, 0));
        let err = vm.set_attr(&p, "y", Val::str("no")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArgumentTypeError);
        Ok(())
    }

    #[test]
    fn test_unbound_method_takes_receiver_first() -> Result<()> {
        let mut vm = point_vm()?;
        let a = point(&mut vm, 1, 2)?;
        let b = point(&mut vm, 2, 3)?;
        let class = vm.get_global("Point").expect("Point");
        let add = vm.get_attr(&class, "__add__")?;
        let sum = vm.call(&add, vec![a, b])?;
        assert_eq!(coords(&vm, &sum)?, (3, 5));
        Ok(())
    }

    fn testf(vm: &mut Vm, args: ArgsView<'_>) -> Result<Val> {
        if let Some(n) = args.try_cast::<f64>(vm, 0) {
            return Ok(Val::from(format!("number {}", n)));
        }
        if let Some(s) = args.try_cast::<String>(vm, 0) {
            return Ok(Val::from(format!("text {}", s)));
        }
        if let Some(p) = args.try_cast::<Obj<Point>>(vm, 0) {
            let p = p.borrow()?;
            return Ok(Val::from(format!("point {} {}", p.x, p.y)));
        }
        Ok(Val::str("unknown"))
    }

    #[test]
    fn test_raw_function_tries_types_in_order() -> Result<()> {
        let mut vm = point_vm()?;
        vm.bind_module("__main__").function_raw("testf(o=None)", testf)?;
        let f = vm.get_global("testf").expect("testf");

        assert_eq!(vm.call(&f, vec![Val::str("abc")])?, Val::str("text abc"));
        assert_eq!(vm.call(&f, vec![Val::Int(2)])?, Val::str("number 2"));
        let p = point(&mut vm, 5, 6)?;
        assert_eq!(vm.call(&f, vec![p])?, Val::str("point 5 6"));
        assert_eq!(vm.call(&f, vec![])?, Val::str("unknown"));
        Ok(())
    }

    #[test]
    fn test_raw_errors_keep_their_kind() -> Result<()> {
        let mut vm = Vm::new();
        vm.bind_module("__main__")
            .function_raw("fails()", |_vm, _args| Err(anyhow!("disk on fire")))?
            .function_raw("strict(x)", |vm, args| Ok(Val::Int(args.cast::<i64>(vm, 0)?)))?;

        let fails = vm.get_global("fails").expect("fails");
        let err = vm.call(&fails, vec![]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RuntimeError);
        assert!(err.message.contains("disk on fire"));

        let strict = vm.get_global("strict").expect("strict");
        let err = vm.call(&strict, vec![Val::None]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArgumentTypeError);
        Ok(())
    }

    #[test]
    fn test_rest_arguments_are_collected() -> Result<()> {
        let mut vm = Vm::new();
        // The collected tuple occupies the slot after the named parameters.
        vm.bind_module("__main__").function("total(*xs, scale=1)", |scale: i64, xs: Vec<i64>| {
            xs.iter().sum::<i64>() * scale
        })?;
        let total = vm.get_global("total").expect("total");
        let args = vec![Val::Int(1), Val::Int(2), Val::Int(3)];
        assert_eq!(vm.call(&total, args.clone())?, Val::Int(6));
        let scaled = vm.call_with_kwargs(&total, args, vec![(Rc::from("scale"), Val::Int(2))])?;
        assert_eq!(scaled, Val::Int(12));
        Ok(())
    }

    #[test]
    fn test_call_depth_is_bounded() -> Result<()> {
        let mut vm = Vm::with_options(VmOptions { max_call_depth: 8 });
        vm.bind_module("__main__").function_raw("dive(n)", |vm, args| {
            let n = args.cast::<i64>(vm, 0)?;
            let dive = vm.get_global("dive").ok_or_else(|| anyhow!("dive is gone"))?;
            Ok(vm.call(&dive, vec![Val::Int(n + 1)])?)
        })?;
        let dive = vm.get_global("dive").expect("dive");
        let err = vm.call(&dive, vec![Val::Int(0)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RecursionError);
        assert_eq!(vm.call_depth(), 0);
        Ok(())
    }

    #[derive(Debug, Default)]
    struct Counter {
        hits: i64,
    }

    impl NativeClass for Counter {}

    #[test]
    fn test_reentrant_mutable_borrow_is_reported() -> Result<()> {
        let mut vm = Vm::new();
        let counter = ClassBuilder::<Counter>::new("Counter")
            .constructor("__new__(cls)", Counter::default)?
            .readonly("hits", |c| &c.hits)?
            .method("bump(self)", |c: &mut Counter| c.hits += 1)?
            .method_raw("reenter(self)", |vm, this, _args| {
                let inst = this.as_instance().ok_or_else(|| anyhow!("not an instance"))?.clone();
                let _guard = inst.borrow_mut_as::<Counter>()?;
                let bump = vm.get_attr(this, "bump")?;
                vm.call(&bump, vec![])?;
                Ok(Val::None)
            })?;
        vm.register_class("__main__", counter)?;

        let class = vm.get_global("Counter").expect("Counter");
        let c = vm.call(&class, vec![])?;
        let reenter = vm.get_attr(&c, "reenter")?;
        let err = vm.call(&reenter, vec![]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RuntimeError);
        assert!(err.message.contains("already borrowed"));

        let bump = vm.get_attr(&c, "bump")?;
        vm.call(&bump, vec![])?;
        assert_eq!(vm.get_attr(&c, "hits")?, Val::Int(1));
        Ok(())
    }

    #[test]
    fn test_destructor_runs_exactly_once() -> Result<()> {
        let drops = Rc::new(Cell::new(0));
        let mut vm = Vm::new();
        let shared = drops.clone();
        let tracked = ClassBuilder::<Tracked>::new("Tracked").constructor("__new__(cls)", move || Tracked {
            drops: shared.clone(),
        })?;
        vm.register_class("__main__", tracked)?;

        let class = vm.get_global("Tracked").expect("Tracked");
        let obj = vm.call(&class, vec![])?;
        vm.set_global("t", obj.clone());
        vm.push(obj.clone());
        drop(obj);
        assert_eq!(drops.get(), 0);

        vm.pop()?;
        assert_eq!(drops.get(), 0);
        vm.main_module().remove("t");
        assert_eq!(drops.get(), 1);

        drop(vm);
        assert_eq!(drops.get(), 1);
        Ok(())
    }
}
