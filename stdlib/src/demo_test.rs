#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tether_core::{ErrorKind, Val, Vm};

    use crate::demo::{DEMO_SCRIPT, Point, register_demo};
    use crate::{Console, register_builtins};

    fn demo_vm() -> Result<(Vm, std::rc::Rc<Console>)> {
        let console = Console::scripted("");
        let mut vm = Vm::new();
        register_builtins(&mut vm, console.clone())?;
        register_demo(&mut vm, console.clone())?;
        Ok((vm, console))
    }

    #[test]
    fn test_demo_script_output() -> Result<()> {
        let (mut vm, console) = demo_vm()?;
        vm.exec(DEMO_SCRIPT, "<demo>")?;
        let expected = "\
a + b = Point(3, 5)
a += b -> Point(3, 5) same object: True
p.append(p) -> Point(2, 2)
p is Point(2, 2)
half = 0.5 length = 5.0
Passed Point(0, 0)
Passed Point(3, 5)
Passed None
False True False
Int: 7 | String: seven | Point(3, 5) | Something else
ArgumentTypeError: Point.append() argument 'other' must be Point, not int
TypeError: Point.__new__() argument 'x' must be float, not str
done
";
        assert_eq!(console.output(), expected);
        Ok(())
    }

    #[test]
    fn test_testf_match_order() -> Result<()> {
        let (mut vm, _console) = demo_vm()?;
        assert_eq!(vm.eval("testf(True)")?, Val::str("Int: 1"));
        assert_eq!(vm.eval("testf('7')")?, Val::str("String: 7"));
        assert_eq!(vm.eval("testf(Point(0.5, 2))")?, Val::str("Point(0.5, 2)"));
        assert_eq!(vm.eval("testf([1])")?, Val::str("Something else"));
        assert_eq!(vm.eval("testf()")?, Val::str("Something else"));
        Ok(())
    }

    #[test]
    fn test_nonempty_rejects_other_types() -> Result<()> {
        let (mut vm, console) = demo_vm()?;
        let err = vm.eval("nonempty(3)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArgumentTypeError);
        assert_eq!(console.output(), "");
        Ok(())
    }

    #[test]
    fn test_point_fields_are_floats() -> Result<()> {
        let (mut vm, _console) = demo_vm()?;
        vm.exec("p = Point(y=4)\np.x = 3\n", "<test>")?;
        assert_eq!(vm.eval("p.x")?, Val::Float(3.0));
        assert_eq!(vm.eval("p.length()")?, Val::Float(5.0));
        let value = vm.get_global("p").and_then(|p| tether_core::cast_arg::<Point>(&vm, &p));
        assert_eq!(value, Some(Point::new(3.0, 4.0)));
        Ok(())
    }
}
