#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use anyhow::Result;

    use crate::bind::{FromVal, IntoVal, Obj, cast_arg};
    use crate::runtime::{ErrorKind, Vm};
    use crate::testing::{Point, point_vm};
    use crate::value::Val;

    #[test]
    fn test_integer_targets() {
        let vm = Vm::new();
        assert_eq!(cast_arg::<i64>(&vm, &Val::Int(-4)), Some(-4));
        assert_eq!(cast_arg::<i32>(&vm, &Val::Bool(true)), Some(1));
        assert_eq!(cast_arg::<u8>(&vm, &Val::Int(300)), None);
        assert_eq!(cast_arg::<u32>(&vm, &Val::Int(-1)), None);
        assert_eq!(cast_arg::<i64>(&vm, &Val::Float(1.0)), None);
        assert_eq!(cast_arg::<i64>(&vm, &Val::str("1")), None);
    }

    #[test]
    fn test_float_targets_accept_ints() {
        let vm = Vm::new();
        assert_eq!(cast_arg::<f64>(&vm, &Val::Int(3)), Some(3.0));
        assert_eq!(cast_arg::<f32>(&vm, &Val::Float(0.5)), Some(0.5));
        assert_eq!(cast_arg::<f64>(&vm, &Val::None), None);
    }

    #[test]
    fn test_text_and_bool_targets() {
        let vm = Vm::new();
        assert_eq!(cast_arg::<String>(&vm, &Val::str("hi")), Some("hi".to_string()));
        assert_eq!(cast_arg::<Rc<str>>(&vm, &Val::str("hi")).as_deref(), Some("hi"));
        assert_eq!(cast_arg::<String>(&vm, &Val::Int(1)), None);
        assert_eq!(cast_arg::<bool>(&vm, &Val::Bool(false)), Some(false));
        assert_eq!(cast_arg::<bool>(&vm, &Val::Int(0)), None);
    }

    #[test]
    fn test_option_and_containers() {
        let vm = Vm::new();
        assert_eq!(cast_arg::<Option<i64>>(&vm, &Val::None), Some(None));
        assert_eq!(cast_arg::<Option<i64>>(&vm, &Val::Int(2)), Some(Some(2)));
        assert_eq!(cast_arg::<Option<i64>>(&vm, &Val::str("x")), None);

        let list = Val::list(vec![Val::Int(1), Val::Int(2)]);
        assert_eq!(cast_arg::<Vec<i64>>(&vm, &list), Some(vec![1, 2]));
        let tuple = Val::tuple(vec![Val::Int(1), Val::str("2")]);
        assert_eq!(cast_arg::<Vec<i64>>(&vm, &tuple), None);
        assert_eq!(cast_arg::<Val>(&vm, &tuple), Some(tuple.clone()));
    }

    #[test]
    fn test_expected_names() {
        assert_eq!(i64::expected(), "int");
        assert_eq!(Option::<String>::expected(), "str or None");
        assert_eq!(Vec::<f64>::expected(), "list[float]");
        assert_eq!(Point::expected(), "Point");
    }

    #[test]
    fn test_native_class_by_value_is_a_snapshot() -> Result<()> {
        let vm = point_vm()?;
        let val = Point::new(1, 2).into_val(&vm)?;
        let mut copy = cast_arg::<Point>(&vm, &val).expect("a Point");
        copy.x = 10;

        let handle = Obj::<Point>::from_val_checked(&vm, &val).expect("a Point");
        assert_eq!(handle.borrow()?.x, 1);
        handle.borrow_mut()?.y = 20;
        assert_eq!(copy, Point::new(10, 2));
        assert!(handle.to_val().is_same(&val));
        Ok(())
    }

    #[test]
    fn test_native_class_requires_exact_class() -> Result<()> {
        let vm = point_vm()?;
        assert!(cast_arg::<Point>(&vm, &Val::Int(1)).is_none());
        assert!(cast_arg::<Obj<Point>>(&vm, &Val::tuple(vec![Val::Int(1), Val::Int(2)])).is_none());
        Ok(())
    }

    #[test]
    fn test_unregistered_native_type_cannot_be_boxed() {
        let vm = Vm::new();
        let err = Point::new(0, 0).into_val(&vm).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert!(err.message.contains("not registered"));
    }

    #[test]
    fn test_boxing_primitives() -> Result<()> {
        let vm = Vm::new();
        assert_eq!(().into_val(&vm)?, Val::None);
        assert_eq!(Some(3u8).into_val(&vm)?, Val::Int(3));
        assert_eq!(None::<i64>.into_val(&vm)?, Val::None);
        assert_eq!(vec![1i64, 2].into_val(&vm)?, Val::list(vec![Val::Int(1), Val::Int(2)]));
        assert_eq!("s".into_val(&vm)?, Val::str("s"));
        assert_eq!(u64::MAX.into_val(&vm).unwrap_err().kind, ErrorKind::ValueError);
        Ok(())
    }
}
