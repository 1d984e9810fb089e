#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::bind::{BindError, ClassBuilder, MemberKind, NativeClass};
    use crate::runtime::Vm;
    use crate::testing::{Point, point_class, point_vm};
    use crate::value::Val;

    #[derive(Debug, Clone, Default)]
    struct Vector3 {
        x: f64,
    }

    impl NativeClass for Vector3 {}

    #[test]
    fn test_register_publishes_class_in_module() -> Result<()> {
        let vm = point_vm()?;
        let id = vm.registry().lookup("builtins", "Point").expect("registered");
        assert_eq!(vm.builtins_module().get("Point"), Some(Val::Class(id)));
        assert_eq!(vm.registry().id_of::<Point>(), Some(id));
        let desc = vm.registry().get(id).expect("descriptor");
        assert_eq!(desc.module(), "builtins");
        assert!(desc.constructor().is_some());
        Ok(())
    }

    #[test]
    fn test_duplicate_class_name_is_rejected() -> Result<()> {
        let mut vm = point_vm()?;
        let again = ClassBuilder::<Vector3>::new("Point");
        let err = vm.register_class("builtins", again).unwrap_err();
        assert_eq!(
            err,
            BindError::DuplicateClass {
                module: "builtins".into(),
                name: "Point".into()
            }
        );
        Ok(())
    }

    #[test]
    fn test_same_type_cannot_back_two_classes() -> Result<()> {
        let mut vm = point_vm()?;
        let err = vm.register_class("geometry", point_class()?).unwrap_err();
        assert!(matches!(err, BindError::DuplicateType { .. }));
        Ok(())
    }

    #[test]
    fn test_distinct_names_get_distinct_ids() -> Result<()> {
        let mut vm = Vm::new();
        let a = vm.register_class("builtins", ClassBuilder::<Point>::new("Point"))?;
        let b = vm.register_class("builtins", ClassBuilder::<Vector3>::new("Vector3"))?;
        assert_ne!(a, b);
        assert_eq!(vm.registry().len(), 2);
        Ok(())
    }

    #[test]
    fn test_same_name_in_different_modules() -> Result<()> {
        let mut vm = Vm::new();
        vm.register_class("builtins", ClassBuilder::<Point>::new("Shape"))?;
        vm.register_class("geometry", ClassBuilder::<Vector3>::new("Shape"))?;
        assert!(vm.module("geometry").is_some());
        Ok(())
    }

    #[test]
    fn test_duplicate_member_is_rejected() {
        let err = ClassBuilder::<Vector3>::new("Vector3")
            .field("x", |v| &v.x, |v| &mut v.x)
            .and_then(|b| b.readonly("x", |v| &v.x))
            .err();
        assert!(matches!(err, Some(BindError::DuplicateMember { .. })));
    }

    #[test]
    fn test_arity_mismatch_is_rejected() {
        let err = ClassBuilder::<Vector3>::new("Vector3")
            .method("scale(self, k, extra)", |v: &Vector3, k: f64| v.x * k)
            .err();
        assert_eq!(
            err,
            Some(BindError::ArityMismatch {
                signature: "scale(self, k, extra)".into(),
                declared: 2,
                native: 1
            })
        );
    }

    #[test]
    fn test_receiver_must_be_declared() {
        let err = ClassBuilder::<Vector3>::new("Vector3")
            .method("norm()", |v: &Vector3| v.x.abs())
            .err();
        assert!(matches!(err, Some(BindError::MissingReceiver { expected: "self", .. })));

        let err = ClassBuilder::<Vector3>::new("Vector3")
            .constructor("__new__(x)", |x: f64| Vector3 { x })
            .err();
        assert!(matches!(err, Some(BindError::MissingReceiver { expected: "cls", .. })));
    }

    #[test]
    fn test_reserved_operator_shapes() {
        let err = ClassBuilder::<Vector3>::new("Vector3")
            .method("__add__(self, a, b)", |v: &Vector3, a: f64, b: f64| v.x + a + b)
            .err();
        assert!(matches!(err, Some(BindError::BadOperator { .. })));

        let err = ClassBuilder::<Vector3>::new("Vector3")
            .method_raw("__len__(self, extra)", |_vm, _this, _args| Ok(Val::Int(0)))
            .err();
        assert!(matches!(err, Some(BindError::BadOperator { .. })));
    }

    #[test]
    fn test_member_kinds_and_describe() -> Result<()> {
        let vm = point_vm()?;
        let info = vm.registry().describe();
        assert_eq!(info.len(), 1);
        let point = &info[0];
        assert_eq!(point.name, "Point");
        assert!(point.rust_type.ends_with("Point"));

        let kind_of = |name: &str| point.members.iter().find(|m| m.name == name).map(|m| m.kind);
        assert_eq!(kind_of("__new__"), Some(MemberKind::Constructor));
        assert_eq!(kind_of("x"), Some(MemberKind::Field));
        assert_eq!(kind_of("append"), Some(MemberKind::Method));
        assert_eq!(kind_of("__add__"), Some(MemberKind::Operator));
        assert_eq!(kind_of("half"), Some(MemberKind::Constant));

        let describe = point.members.iter().find(|m| m.name == "describe").expect("describe");
        assert_eq!(describe.signature.as_deref(), Some("describe(self, prefix, sep=' ') -> str"));
        Ok(())
    }

    #[test]
    fn test_module_binder_rejects_duplicates() -> Result<()> {
        let mut vm = Vm::new();
        let err = vm
            .bind_module("__main__")
            .function("twice(x: int) -> int", |x: i64| x * 2)?
            .value("twice", 2i64)
            .err();
        assert!(matches!(err, Some(BindError::DuplicateMember { .. })));
        Ok(())
    }

    #[test]
    fn test_class_cannot_shadow_module_attribute() -> Result<()> {
        let mut vm = Vm::new();
        vm.bind_module("builtins").function("print(x)", |x: i64| x)?;
        let err = vm.register_class("builtins", ClassBuilder::<Vector3>::new("print")).unwrap_err();
        assert_eq!(
            err,
            BindError::DuplicateMember {
                owner: "builtins".into(),
                name: "print".into()
            }
        );
        assert!(matches!(vm.builtins_module().get("print"), Some(Val::Function(_))));
        assert_eq!(vm.registry().id_of::<Vector3>(), None);

        vm.register_class("__main__", ClassBuilder::<Vector3>::new("print"))?;
        Ok(())
    }
}
