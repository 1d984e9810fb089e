#[cfg(test)]
mod tests {
    use crate::runtime::Vm;
    use crate::value::{ModuleObj, Val};

    #[test]
    fn test_numeric_equality_crosses_int_and_float() {
        assert_eq!(Val::Int(2), Val::Float(2.0));
        assert_ne!(Val::Int(2), Val::Float(2.5));
        assert_ne!(Val::Int(1), Val::str("1"));
    }

    #[test]
    fn test_is_same_uses_identity_for_heap_values() {
        let a = Val::list(vec![Val::Int(1)]);
        let b = Val::list(vec![Val::Int(1)]);
        assert_eq!(a, b);
        assert!(!a.is_same(&b));
        assert!(a.is_same(&a.clone()));
        assert!(Val::None.is_same(&Val::None));
        assert!(Val::Int(7).is_same(&Val::Int(7)));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Val::None.kind_name(), "NoneType");
        assert_eq!(Val::Bool(true).kind_name(), "bool");
        assert_eq!(Val::tuple(vec![]).kind_name(), "tuple");
        assert_eq!(Val::from("s").kind_name(), "str");
    }

    #[test]
    fn test_debug_formatting() {
        let v = Val::list(vec![Val::Int(1), Val::Bool(false), Val::None, Val::str("a")]);
        assert_eq!(format!("{:?}", v), r#"[1, False, None, "a"]"#);
    }

    #[test]
    fn test_module_attributes() {
        let module = ModuleObj::new("demo");
        module.set("b", Val::Int(2));
        module.set("a", Val::Int(1));
        assert!(module.contains("a"));
        assert_eq!(module.get("b"), Some(Val::Int(2)));
        assert_eq!(module.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(module.remove("a"), Some(Val::Int(1)));
        assert!(!module.contains("a"));
    }

    #[test]
    fn test_debug_formatting_of_native_function() -> anyhow::Result<()> {
        let mut vm = Vm::new();
        vm.bind_module("__main__").function("twice(x: int) -> int", |x: i64| x * 2)?;
        let twice = vm.get_global("twice").expect("bound");
        assert_eq!(format!("{:?}", twice), "<native function twice>");
        Ok(())
    }
}
