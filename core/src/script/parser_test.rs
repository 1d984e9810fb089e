#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::runtime::ErrorKind;
    use crate::script::ast::{BinOp, Expr, StmtKind, Target};
    use crate::script::parser::MAX_NESTING;
    use crate::script::{parse_expression, parse_program};
    use crate::value::Val;

    #[test]
    fn test_precedence() -> Result<()> {
        let expr = parse_expression("1 + 2 * 3 == 7")?;
        let Expr::Binary { op: BinOp::Eq, lhs, .. } = expr else {
            panic!("expected comparison");
        };
        let Expr::Binary { op: BinOp::Add, rhs, .. } = *lhs else {
            panic!("expected addition");
        };
        assert!(matches!(*rhs, Expr::Binary { op: BinOp::Mul, .. }));
        Ok(())
    }

    #[test]
    fn test_negative_literal_is_folded() -> Result<()> {
        assert!(matches!(parse_expression("-4")?, Expr::Lit(Val::Int(-4))));
        assert!(matches!(parse_expression("-x")?, Expr::Neg(_)));
        Ok(())
    }

    #[test]
    fn test_call_with_keywords() -> Result<()> {
        let expr = parse_expression("p.describe('a', sep=',')")?;
        let Expr::Call { func, args, kwargs } = expr else {
            panic!("expected a call");
        };
        assert!(matches!(*func, Expr::Attr(_, ref name) if &**name == "describe"));
        assert_eq!(args.len(), 1);
        assert_eq!(kwargs.len(), 1);
        assert_eq!(&*kwargs[0].0, "sep");
        Ok(())
    }

    #[test]
    fn test_is_not() -> Result<()> {
        assert!(matches!(parse_expression("a is not None")?, Expr::Binary { op: BinOp::IsNot, .. }));
        Ok(())
    }

    #[test]
    fn test_statements() -> Result<()> {
        let src = "\
p = Point(1, 2)
p.x = 3
p += q
pass
try:
    f()
except TypeError as err:
    pass
except:
    pass
";
        let program = parse_program(src)?;
        assert_eq!(program.len(), 5);
        assert!(matches!(&program[0].kind, StmtKind::Assign(Target::Name(_), _)));
        assert!(matches!(&program[1].kind, StmtKind::Assign(Target::Attr(..), _)));
        assert!(matches!(&program[2].kind, StmtKind::AugAssign(_, BinOp::Add, _)));
        assert!(matches!(&program[3].kind, StmtKind::Pass));
        let StmtKind::Try { body, handlers } = &program[4].kind else {
            panic!("expected try");
        };
        assert_eq!(body.len(), 1);
        assert_eq!(handlers.len(), 2);
        assert_eq!(handlers[0].kind.as_deref(), Some("TypeError"));
        assert_eq!(handlers[0].alias.as_deref(), Some("err"));
        assert!(handlers[1].kind.is_none());
        assert_eq!(program[4].line, 5);
        Ok(())
    }

    #[test]
    fn test_syntax_errors() {
        for src in ["f(a=1, 2)\n", "1 = x\n", "try:\n    pass\n", "(1, 2\n", "x = \n"] {
            let err = parse_program(src).expect_err(src);
            assert_eq!(err.kind, ErrorKind::SyntaxError, "{src}");
            assert!(err.line.is_some());
        }
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        let parens = format!("x = {}1{}\n", "(".repeat(200_000), ")".repeat(200_000));
        let negations = format!("x = {}y\n", "-".repeat(200_000));
        let chain = format!("x = 1{}\n", " + 1".repeat(200_000));
        let attrs = format!("x = p{}\n", ".x".repeat(200_000));
        for src in [&parens, &negations, &chain, &attrs] {
            let err = parse_program(src).unwrap_err();
            assert_eq!(err.kind, ErrorKind::SyntaxError);
            assert_eq!(err.message, "expression nested too deeply");
            assert_eq!(err.line, Some(1));
        }

        let mut blocks = String::new();
        for level in 0..(MAX_NESTING + 5) {
            blocks.push_str(&format!("{}try:\n", "    ".repeat(level)));
        }
        let err = parse_program(&blocks).unwrap_err();
        assert_eq!(err.message, "block nested too deeply");
    }

    #[test]
    fn test_moderate_nesting_still_parses() -> Result<()> {
        let src = format!("x = {}1{} + -(-2) * f(g(h(1)))\n", "(".repeat(50), ")".repeat(50));
        assert_eq!(parse_program(&src)?.len(), 1);
        Ok(())
    }
}
