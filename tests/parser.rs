#[cfg(test)]
mod parser_tests {
    use rox::ast::{Expr, ExprId, LiteralValue, Stmt};
    use rox::ast_printer::AstPrinter;
    use rox::error::LoxError;
    use rox::parser::Parser;
    use rox::scanner::scan_tokens;
    use rox::token::TokenType;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<LoxError>) {
        let (tokens, scan_errors) = scan_tokens(source);
        assert!(scan_errors.is_empty(), "unexpected scan errors: {:?}", scan_errors);

        let mut parser = Parser::new(tokens);
        let statements = parser.parse().into_iter().flatten().collect();

        (statements, parser.take_errors())
    }

    fn parse_ok(source: &str) -> Vec<Stmt> {
        let (statements, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
        statements
    }

    fn messages(errors: &[LoxError]) -> Vec<String> {
        errors.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_precedence_and_grouping() {
        let statements = parse_ok("print -123 * (45.67);");

        assert_eq!(statements.len(), 1);
        assert_eq!(
            AstPrinter::print_stmt(&statements[0]),
            "(print (* (- 123.0) (group 45.67)))"
        );
    }

    #[test]
    fn test_print_expression() {
        let statements = parse_ok("!(a == nil) or super.x;");

        let Stmt::Expression(expr) = &statements[0] else {
            panic!("expected expression statement, got {:?}", statements[0]);
        };

        assert_eq!(AstPrinter::print(expr), "(or (! (group (== a nil))) (super x))");
    }

    #[test]
    fn test_binary_is_left_associative() {
        let statements = parse_ok("1 - 2 - 3;");

        assert_eq!(
            AstPrinter::print_stmt(&statements[0]),
            "(; (- (- 1.0 2.0) 3.0))"
        );
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let statements = parse_ok("a = b = 1;");

        match &statements[0] {
            Stmt::Expression(Expr::Assign { name, value, .. }) => {
                assert_eq!(name.lexeme, "a");
                assert!(matches!(value.as_ref(), Expr::Assign { name, .. } if name.lexeme == "b"));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_logical_precedence() {
        let statements = parse_ok("print a or b and c;");

        assert_eq!(
            AstPrinter::print_stmt(&statements[0]),
            "(print (or a (and b c)))"
        );
    }

    #[test]
    fn test_for_loop_desugars_to_while() {
        let statements = parse_ok("for (var i = 0; i < 3; i = i + 1) print i;");

        assert_eq!(statements.len(), 1);

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected block, got {:?}", statements[0]);
        };
        assert_eq!(outer.len(), 2);
        assert!(matches!(&outer[0], Stmt::Var { name, .. } if name.lexeme == "i"));

        let Stmt::While { condition, body } = &outer[1] else {
            panic!("expected while, got {:?}", outer[1]);
        };
        assert!(matches!(condition, Expr::Binary { operator, .. } if operator.token_type == TokenType::LESS));

        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected block body, got {:?}", body);
        };
        assert!(matches!(&inner[0], Stmt::Print(_)));
        assert!(matches!(&inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn test_empty_for_clauses() {
        let statements = parse_ok("for (;;) print 1;");

        match &statements[0] {
            Stmt::While { condition, body } => {
                assert_eq!(*condition, Expr::Literal(LiteralValue::True));
                assert!(matches!(body.as_ref(), Stmt::Print(_)));
            }
            other => panic!("expected bare while, got {:?}", other),
        }
    }

    #[test]
    fn test_class_with_superclass() {
        let statements = parse_ok("class B < A { init(x) { this.x = x; } get() { return super.get(); } }");

        match &statements[0] {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                assert_eq!(name.lexeme, "B");
                assert!(matches!(superclass, Some(Expr::Variable { name, .. }) if name.lexeme == "A"));
                assert_eq!(methods.len(), 2);
                assert_eq!(methods[0].name.lexeme, "init");
                assert_eq!(methods[0].params.len(), 1);
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_property_set_and_call_chain() {
        let statements = parse_ok("a.b(1)(2).c = 3;");

        assert_eq!(
            AstPrinter::print_stmt(&statements[0]),
            "(; (= (call (call (. a b) 1.0) 2.0) c 3.0))"
        );
    }

    #[test]
    fn test_invalid_assignment_target() {
        let (_, errors) = parse("1 = 2;");

        assert_eq!(
            messages(&errors),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
    }

    #[test]
    fn test_missing_semicolon_at_end() {
        let (_, errors) = parse("print 1");

        assert_eq!(
            messages(&errors),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
    }

    #[test]
    fn test_synchronize_reports_independent_errors() {
        let source = "var = 1;\nprint 2;\nvar x = ;\nprint 3;";
        let (statements, errors) = parse(source);

        assert_eq!(
            messages(&errors),
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 3] Error at ';': Expect expression.",
            ]
        );

        // The two good print statements survive.
        assert_eq!(statements.len(), 2);
        assert!(statements.iter().all(|s| matches!(s, Stmt::Print(_))));
    }

    #[test]
    fn test_too_many_arguments() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        let (_, errors) = parse(&source);

        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .ends_with("Cannot have more than 255 arguments."));
    }

    #[test]
    fn test_max_arguments_accepted() {
        let args: Vec<String> = (0..255).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        let statements = parse_ok(&source);

        match &statements[0] {
            Stmt::Expression(Expr::Call { arguments, .. }) => assert_eq!(arguments.len(), 255),
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_ids_are_unique_and_continue_across_parsers() {
        let (tokens, _) = scan_tokens("a = b; this;");
        let mut first = Parser::new(tokens).with_first_id(10);
        let statements: Vec<Stmt> = first.parse().into_iter().flatten().collect();

        let Stmt::Expression(Expr::Assign { id, value, .. }) = &statements[0] else {
            panic!("expected assignment");
        };
        let Expr::Variable { id: inner, .. } = value.as_ref() else {
            panic!("expected variable");
        };

        assert!(id.0 >= 10 && inner.0 >= 10);
        assert_ne!(id, inner);

        let next = first.next_free_id();
        assert_eq!(next, 14);

        let (tokens, _) = scan_tokens("c;");
        let mut second = Parser::new(tokens).with_first_id(next);
        let statements: Vec<Stmt> = second.parse().into_iter().flatten().collect();

        assert!(matches!(
            &statements[0],
            Stmt::Expression(Expr::Variable { id, .. }) if *id == ExprId(14)
        ));
    }

    #[test]
    fn test_parse_program_wraps_errors() {
        let (tokens, _) = scan_tokens("print ;\nprint (1;");
        let mut parser = Parser::new(tokens);

        match parser.parse_program() {
            Err(LoxError::Compile(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected compile error, got {:?}", other),
        }
    }
}
