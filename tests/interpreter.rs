#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use rox::error::{ErrorCategory, LoxError};
    use rox::Lox;

    /// In‑memory sink shared between the test and the interpreter.
    #[derive(Clone, Default)]
    struct Captured(Rc<RefCell<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    fn session() -> (Lox, Captured) {
        let out = Captured::default();
        (Lox::with_output(Box::new(out.clone())), out)
    }

    /// Run `source` in a fresh session; returns printed output and the outcome.
    fn run(source: &str) -> (String, Result<(), LoxError>) {
        let (mut lox, out) = session();
        let result = lox.run(source);
        (out.text(), result)
    }

    fn run_ok(source: &str) -> String {
        let (output, result) = run(source);
        assert!(result.is_ok(), "unexpected error: {:?}", result);
        output
    }

    fn runtime_error(source: &str) -> (String, String) {
        let (output, result) = run(source);
        match result {
            Err(e) => {
                assert_eq!(e.category(), ErrorCategory::Runtime, "{}", e);
                (output, e.to_string())
            }
            Ok(()) => panic!("expected a runtime error"),
        }
    }

    // ───────────────────────────── values ─────────────────────────────

    #[test]
    fn test_arithmetic_and_number_display() {
        assert_eq!(
            run_ok("print 1 + 2; print 7 / 2; print -0; print 2 * 3.5; print 10 - 0.25;"),
            "3\n3.5\n-0\n7\n9.75\n"
        );
    }

    #[test]
    fn test_division_by_zero_is_nan() {
        assert_eq!(run_ok("print 1 / 0; print 0 / 0;"), "nan\nnan\n");
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(run_ok("print \"foo\" + \"bar\";"), "foobar\n");
    }

    #[test]
    fn test_truthiness() {
        let source = "
            if (nil) print \"nil\"; else print \"nil is falsy\";
            if (0) print \"0 is truthy\";
            if (\"\") print \"empty string is truthy\";
            print !false;
        ";

        assert_eq!(
            run_ok(source),
            "nil is falsy\n0 is truthy\nempty string is truthy\ntrue\n"
        );
    }

    #[test]
    fn test_equality() {
        let source = "
            print nil == false;
            print nil == nil;
            print 1 == 1;
            print \"a\" == \"a\";
            print 1 == \"1\";
            print 1 != 2;
            fun f() {}
            print f == f;
        ";

        assert_eq!(
            run_ok(source),
            "false\ntrue\ntrue\ntrue\nfalse\ntrue\ntrue\n"
        );
    }

    #[test]
    fn test_logical_operators_return_operand() {
        assert_eq!(
            run_ok("print nil or \"default\"; print 1 and 2; print false and boom;"),
            "default\n2\nfalse\n"
        );
    }

    #[test]
    fn test_display_forms() {
        let source = "
            class Bagel {}
            fun f() {}
            print Bagel;
            print Bagel();
            print f;
            print clock;
            print nil;
        ";

        assert_eq!(
            run_ok(source),
            "Bagel\nBagel instance\n<fn f>\n<native fn>\nnil\n"
        );
    }

    #[test]
    fn test_clock_returns_a_number() {
        assert_eq!(run_ok("print clock() > 0;"), "true\n");
    }

    // ───────────────────────────── scoping ────────────────────────────

    #[test]
    fn test_block_shadowing() {
        let source = "
            var a = \"global a\";
            var b = \"global b\";
            {
              var a = \"outer a\";
              {
                var a = \"inner a\";
                print a;
                print b;
              }
              print a;
            }
            print a;
        ";

        assert_eq!(
            run_ok(source),
            "inner a\nglobal b\nouter a\nglobal a\n"
        );
    }

    #[test]
    fn test_static_scope_for_closures() {
        let source = "
            var a = \"global\";
            {
              fun showA() { print a; }
              showA();
              var a = \"block\";
              showA();
            }
        ";

        assert_eq!(run_ok(source), "global\nglobal\n");
    }

    #[test]
    fn test_for_loop_variable_is_scoped() {
        let source = "
            var i = \"outer\";
            for (var i = 0; i < 3; i = i + 1) print i;
            print i;
        ";

        assert_eq!(run_ok(source), "0\n1\n2\nouter\n");
    }

    #[test]
    fn test_while_loop() {
        assert_eq!(
            run_ok("var n = 0; while (n < 3) { print n; n = n + 1; }"),
            "0\n1\n2\n"
        );
    }

    // ──────────────────────────── functions ───────────────────────────

    #[test]
    fn test_recursion() {
        let source = "
            fun fib(n) {
              if (n < 2) return n;
              return fib(n - 1) + fib(n - 2);
            }
            print fib(15);
        ";

        assert_eq!(run_ok(source), "610\n");
    }

    #[test]
    fn test_counter_closure() {
        let source = "
            fun makeCounter() {
              var i = 0;
              fun count() {
                i = i + 1;
                print i;
              }
              return count;
            }
            var counter = makeCounter();
            counter();
            counter();
        ";

        assert_eq!(run_ok(source), "1\n2\n");
    }

    #[test]
    fn test_return_without_value_is_nil() {
        assert_eq!(
            run_ok("fun f() { return; } fun g() {} print f(); print g();"),
            "nil\nnil\n"
        );
    }

    #[test]
    fn test_return_unwinds_loops() {
        let source = "
            fun first(limit) {
              for (var i = 0; i < limit; i = i + 1) {
                while (true) { return i; }
              }
              return -1;
            }
            print first(5);
        ";

        assert_eq!(run_ok(source), "0\n");
    }

    #[test]
    fn test_arity_mismatch() {
        let (_, message) = runtime_error("fun f(a, b) {}\nf(1);");

        assert_eq!(message, "Expected 2 arguments but got 1. [line 2]");
    }

    #[test]
    fn test_calling_non_callable() {
        let (_, message) = runtime_error("\"not a function\"();");

        assert_eq!(message, "Can only call functions and classes. [line 1]");
    }

    // ──────────────────────────── classes ─────────────────────────────

    #[test]
    fn test_fields_and_methods() {
        let source = "
            class Box {
              describe() { return \"box of \" + this.item; }
            }
            var b = Box();
            b.item = \"tea\";
            print b.describe();
            var m = b.describe;
            b.item = \"cake\";
            print m();
        ";

        assert_eq!(run_ok(source), "box of tea\nbox of cake\n");
    }

    #[test]
    fn test_initializer() {
        let source = "
            class Point {
              init(x, y) { this.x = x; this.y = y; }
            }
            var p = Point(1, 2);
            print p.x + p.y;
            print p.init(5, 6) == p;
            print p.x;
        ";

        assert_eq!(run_ok(source), "3\ntrue\n5\n");
    }

    #[test]
    fn test_early_return_from_initializer_yields_instance() {
        let source = "
            class Foo {
              init() { this.ready = true; return; }
            }
            print Foo().ready;
        ";

        assert_eq!(run_ok(source), "true\n");
    }

    #[test]
    fn test_class_arity_follows_init() {
        let (_, message) = runtime_error("class A { init(x) {} }\nA();");

        assert_eq!(message, "Expected 1 arguments but got 0. [line 2]");
    }

    #[test]
    fn test_inheritance_and_super() {
        let source = "
            class A {
              method() { print \"A method\"; }
              shared() { return \"from A\"; }
            }
            class B < A {
              method() { print \"B method\"; }
              test() { super.method(); }
            }
            class C < B {}
            C().test();
            C().method();
            print C().shared();
        ";

        assert_eq!(run_ok(source), "A method\nB method\nfrom A\n");
    }

    #[test]
    fn test_super_is_bound_statically() {
        let source = "
            class A { name() { return \"A\"; } }
            class B < A { name() { return \"B\"; } test() { return super.name(); } }
            class C < B { name() { return \"C\"; } }
            print C().test();
        ";

        assert_eq!(run_ok(source), "A\n");
    }

    #[test]
    fn test_undefined_property() {
        let (_, message) = runtime_error("class A {}\nprint A().missing;");

        assert_eq!(message, "Undefined property 'missing'. [line 2]");
    }

    #[test]
    fn test_properties_only_on_instances() {
        let (_, get) = runtime_error("var x = 1; print x.y;");
        let (_, set) = runtime_error("var x = 1; x.y = 2;");

        assert_eq!(get, "Only instances have properties. [line 1]");
        assert_eq!(set, "Only instances have fields. [line 1]");
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        let (_, message) = runtime_error("var NotAClass = 1;\nclass B < NotAClass {}");

        assert_eq!(message, "Superclass must be a class. [line 2]");
    }

    // ───────────────────────────── errors ─────────────────────────────

    #[test]
    fn test_operand_type_errors() {
        let (_, unary) = runtime_error("print -\"x\";");
        let (_, binary) = runtime_error("print 1 < \"2\";");
        let (_, plus) = runtime_error("print 1 + \"2\";");

        assert_eq!(unary, "Operand must be a number. [line 1]");
        assert_eq!(binary, "Operands must be numbers. [line 1]");
        assert_eq!(plus, "Operands must be two numbers or two strings. [line 1]");
    }

    #[test]
    fn test_undefined_variable() {
        let (_, read) = runtime_error("print nope;");
        let (_, write) = runtime_error("nope = 1;");

        assert_eq!(read, "Undefined variable 'nope'. [line 1]");
        assert_eq!(write, "Undefined variable 'nope'. [line 1]");
    }

    #[test]
    fn test_runtime_error_keeps_earlier_output() {
        let (output, message) = runtime_error("print 1;\nprint nope;\nprint 3;");

        assert_eq!(output, "1\n");
        assert_eq!(message, "Undefined variable 'nope'. [line 2]");
    }

    #[test]
    fn test_static_errors_prevent_execution() {
        let (output, result) = run("print 1;\nprint $;\nprint (2;");

        assert_eq!(output, "");
        match result {
            Err(LoxError::Compile(errors)) => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                assert_eq!(messages[0], "[line 2] Error: Unexpected character: $");
                assert!(messages
                    .iter()
                    .any(|m| m == "[line 3] Error at ';': Expect ')' after expression."));
            }
            other => panic!("expected compile error, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_errors_prevent_execution() {
        let (output, result) = run("print 1;\nreturn 2;");

        assert_eq!(output, "");
        assert_eq!(
            result.map_err(|e| e.to_string()),
            Err("[line 2] Error at 'return': Cannot return from top-level code.".to_string())
        );
    }

    #[test]
    fn test_unbounded_recursion_is_fatal() {
        let (mut lox, _) = session();
        lox.set_max_depth(64);

        match lox.run("fun f(n) { return f(n + 1); }\nf(0);") {
            Err(e @ LoxError::StackOverflow { .. }) => {
                assert_eq!(e.category(), ErrorCategory::Fatal);
                assert!(e.to_string().contains("64"));
            }
            other => panic!("expected stack overflow, got {:?}", other),
        }
    }

    #[test]
    fn test_recursion_within_limit() {
        let (mut lox, out) = session();
        lox.set_max_depth(64);

        let result = lox.run("fun down(n) { if (n == 0) return 0; return down(n - 1); }\nprint down(60);");

        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(out.text(), "0\n");
    }

    #[test]
    fn test_default_depth_allows_deep_recursion() {
        let output = run_ok("fun count(n) { if (n == 0) return 0; return 1 + count(n - 1); }\nprint count(1500);");

        assert_eq!(output, "1500\n");
    }

    /// Run `source` and return the messages of the static errors it produced.
    fn compile_errors(source: &str) -> Vec<String> {
        let (output, result) = run(source);
        assert_eq!(output, "");

        match result {
            Err(LoxError::Compile(errors)) => errors.iter().map(ToString::to_string).collect(),
            other => panic!("expected compile error, got {:?}", other),
        }
    }

    #[test]
    fn test_excessive_nesting_is_a_syntax_error() {
        let blocks = format!("{}print 1;{}", "{".repeat(50_000), "}".repeat(50_000));
        let bangs = format!("print {}true;", "!".repeat(200_000));
        let ifs = format!("{}print 1;", "if (true) ".repeat(50_000));
        let sum = format!("print {}1;", "1 + ".repeat(5_000));

        for source in [blocks, bangs, ifs, sum] {
            let errors = compile_errors(&source);

            assert_eq!(errors.len(), 1, "{:?}", errors);
            assert!(errors[0].ends_with("Too much nesting."), "{}", errors[0]);
        }
    }

    #[test]
    fn test_moderate_nesting_runs() {
        let blocks = format!("{}print 1;{}", "{".repeat(200), "}".repeat(200));
        let bangs = format!("print {}true;", "!".repeat(500));
        let ifs = format!("{}print 3;", "if (true) ".repeat(200));

        assert_eq!(run_ok(&blocks), "1\n");
        assert_eq!(run_ok(&bangs), "true\n");
        assert_eq!(run_ok(&ifs), "3\n");
    }

    // ───────────────────────────── sessions ───────────────────────────

    #[test]
    fn test_session_keeps_globals_and_closures() {
        let (mut lox, out) = session();

        let lines = [
            "fun makeAdder(n) { fun add(x) { return x + n; } return add; }",
            "var addTwo = makeAdder(2);",
            "{ var local = 40; print addTwo(local); }",
            "print addTwo(1);",
        ];

        for line in lines {
            let result = lox.run(line);
            assert!(result.is_ok(), "{:?}", result);
        }

        assert_eq!(out.text(), "42\n3\n");
    }

    #[test]
    fn test_session_survives_errors() {
        let (mut lox, out) = session();

        assert!(lox.run("var a = 1;").is_ok());
        assert!(lox.run("print a +;").is_err());
        assert!(lox.run("print missing;").is_err());
        assert!(lox.run("{ var b = 2; print b + c; }").is_err());
        assert!(lox.run("{ var b = 3; print a + b; }").is_ok());

        assert_eq!(out.text(), "4\n");
    }

    #[test]
    fn test_run_prompt() {
        let (mut lox, out) = session();
        let mut prompt: Vec<u8> = Vec::new();
        let mut errors: Vec<u8> = Vec::new();

        let input = "var x = 2;\nprint y;\nprint x * 21;\n";
        let result = lox.run_prompt(input.as_bytes(), &mut prompt, &mut errors);

        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(out.text(), "42\n");
        assert_eq!(
            String::from_utf8_lossy(&errors),
            "Undefined variable 'y'. [line 1]\n"
        );
        assert_eq!(String::from_utf8_lossy(&prompt), "> > > > \n");
    }
}
