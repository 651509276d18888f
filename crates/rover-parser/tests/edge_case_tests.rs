//! Precedence worked examples and static error coverage.

use pretty_assertions::assert_eq;
use rover_lexer::Lexer;
use rover_parser::{Parser, MAX_EXPR_DEPTH, MAX_EXPR_HEIGHT};
use rover_types::ast::*;
use rover_types::{ErrorCategory, ErrorCode, RoverError, SourceFile};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn parse(source: &str) -> Result<Program, RoverError> {
    let sf = SourceFile::new("main.py", source);
    let tokens = Lexer::new(&sf).lex()?;
    Parser::new(tokens, &sf).parse()
}

fn parse_err(source: &str) -> RoverError {
    match parse(source) {
        Ok(prog) => panic!("expected an error, parsed {} statements", prog.stmts.len()),
        Err(e) => e,
    }
}

/// Parse `x = <expr>` and return the right-hand side.
fn expr(source: &str) -> Expr {
    let mut prog = parse(&format!("x = {source}\n")).unwrap();
    match prog.stmts.remove(0) {
        Stmt::Assign(assign) => assign.value,
        other => panic!("expected assignment, got {other:?}"),
    }
}

/// Render an expression fully parenthesised.
fn show(e: &Expr) -> String {
    match &e.kind {
        ExprKind::Int(n) => n.to_string(),
        ExprKind::Float(n) => format!("{n:?}"),
        ExprKind::Str(s) => format!("'{s}'"),
        ExprKind::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        ExprKind::NoneLit => "None".to_string(),
        ExprKind::Identifier(name) => name.clone(),
        ExprKind::List(items) => {
            let items: Vec<_> = items.iter().map(show).collect();
            format!("[{}]", items.join(", "))
        }
        ExprKind::Dict(entries) => {
            let entries: Vec<_> = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", show(k), show(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        ExprKind::Call { callee, args } => {
            let args: Vec<_> = args.iter().map(show).collect();
            format!("{}({})", callee.name, args.join(", "))
        }
        ExprKind::MethodCall {
            object,
            method,
            args,
        } => {
            let args: Vec<_> = args.iter().map(show).collect();
            format!("{}.{}({})", show(object), method.name, args.join(", "))
        }
        ExprKind::Binary { left, op, right } => {
            format!("({} {} {})", show(left), op.as_str(), show(right))
        }
        ExprKind::Unary { op, operand } => {
            let op = match op {
                UnaryOp::Neg => "-",
                UnaryOp::Pos => "+",
                UnaryOp::Not => "not ",
            };
            format!("({op}{})", show(operand))
        }
        ExprKind::Index { object, index } => format!("{}[{}]", show(object), show(index)),
        ExprKind::Slice {
            object,
            start,
            stop,
        } => format!(
            "{}[{}:{}]",
            show(object),
            start.as_deref().map(show).unwrap_or_default(),
            stop.as_deref().map(show).unwrap_or_default()
        ),
    }
}

fn shown(source: &str) -> String {
    show(&expr(source))
}

// ═══════════════════════════════════════════════════════════════════════
// 1. Precedence Worked Examples
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_prec_mul_binds_tighter_than_add() {
    assert_eq!(shown("1 + 2 * 3"), "(1 + (2 * 3))");
    assert_eq!(shown("7 // 2 - 1 % 3"), "((7 // 2) - (1 % 3))");
}

#[test]
fn test_prec_left_assoc_same_level() {
    assert_eq!(shown("10 - 3 - 2"), "((10 - 3) - 2)");
    assert_eq!(shown("8 / 4 / 2"), "((8 / 4) / 2)");
}

#[test]
fn test_prec_comparison_tighter_than_not_and_or() {
    assert_eq!(
        shown("not a == b or c < d and e"),
        "((not (a == b)) or ((c < d) and e))"
    );
}

#[test]
fn test_prec_unary_binds_tighter_than_mul() {
    assert_eq!(shown("-a * b"), "((-a) * b)");
    assert_eq!(shown("- -a"), "(-(-a))");
    assert_eq!(shown("+3"), "(+3)");
}

#[test]
fn test_prec_membership() {
    assert_eq!(shown("a in xs"), "(a in xs)");
    assert_eq!(shown("a not in xs"), "(a not in xs)");
    assert_eq!(shown("not a in xs"), "(not (a in xs))");
    assert_eq!(shown("k + 1 in d"), "((k + 1) in d)");
}

#[test]
fn test_prec_parentheses_override() {
    assert_eq!(shown("(1 + 2) * 3"), "((1 + 2) * 3)");
}

#[test]
fn test_postfix_chains() {
    assert_eq!(shown("grid[1][2]"), "grid[1][2]");
    assert_eq!(shown("name.upper()"), "name.upper()");
    assert_eq!(shown("xs[1:]"), "xs[1:]");
    assert_eq!(shown("xs[:2]"), "xs[:2]");
    assert_eq!(shown("xs[:]"), "xs[:]");
    assert_eq!(shown("len(xs[-2:]) + 1"), "(len(xs[(-2):]) + 1)");
    assert_eq!(shown("d.get('a', 0)"), "d.get('a', 0)");
}

#[test]
fn test_collection_literals() {
    assert_eq!(shown("[]"), "[]");
    assert_eq!(shown("[1, 'a', [True]]"), "[1, 'a', [True]]");
    assert_eq!(shown("[1, 2,]"), "[1, 2]");
    assert_eq!(shown("{}"), "{}");
    assert_eq!(shown("{'a': 1, 2: None}"), "{'a': 1, 2: None}");
    assert_eq!(shown("3.5"), "3.5");
}

#[test]
fn test_multiline_list_literal() {
    assert_eq!(shown("[\n    1,\n    2,\n]"), "[1, 2]");
}

#[test]
fn test_expression_spans_cover_operands() {
    let e = expr("alpha + beta");
    assert_eq!(e.span.start_col, 5);
    assert_eq!(e.span.end_col, 16);
}

// ═══════════════════════════════════════════════════════════════════════
// 2. Static Errors
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_missing_colon() {
    let err = parse_err("if x > 1\n    move_right()\n");
    assert_eq!(err.code, ErrorCode::UNEXPECTED_TOKEN);
    assert_eq!(err.category, ErrorCategory::Parse);
    assert_eq!(err.message, "expected ':' after if condition");
    assert_eq!(err.suggestion.as_deref(), Some("add ':' at the end of the line"));
    assert_eq!(err.line(), 1);
}

#[test]
fn test_missing_indent() {
    let err = parse_err("for i in range(3):\nmove_right()\n");
    assert_eq!(err.code, ErrorCode::EXPECTED_INDENT);
    assert_eq!(err.line(), 2);
}

#[test]
fn test_unexpected_indent() {
    let err = parse_err("move_right()\n    move_down()\n");
    assert_eq!(err.code, ErrorCode::UNEXPECTED_INDENT);
    assert_eq!(err.line(), 2);
}

#[test]
fn test_nested_def_rejected() {
    let err = parse_err("def outer():\n    def inner():\n        pass\n");
    assert_eq!(err.code, ErrorCode::NESTED_FUNCTION);
    let err = parse_err("for i in range(2):\n    def f():\n        pass\n");
    assert_eq!(err.code, ErrorCode::NESTED_FUNCTION);
}

#[test]
fn test_break_outside_loop() {
    let err = parse_err("move_right()\nbreak\n");
    assert_eq!(err.code, ErrorCode::OUTSIDE_LOOP);
    assert_eq!(err.message, "'break' outside loop");
    let err = parse_err("def f():\n    continue\n");
    assert_eq!(err.code, ErrorCode::OUTSIDE_LOOP);
}

#[test]
fn test_return_outside_function() {
    let err = parse_err("for i in range(2):\n    return i\n");
    assert_eq!(err.code, ErrorCode::OUTSIDE_FUNCTION);
}

#[test]
fn test_invalid_assignment_targets() {
    for src in ["f() = 1", "1 = x", "a + b = 2", "xs[1:2] = []", "s.upper() = 'A'"] {
        assert_eq!(parse_err(src).code, ErrorCode::INVALID_TARGET, "{src}");
    }
}

#[test]
fn test_duplicate_parameter() {
    let err = parse_err("def f(a, b, a):\n    pass\n");
    assert_eq!(err.code, ErrorCode::DUPLICATE_PARAMETER);
    assert_eq!(err.span.start_col, 13);
}

#[test]
fn test_chained_comparison_rejected() {
    let err = parse_err("ok = 1 < x < 5\n");
    assert_eq!(err.code, ErrorCode::CHAINED_COMPARISON);
    assert!(err.suggestion.unwrap().contains("and"));
}

#[test]
fn test_call_on_non_identifier_rejected() {
    assert_eq!(parse_err("xs[0]()").code, ErrorCode::UNEXPECTED_TOKEN);
    assert_eq!(parse_err("f()()").code, ErrorCode::UNEXPECTED_TOKEN);
}

#[test]
fn test_attribute_access_rejected() {
    let err = parse_err("n = xs.length\n");
    assert!(err.message.contains("method"), "{}", err.message);
}

#[test]
fn test_keyword_as_name_rejected() {
    let err = parse_err("def if():\n    pass\n");
    assert!(err.message.contains("reserved word"), "{}", err.message);
}

#[test]
fn test_unclosed_call_reports_first_line() {
    let err = parse_err("move_right(\nmove_down()\n");
    assert_eq!(err.code, ErrorCode::UNEXPECTED_TOKEN);
}

#[test]
fn test_trailing_garbage_after_statement() {
    let err = parse_err("move_right() move_down()\n");
    assert!(err.message.starts_with("expected end of line"), "{}", err.message);
}

#[test]
fn test_else_without_if() {
    let err = parse_err("else:\n    pass\n");
    assert_eq!(err.code, ErrorCode::UNEXPECTED_TOKEN);
}

#[test]
fn test_lex_errors_pass_through() {
    let err = parse_err("speak('oops)\n");
    assert_eq!(err.category, ErrorCategory::Lex);
}

// ═══════════════════════════════════════════════════════════════════════
// 3. Nesting Limit
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_nesting_within_limit_ok() {
    let depth = (MAX_EXPR_DEPTH - 2) as usize;
    let src = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(shown(&src), "1");
}

#[test]
fn test_nesting_beyond_limit_rejected() {
    let depth = MAX_EXPR_DEPTH as usize + 1;
    let src = format!("x = {}1{}\n", "[".repeat(depth), "]".repeat(depth));
    assert_eq!(parse_err(&src).code, ErrorCode::NESTING_LIMIT);

    let src = format!("x = {}1\n", "-".repeat(200));
    assert_eq!(parse_err(&src).code, ErrorCode::NESTING_LIMIT);

    let src = format!("x = {}True\n", "not ".repeat(200));
    assert_eq!(parse_err(&src).code, ErrorCode::NESTING_LIMIT);
}

#[test]
fn test_chain_up_to_height_limit_ok() {
    let links = (MAX_EXPR_HEIGHT - 1) as usize;
    let e = expr(&format!("1{}", " + 1".repeat(links)));
    assert_eq!(e.depth, MAX_EXPR_HEIGHT);
    assert!(matches!(e.kind, ExprKind::Binary { op: BinOp::Add, .. }));
}

#[test]
fn test_long_chains_rejected() {
    let src = format!("x = 1{}\n", "+1".repeat(20_000));
    let err = parse_err(&src);
    assert_eq!(err.code, ErrorCode::NESTING_LIMIT);
    assert_eq!(err.line(), 1);

    let src = format!("x = y{}\n", "[0]".repeat(20_000));
    assert_eq!(parse_err(&src).code, ErrorCode::NESTING_LIMIT);

    let src = format!("x = a{}\n", " and a".repeat(20_000));
    assert_eq!(parse_err(&src).code, ErrorCode::NESTING_LIMIT);

    let src = format!("x = s{}\n", ".upper()".repeat(20_000));
    assert_eq!(parse_err(&src).code, ErrorCode::NESTING_LIMIT);
}

#[test]
fn test_height_counts_nested_operands() {
    // Each parenthesised group is short, but the groups stack.
    let group = format!("(1{})", " * 2".repeat(100));
    let src = format!("x = {}\n", [group.as_str(); 3].join(" + "));
    assert!(parse(&src).is_ok());
    let src = format!("x = [{}] + 1{}\n", group, " + 1".repeat(160));
    assert_eq!(parse_err(&src).code, ErrorCode::NESTING_LIMIT);
}
