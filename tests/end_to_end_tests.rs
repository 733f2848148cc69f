use morphc::backend::{self, CppBackend, HaskellBackend, ProgramPlan, TranslateError};
use morphc::cook::{CookError, SymbolTable, cook};
use morphc::graph::RawGraph;
use morphc::interpreter::{self, EvalError, RValue};

fn plan(raw: &RawGraph) -> ProgramPlan {
    let program = cook(raw, &SymbolTable::prelude()).expect("graph should cook");
    backend::plan_program(&program).expect("graph should plan")
}

/// `() --"9 + 42"--> Int`
fn constant() -> RawGraph {
    let mut raw = RawGraph::new();
    let unit = raw.new_node("()", None, &["_"], false);
    let sink = raw.new_node("Int", None, &[], true);
    raw.connect(unit, sink, 0, "9 + 42").unwrap();
    raw
}

/// `5` goes through `?< 4` or `_`, both pins meet at one sink.
fn guarded() -> RawGraph {
    let mut raw = RawGraph::new();
    let unit = raw.new_node("()", None, &["_"], false);
    let n = raw.new_node("Int", None, &["?< 4", "_"], true);
    let sink = raw.new_node("Int", None, &[], true);
    raw.connect(unit, n, 0, "5").unwrap();
    raw.connect(n, sink, 0, "* 10").unwrap();
    raw.connect(n, sink, 1, "+ 100").unwrap();
    raw
}

/// A recursive `fib :: Int` plus a main computing `fib 6`.
fn fibonacci() -> RawGraph {
    let mut raw = RawGraph::new();
    let fib = raw.new_node("Int", Some("fib"), &["?< 2", "_"], false);
    let base = raw.new_node("Int", None, &[], true);
    let pred1 = raw.new_node("Int", None, &["_"], true);
    let fib1 = raw.new_node("Int", None, &["_"], true);
    let pred2 = raw.new_node("Int", None, &["_"], true);
    let fib2 = raw.new_node("Int", None, &["_"], true);
    let pair = raw.new_node("(Int, Int)", None, &["_"], true);
    let sum = raw.new_node("Int", None, &[], true);

    raw.connect(fib, base, 0, "$").unwrap();
    raw.connect(fib, pred1, 1, "- 1").unwrap();
    raw.connect(fib, pred2, 1, "- 2").unwrap();
    raw.connect(pred1, fib1, 0, "fib").unwrap();
    raw.connect(pred2, fib2, 0, "fib").unwrap();
    raw.connect(fib1, pair, 0, "$0").unwrap();
    raw.connect(fib2, pair, 0, "$1").unwrap();
    raw.connect(pair, sum, 0, "+").unwrap();

    let unit = raw.new_node("()", None, &["_"], false);
    let result = raw.new_node("Int", None, &[], true);
    raw.connect(unit, result, 0, "fib 6").unwrap();
    raw
}

#[test]
fn constant_expression_evaluates() {
    let plan = plan(&constant());
    assert_eq!(plan.functions.len(), 1);
    assert_eq!(interpreter::run_main(&plan), Ok(RValue::Int(51)));
}

#[test]
fn guard_selects_second_pin() {
    let plan = plan(&guarded());
    assert_eq!(interpreter::run_main(&plan), Ok(RValue::Int(105)));
}

#[test]
fn guard_selects_first_pin() {
    let mut raw = guarded();
    raw.connections[0].text = "3".to_string();
    let plan = plan(&raw);
    assert_eq!(interpreter::run_main(&plan), Ok(RValue::Int(30)));
}

#[test]
fn recursive_function() {
    let plan = plan(&fibonacci());
    assert!(plan.function("fib").is_some());
    assert!(plan.main().is_some());
    assert_eq!(
        interpreter::call(&plan, "fib", RValue::Int(6)),
        Ok(RValue::Int(8))
    );
    assert_eq!(
        interpreter::call(&plan, "fib", RValue::Int(1)),
        Ok(RValue::Int(1))
    );
    assert_eq!(interpreter::run_main(&plan), Ok(RValue::Int(8)));
}

#[test]
fn branching_function_result_feeds_an_operator() {
    let mut raw = fibonacci();
    raw.connections[8].text = "1 + (fib 6)".to_string();
    let plan = plan(&raw);
    assert_eq!(interpreter::run_main(&plan), Ok(RValue::Int(9)));
}

#[test]
fn branching_function_result_is_type_checked() {
    let mut raw = fibonacci();
    raw.nodes[9].type_name = "Bool".to_string();
    let program = cook(&raw, &SymbolTable::prelude()).unwrap();
    let err = backend::plan_program(&program).unwrap_err();
    assert!(matches!(
        err,
        TranslateError::TypeDeduction { context, .. } if context.contains("fib 6")
    ));
}

#[test]
fn surplus_arguments_fail_cooking() {
    for text in ["fib 6 + 1", "div 10 2 7 8"] {
        let mut raw = fibonacci();
        raw.connections[8].text = text.to_string();
        let err = cook(&raw, &SymbolTable::prelude()).unwrap_err();
        assert!(matches!(err, CookError::Parse(_)), "{text}: {err}");
    }
}

#[test]
fn program_function_as_guard() {
    let mut raw = RawGraph::new();
    let small = raw.new_node("Int", Some("isSmall"), &["_"], false);
    let answer = raw.new_node("Bool", None, &[], true);
    raw.connect(small, answer, 0, "< 10").unwrap();

    let unit = raw.new_node("()", None, &["_"], false);
    let n = raw.new_node("Int", None, &["?isSmall", "_"], true);
    let sink = raw.new_node("Char", None, &[], true);
    raw.connect(unit, n, 0, "3").unwrap();
    raw.connect(n, sink, 0, "'s'").unwrap();
    raw.connect(n, sink, 1, "'l'").unwrap();

    let plan = plan(&raw);
    assert_eq!(
        interpreter::call(&plan, "isSmall", RValue::Int(30)),
        Ok(RValue::Bool(false))
    );
    assert_eq!(interpreter::run_main(&plan), Ok(RValue::Char('s')));
}

#[test]
fn pattern_branches() {
    let mut raw = RawGraph::new();
    let unit = raw.new_node("()", None, &["_"], false);
    let pair = raw.new_node("(Int, Bool)", None, &["(0, _)", "(_, True)", "_"], true);
    let sink = raw.new_node("Int", None, &[], true);
    raw.connect(unit, pair, 0, "!(7, True)").unwrap();
    raw.connect(pair, sink, 0, "fst").unwrap();
    raw.connect(pair, sink, 1, "fst").unwrap();
    raw.connect(pair, sink, 2, "1").unwrap();

    let plan = plan(&raw);
    assert_eq!(interpreter::run_main(&plan), Ok(RValue::Int(7)));
}

#[test]
fn division_by_zero_is_reported() {
    let mut raw = constant();
    raw.connections[0].text = "div 1 0".to_string();
    let plan = plan(&raw);
    assert_eq!(interpreter::run_main(&plan), Err(EvalError::DivisionByZero));
}

#[test]
fn unknown_type_fails_cooking() {
    let mut raw = RawGraph::new();
    let unit = raw.new_node("()", None, &["_"], false);
    let sink = raw.new_node("Widget", None, &[], true);
    raw.connect(unit, sink, 0, "1").unwrap();
    let err = cook(&raw, &SymbolTable::prelude()).unwrap_err();
    assert!(matches!(err, CookError::UnresolvedType { name, .. } if name == "Widget"));
}

#[test]
fn renders_cpp() {
    let plan = plan(&fibonacci());
    let translation = backend::translate(&plan, &CppBackend);
    let source = translation.source;
    assert_eq!(translation.extension, "cpp");
    assert!(source.contains("long fib(long v0);"));
    assert!(source.contains("long morph_main()"));
    assert!(source.contains("if ((v0 < 2)) {"));
    assert!(source.contains("} else {"));
    assert!(source.contains("return v1;"));
    assert!(source.contains("auto [v6_0, v6_1] = v6;"));
    assert!(source.contains("morph::show(std::cout, morph_main());"));
}

#[test]
fn renders_haskell() {
    let plan = plan(&fibonacci());
    let translation = backend::translate(&plan, &HaskellBackend);
    let source = translation.source;
    assert_eq!(translation.extension, "hs");
    assert!(source.starts_with("module Main where"));
    assert!(source.contains("fib :: Int -> Int"));
    assert!(source.contains("fib v0 ="));
    assert!(source.contains("_ | (v0 < 2) ->"));
    assert!(source.contains("(v6_0, v6_1) = v6"));
    assert!(source.contains("main = print morphMain"));
}

#[test]
fn compile_carries_libraries_and_imports() {
    let program = cook(&constant(), &SymbolTable::prelude()).unwrap();
    let translation = backend::compile(
        &program,
        &CppBackend,
        &["cmath".to_string()],
        &["Data.List".to_string()],
    )
    .unwrap();
    assert!(translation.source.contains("#include <cmath>"));

    let translation = backend::compile(
        &program,
        &HaskellBackend,
        &["cmath".to_string()],
        &["Data.List".to_string()],
    )
    .unwrap();
    assert!(translation.source.contains("import Data.List"));
}
