use morphc::cook::{CookError, Symbol, SymbolTable, cook, uncook};
use morphc::graph::{Brancher, GraphError, NodeId, Pattern, RawConnection, RawGraph, RawNodeId};
use morphc::morphism::Value;
use morphc::types::Type;

fn prelude() -> SymbolTable {
    SymbolTable::prelude()
}

/// Two Ints joined into a pair, then summed.
fn pair_graph(first: &str, second: &str) -> RawGraph {
    let mut raw = RawGraph::new();
    let unit = raw.new_node("()", None, &["_"], false);
    let a = raw.new_node("Int", None, &["_"], true);
    let b = raw.new_node("Int", None, &["_"], true);
    let pair = raw.new_node("(Int, Int)", None, &["_"], true);
    let sum = raw.new_node("Int", None, &[], true);
    raw.connect(unit, a, 0, "1").unwrap();
    raw.connect(a, b, 0, "+ 1").unwrap();
    raw.connect(a, pair, 0, first).unwrap();
    raw.connect(b, pair, 0, second).unwrap();
    raw.connect(pair, sum, 0, "+").unwrap();
    raw
}

#[test]
fn cook_then_uncook_is_identity() {
    let mut raw = RawGraph::new();
    let fib = raw.new_node("Int", Some("fib"), &["?< 2", "_"], false);
    let pair = raw.new_node("(Int, Char)", None, &["(0, _)", "_"], true);
    let sink = raw.new_node("Bool", None, &[], true);
    raw.connect(fib, pair, 0, "!(1, 'x')").unwrap();
    raw.connect(fib, pair, 1, "!(2, 'y')").unwrap();
    raw.connect(pair, sink, 0, "True").unwrap();
    raw.connect(pair, sink, 1, "False").unwrap();

    let program = cook(&raw, &prelude()).unwrap();
    assert_eq!(uncook(&program), raw);
}

#[test]
fn cooked_nodes_carry_types_and_pins() {
    let program = cook(&pair_graph("$0", "$1"), &prelude()).unwrap();
    assert_eq!(program.node_count(), 5);
    assert_eq!(program.arrow_count(), 5);
    assert_eq!(
        program.node(NodeId(3)).ty,
        Type::tuple(vec![Type::INT, Type::INT])
    );
    assert_eq!(program.node(NodeId(3)).incoming.len(), 2);
    assert!(program.node(NodeId(4)).is_sink());
    assert_eq!(program.roots().collect::<Vec<_>>(), vec![NodeId(0)]);
}

#[test]
fn return_types_come_from_reachable_sinks() {
    let program = cook(&pair_graph("$0", "$1"), &prelude()).unwrap();
    assert_eq!(program.node(NodeId(3)).return_type, Type::INT);
    // `a` fans out to two nodes that meet again before the sink
    assert_eq!(program.node(NodeId(1)).return_type, Type::INT);
    assert_eq!(program.node(NodeId(0)).return_type, Type::INT);
}

#[test]
fn branchers_are_parsed() {
    let mut raw = RawGraph::new();
    let unit = raw.new_node("()", None, &["_"], false);
    let n = raw.new_node("Int", None, &["0", "?> 3", "_"], true);
    let sink = raw.new_node("Int", None, &[], true);
    raw.connect(unit, n, 0, "4").unwrap();
    for pin in 0..3 {
        raw.connect(n, sink, pin, "$").unwrap();
    }

    let program = cook(&raw, &prelude()).unwrap();
    let pins = &program.node(NodeId(1)).pins;
    assert!(matches!(
        &pins[0].brancher,
        Brancher::Pattern(Pattern::Value(Value::Int(0)))
    ));
    assert!(matches!(&pins[1].brancher, Brancher::Guard(_)));
    assert!(pins[2].brancher.is_irrefutable());
    assert_eq!(pins[1].label, "?> 3");
}

#[test]
fn single_pin_is_always_taken() {
    let mut raw = RawGraph::new();
    let unit = raw.new_node("()", None, &["whatever"], false);
    let sink = raw.new_node("Int", None, &[], true);
    raw.connect(unit, sink, 0, "1").unwrap();
    let program = cook(&raw, &prelude()).unwrap();
    assert!(matches!(
        program.node(NodeId(0)).pins[0].brancher,
        Brancher::Any
    ));
}

#[test]
fn mixed_positional_inputs() {
    let err = cook(&pair_graph("$0", "+ 1"), &prelude()).unwrap_err();
    assert_eq!(err, CookError::MixedPositional { node: NodeId(3) });
}

#[test]
fn slot_out_of_range() {
    let err = cook(&pair_graph("$0", "$2"), &prelude()).unwrap_err();
    assert!(matches!(err, CookError::BadPosition { node: NodeId(3), .. }));
}

#[test]
fn slot_filled_twice() {
    let err = cook(&pair_graph("$1", "$1"), &prelude()).unwrap_err();
    assert!(matches!(
        err,
        CookError::BadPosition { reason, .. } if reason.contains("twice")
    ));
}

#[test]
fn guard_must_yield_bool() {
    let mut raw = RawGraph::new();
    let unit = raw.new_node("()", None, &["_"], false);
    let n = raw.new_node("Int", None, &["?+ 1", "_"], true);
    let sink = raw.new_node("Int", None, &[], true);
    raw.connect(unit, n, 0, "4").unwrap();
    raw.connect(n, sink, 0, "$").unwrap();
    raw.connect(n, sink, 1, "$").unwrap();

    let err = cook(&raw, &prelude()).unwrap_err();
    assert!(matches!(err, CookError::GuardNotBoolean { .. }));
}

#[test]
fn unresolved_symbol_in_arrow() {
    let mut raw = RawGraph::new();
    let unit = raw.new_node("()", None, &["_"], false);
    let sink = raw.new_node("Int", None, &[], true);
    raw.connect(unit, sink, 0, "frobnicate 3").unwrap();

    let err = cook(&raw, &prelude()).unwrap_err();
    assert!(matches!(
        err,
        CookError::UnresolvedSymbol { name, .. } if name == "frobnicate"
    ));
}

#[test]
fn declared_symbols_resolve() {
    let mut symbols = prelude();
    symbols.load("-- extras\ntype Widget\nspin :: Widget -> Int\n").unwrap();

    let mut raw = RawGraph::new();
    let root = raw.new_node("Widget", Some("weigh"), &["_"], false);
    let sink = raw.new_node("Int", None, &[], true);
    raw.connect(root, sink, 0, "spin").unwrap();

    let program = cook(&raw, &symbols).unwrap();
    assert_eq!(program.node(NodeId(0)).ty, Type::param("Widget", Vec::new()));
}

#[test]
fn named_roots_become_functions() {
    let mut symbols = SymbolTable::new();
    symbols.insert("Int", Symbol::ty(Type::INT));

    let mut raw = RawGraph::new();
    let root = raw.new_node("Int", Some("same"), &["_"], false);
    let sink = raw.new_node("Int", None, &[], true);
    raw.connect(root, sink, 0, "$").unwrap();
    let caller = raw.new_node("Int", Some("again"), &["_"], false);
    let out = raw.new_node("Int", None, &[], true);
    raw.connect(caller, out, 0, "same").unwrap();

    assert!(cook(&raw, &symbols).is_ok());
}

#[test]
fn hand_built_graphs_are_checked() {
    let mut raw = RawGraph::new();
    raw.new_node("()", None, &["_"], false);
    raw.new_node("Int", None, &[], true);
    raw.connections.push(RawConnection {
        source: RawNodeId(0),
        target: RawNodeId(1),
        pin: 3,
        text: "1".to_string(),
    });

    let err = cook(&raw, &prelude()).unwrap_err();
    assert_eq!(
        err,
        CookError::Graph(GraphError::PinOutOfRange {
            node: 0,
            pin: 3,
            pins: 1
        })
    );
}
