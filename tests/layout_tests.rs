use std::fs;

use morphc::backend::plan_program;
use morphc::cook::{SymbolTable, cook};
use morphc::graph::{GraphError, RawNodeId};
use morphc::interpreter::{self, RValue};
use morphc::layout::{Layout, LayoutError};

const FIB: &str = r#"{
  "nodes": [
    { "id": 10, "position": {"x": 0.0, "y": 0.0}, "text": "fib :: Int", "has_input": false,
      "pins": [ { "label": "?< 2", "connections": [ {"text": "$", "target": 11} ] },
                { "label": "_", "connections": [ {"text": "- 1", "target": 12},
                                                 {"text": "- 2", "target": 13} ] } ] },
    { "id": 11, "text": "Int" },
    { "id": 12, "text": "Int", "pins": [ { "connections": [ {"text": "fib", "target": 14} ] } ] },
    { "id": 13, "text": "Int", "pins": [ { "connections": [ {"text": "fib", "target": 15} ] } ] },
    { "id": 14, "text": "Int", "pins": [ { "connections": [ {"text": "$0", "target": 16} ] } ] },
    { "id": 15, "text": "Int", "pins": [ { "connections": [ {"text": "$1", "target": 16} ] } ] },
    { "id": 16, "text": "(Int, Int)", "pins": [ { "connections": [ {"text": "+", "target": 17} ] } ] },
    { "id": 17, "text": "Int" }
  ],
  "libraries": ["cmath"],
  "imports": ["Data.List"]
}"#;

#[test]
fn loads_a_document() {
    let layout = Layout::from_json(FIB).unwrap();
    assert_eq!(layout.nodes.len(), 8);
    assert!(!layout.nodes[0].has_input);
    assert!(layout.nodes[1].has_input);

    let loaded = layout.to_raw().unwrap();
    assert_eq!(loaded.libraries, vec!["cmath".to_string()]);
    assert_eq!(loaded.imports, vec!["Data.List".to_string()]);
    assert_eq!(loaded.raw.nodes[0].name.as_deref(), Some("fib"));
    assert_eq!(loaded.raw.nodes[0].type_name, "Int");
    assert_eq!(loaded.raw.connections.len(), 8);
    assert_eq!(loaded.raw.connections[1].source, RawNodeId(0));
    assert_eq!(loaded.raw.connections[1].target, RawNodeId(2));
    assert_eq!(loaded.raw.connections[1].pin, 1);
}

#[test]
fn loaded_document_runs() {
    let loaded = Layout::from_json(FIB).unwrap().to_raw().unwrap();
    let program = cook(&loaded.raw, &SymbolTable::prelude()).unwrap();
    let plan = plan_program(&program).unwrap();
    assert!(plan.main().is_none());
    assert_eq!(
        interpreter::call(&plan, "fib", RValue::Int(10)),
        Ok(RValue::Int(55))
    );
}

#[test]
fn json_survives_a_round_trip() {
    let layout = Layout::from_json(FIB).unwrap();
    let again = Layout::from_json(&layout.to_json().unwrap()).unwrap();
    assert_eq!(again, layout);
}

#[test]
fn loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fib.json");
    fs::write(&path, FIB).unwrap();
    assert_eq!(Layout::load(&path).unwrap().nodes.len(), 8);

    let missing = Layout::load(dir.path().join("missing.json"));
    assert!(matches!(missing, Err(LayoutError::Io(_))));
}

#[test]
fn malformed_json() {
    assert!(matches!(
        Layout::from_json("{\"nodes\": 3}"),
        Err(LayoutError::Json(_))
    ));
}

#[test]
fn duplicate_ids() {
    let layout = Layout::from_json(
        r#"{ "nodes": [ { "id": 1, "text": "()" }, { "id": 1, "text": "Int" } ] }"#,
    )
    .unwrap();
    assert!(matches!(layout.to_raw(), Err(LayoutError::DuplicateId(1))));
}

#[test]
fn unknown_targets() {
    let layout = Layout::from_json(
        r#"{ "nodes": [ { "id": 1, "text": "()",
                          "pins": [ { "connections": [ {"text": "1", "target": 9} ] } ] } ] }"#,
    )
    .unwrap();
    assert!(matches!(
        layout.to_raw(),
        Err(LayoutError::UnknownTarget { node: 1, target: 9 })
    ));
}

#[test]
fn connections_into_inputless_nodes() {
    let layout = Layout::from_json(
        r#"{ "nodes": [ { "id": 1, "text": "()",
                          "pins": [ { "connections": [ {"text": "1", "target": 2} ] } ] },
                        { "id": 2, "text": "Int", "has_input": false } ] }"#,
    )
    .unwrap();
    assert!(matches!(
        layout.to_raw(),
        Err(LayoutError::Graph(GraphError::NoInput(1)))
    ));
}

#[test]
fn empty_text_is_rejected() {
    let layout = Layout::from_json(r#"{ "nodes": [ { "id": 4, "text": "  " } ] }"#).unwrap();
    assert!(matches!(
        layout.to_raw(),
        Err(LayoutError::BadText { node: 4, .. })
    ));
}
