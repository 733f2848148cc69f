//! Haskell renderer: each block becomes `let ... in` around either a result
//! or a `case` whose alternatives are patterns and guards.

use crate::graph::Pattern;
use crate::morphism::{Value, is_operator};
use crate::types::{Atom, Type};

use super::Backend;
use super::plan::{BranchLabel, Body, Expr, FunctionPlan, ProgramPlan, Step};
use super::writer::CodeWriter;

#[derive(Debug, Clone, Default)]
pub struct HaskellBackend;

impl Backend for HaskellBackend {
    fn name(&self) -> &'static str {
        "haskell"
    }

    fn extension(&self) -> &'static str {
        "hs"
    }

    fn build_command(&self) -> &'static str {
        "ghc -v0 -O0 -outputdir {output}.build -o {output} {input}"
    }

    fn render(&self, plan: &ProgramPlan) -> String {
        let mut out = CodeWriter::new();
        out.line("module Main where");
        out.blank();
        for import in &plan.imports {
            out.line(&format!("import {import}"));
        }
        if !plan.imports.is_empty() {
            out.blank();
        }

        for function in &plan.functions {
            render_function(function, &mut out);
            out.blank();
        }

        if plan.main().is_some() {
            out.line("main :: IO ()");
            out.line(&format!("main = print {}", function_name("main", true)));
        }
        out.finish()
    }
}

fn function_name(name: &str, is_main: bool) -> String {
    if is_main {
        "morphMain".to_string()
    } else if is_operator(name) {
        format!("({name})")
    } else {
        name.to_string()
    }
}

fn render_function(function: &FunctionPlan, out: &mut CodeWriter) {
    let name = function_name(&function.name, function.is_main());
    let result = hs_type(&function.result_type);
    match &function.param {
        Some(param) => {
            out.line(&format!(
                "{name} :: {} -> {result}",
                hs_argument_type(&function.param_type)
            ));
            out.line(&format!("{name} {param} ="));
        }
        None => {
            out.line(&format!("{name} :: {result}"));
            out.line(&format!("{name} ="));
        }
    }
    out.indent();
    let mut fresh = 0;
    render_body(&function.body, out, &mut fresh);
    out.dedent();
}

fn render_body(body: &Body, out: &mut CodeWriter, fresh: &mut usize) {
    let mut result = None;
    let mut bindings = Vec::new();
    for step in &body.definitions {
        match step {
            Step::Bind { var, expr, .. } => {
                bindings.push(format!("{var} = {}", render_expr(expr, fresh)));
            }
            Step::Unpack { tuple, vars, .. } => {
                bindings.push(format!("({}) = {tuple}", vars.join(", ")));
            }
            Step::Return(expr) => result = Some(render_expr(expr, fresh)),
        }
    }

    if !bindings.is_empty() {
        out.line("let");
        out.indent();
        for binding in &bindings {
            out.line(binding);
        }
        out.dedent();
        out.line("in");
    }

    if let Some(result) = result {
        out.line(&result);
        return;
    }

    let subject = body
        .branches
        .iter()
        .find_map(|(label, _)| match label {
            BranchLabel::Pattern { subject, .. } => Some(subject.clone()),
            _ => None,
        })
        .unwrap_or_else(|| "()".to_string());
    out.line(&format!("case {subject} of"));
    out.indent();
    for (label, block) in &body.branches {
        let head = match label {
            BranchLabel::Otherwise => "_ ->".to_string(),
            BranchLabel::Pattern { pattern, .. } => format!("{} ->", render_pattern(pattern)),
            BranchLabel::Guard(guard) => format!("_ | {} ->", render_expr(guard, fresh)),
        };
        out.line(&head);
        out.indent();
        render_body(block, out, fresh);
        out.dedent();
    }
    out.dedent();
}

pub(crate) fn hs_type(ty: &Type) -> String {
    match ty {
        Type::Atom(Atom::Int) => "Int".to_string(),
        Type::Atom(Atom::Char) => "Char".to_string(),
        Type::Atom(Atom::Bool) => "Bool".to_string(),
        Type::Atom(Atom::Float) => "Double".to_string(),
        Type::Atom(_) => "()".to_string(),
        Type::Tuple(items) => format!(
            "({})",
            items.iter().map(hs_type).collect::<Vec<_>>().join(", ")
        ),
        Type::Param { name, args } => match (name.as_str(), args.as_slice()) {
            ("List", [item]) => format!("[{}]", hs_type(item)),
            (_, []) => name.clone(),
            (_, args) => format!(
                "{name} {}",
                args.iter().map(hs_argument_type).collect::<Vec<_>>().join(" ")
            ),
        },
        Type::Var(var) => var.name.clone(),
        Type::Func(arg, result) => format!("{} -> {}", hs_argument_type(arg), hs_type(result)),
    }
}

/// Parenthesized where juxtaposition or an arrow would bind it wrongly.
fn hs_argument_type(ty: &Type) -> String {
    let rendered = hs_type(ty);
    match ty {
        Type::Func(_, _) => format!("({rendered})"),
        Type::Param { name, args } if !args.is_empty() && name != "List" => {
            format!("({rendered})")
        }
        _ => rendered,
    }
}

fn render_pattern(pattern: &Pattern) -> String {
    match pattern {
        Pattern::Any => "_".to_string(),
        Pattern::Value(value) => literal(value),
        Pattern::Tuple(items) => format!(
            "({})",
            items.iter().map(render_pattern).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::Char(c) => format!("'{}'", escape(&c.to_string(), '\'')),
        Value::Str(s) => format!("\"{}\"", escape(s, '"')),
        value if value.is_negative() => format!("({value})"),
        value => value.to_string(),
    }
}

fn escape(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                out.push_str(&format!("\\{}", c as u32));
                // `\&` ends a numeric escape followed by a digit
                if chars.peek().is_some_and(char::is_ascii_digit) {
                    out.push_str("\\&");
                }
            }
            c => out.push(c),
        }
    }
    out
}

fn render_expr(expr: &Expr, fresh: &mut usize) -> String {
    match expr {
        Expr::Var(name) => name.clone(),
        Expr::Lit(value) => literal(value),
        Expr::Tuple(items) => format!(
            "({})",
            items
                .iter()
                .map(|item| render_expr(item, fresh))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Expr::Lambda { param, body } => format!("(\\{param} -> {})", render_expr(body, fresh)),
        Expr::Call { func, arity, args } => {
            let supplied: Vec<String> = args
                .iter()
                .map_while(|arg| arg.as_ref().map(|arg| render_expr(arg, fresh)))
                .collect();
            if supplied.len() == args.len() {
                return application(func, *arity, &supplied);
            }

            let mut params = Vec::new();
            let mut filled = Vec::with_capacity(*arity);
            for index in 0..*arity {
                match args.get(index) {
                    Some(Some(arg)) => filled.push(render_expr(arg, fresh)),
                    _ => {
                        let param = format!("p{fresh}");
                        *fresh += 1;
                        filled.push(param.clone());
                        params.push(param);
                    }
                }
            }
            format!(
                "(\\{} -> {})",
                params.join(" "),
                application(func, *arity, &filled)
            )
        }
    }
}

/// `func` applied to a prefix of its arguments; operators go infix when
/// saturated.
fn application(func: &str, arity: usize, args: &[String]) -> String {
    let head = function_name(func, false);
    match args {
        [] => head,
        [a, b] if arity == 2 && is_operator(func) => format!("({a} {func} {b})"),
        args => format!("({head} {})", args.join(" ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types() {
        assert_eq!(hs_type(&Type::FLOAT), "Double");
        assert_eq!(hs_type(&Type::param("List", vec![Type::CHAR])), "[Char]");
        assert_eq!(
            hs_type(&Type::func(Type::func(Type::INT, Type::INT), Type::BOOL)),
            "(Int -> Int) -> Bool"
        );
        assert_eq!(
            hs_type(&Type::param("IO", vec![Type::param("Maybe", vec![Type::INT])])),
            "IO (Maybe Int)"
        );
    }

    #[test]
    fn test_calls() {
        let mut fresh = 0;
        let sum = Expr::call("+", vec![Expr::var("a"), Expr::Lit(Value::Int(-1))]);
        assert_eq!(render_expr(&sum, &mut fresh), "(a + (-1))");

        let partial = Expr::Call {
            func: "+".to_string(),
            arity: 2,
            args: vec![Some(Expr::var("a"))],
        };
        assert_eq!(render_expr(&partial, &mut fresh), "((+) a)");

        let section = Expr::Call {
            func: "div".to_string(),
            arity: 2,
            args: vec![None, Some(Expr::Lit(Value::Int(2)))],
        };
        assert_eq!(render_expr(&section, &mut fresh), "(\\p0 -> (div p0 2))");
        assert_eq!(literal(&Value::Char('\'')), "'\\''");
        assert_eq!(
            literal(&Value::Str("\u{1}2\u{1}a".to_string())),
            "\"\\1\\&2\\1a\""
        );
    }
}
