//! C++17 renderer: one function per plan, one local per node, nested
//! `if`/`else if`/`else` chains, `return` at sinks.

use crate::graph::Pattern;
use crate::morphism::{Value, is_operator};
use crate::types::{Atom, Type};

use super::Backend;
use super::plan::{BranchLabel, Body, Expr, FunctionPlan, ProgramPlan, Step};
use super::writer::CodeWriter;

const PRELUDE: &str = r#"#include <functional>
#include <iostream>
#include <string>
#include <tuple>
#include <variant>
#include <vector>

namespace morph {

template <typename T> void show(std::ostream &out, const T &value) { out << value; }
inline void show(std::ostream &out, bool value) { out << (value ? "True" : "False"); }
inline void show(std::ostream &out, std::monostate) { out << "()"; }
inline void put(std::ostream &out, char32_t c) {
  if (c < 0x80) {
    out << char(c);
  } else if (c < 0x800) {
    out << char(0xC0 | (c >> 6)) << char(0x80 | (c & 0x3F));
  } else if (c < 0x10000) {
    out << char(0xE0 | (c >> 12)) << char(0x80 | ((c >> 6) & 0x3F)) << char(0x80 | (c & 0x3F));
  } else {
    out << char(0xF0 | (c >> 18)) << char(0x80 | ((c >> 12) & 0x3F))
        << char(0x80 | ((c >> 6) & 0x3F)) << char(0x80 | (c & 0x3F));
  }
}
inline void show(std::ostream &out, char32_t value) { out << '\''; put(out, value); out << '\''; }
inline void show(std::ostream &out, const std::string &value) { out << '"' << value << '"'; }

template <typename... Ts> void show(std::ostream &out, const std::tuple<Ts...> &value) {
  out << '(';
  std::size_t index = 0;
  std::apply([&](const auto &...items) { ((out << (index++ ? "," : ""), show(out, items)), ...); },
             value);
  out << ')';
}

} // namespace morph
"#;

#[derive(Debug, Clone, Default)]
pub struct CppBackend;

impl Backend for CppBackend {
    fn name(&self) -> &'static str {
        "cpp"
    }

    fn extension(&self) -> &'static str {
        "cpp"
    }

    fn build_command(&self) -> &'static str {
        "g++ -std=c++17 -O1 -o {output} {input}"
    }

    fn render(&self, plan: &ProgramPlan) -> String {
        let mut out = CodeWriter::new();
        out.raw(PRELUDE);
        for library in &plan.libraries {
            out.line(&format!("#include <{library}>"));
        }
        out.blank();

        for function in &plan.functions {
            out.line(&format!("{};", signature(function)));
        }
        out.blank();

        for function in &plan.functions {
            render_function(function, &mut out);
            out.blank();
        }

        if plan.main().is_some() {
            out.line("int main() {");
            out.indent();
            out.line(&format!("morph::show(std::cout, {}());", function_name("main", true)));
            out.line("std::cout << std::endl;");
            out.line("return 0;");
            out.dedent();
            out.line("}");
        }
        out.finish()
    }
}

fn function_name(name: &str, is_main: bool) -> String {
    if is_main {
        "morph_main".to_string()
    } else {
        identifier(name)
    }
}

fn signature(function: &FunctionPlan) -> String {
    let name = function_name(&function.name, function.is_main());
    let result = cpp_type(&function.result_type);
    match &function.param {
        Some(param) => format!("{result} {name}({} {param})", cpp_type(&function.param_type)),
        None => format!("{result} {name}()"),
    }
}

fn render_function(function: &FunctionPlan, out: &mut CodeWriter) {
    out.line(&format!("{} {{", signature(function)));
    out.indent();
    let mut fresh = 0;
    render_body(&function.body, out, &mut fresh);
    out.dedent();
    out.line("}");
}

fn render_body(body: &Body, out: &mut CodeWriter, fresh: &mut usize) {
    for step in &body.definitions {
        match step {
            Step::Bind { var, ty, expr } => {
                let ty = if ty.is_ground() && !ty.is_function() {
                    cpp_type(ty)
                } else {
                    "auto".to_string()
                };
                out.line(&format!("{ty} {var} = {};", render_expr(expr, fresh)));
            }
            Step::Unpack { tuple, vars, .. } => {
                out.line(&format!("auto [{}] = {tuple};", vars.join(", ")));
            }
            Step::Return(expr) => out.line(&format!("return {};", render_expr(expr, fresh))),
        }
    }

    let last = body.branches.len().saturating_sub(1);
    for (index, (label, block)) in body.branches.iter().enumerate() {
        let test = condition(label, fresh);
        let head = match index {
            0 if last == 0 && label.is_irrefutable() => "{".to_string(),
            0 => format!("if ({test}) {{"),
            _ if index == last && label.is_irrefutable() => "} else {".to_string(),
            _ => format!("}} else if ({test}) {{"),
        };
        out.line(&head);
        out.indent();
        render_body(block, out, fresh);
        out.dedent();
    }
    if !body.branches.is_empty() {
        out.line("}");
    }
}

fn condition(label: &BranchLabel, fresh: &mut usize) -> String {
    match label {
        BranchLabel::Otherwise => "true".to_string(),
        BranchLabel::Guard(expr) => render_expr(expr, fresh),
        BranchLabel::Pattern { subject, pattern, .. } => {
            let mut tests = Vec::new();
            pattern_tests(subject, pattern, &mut tests);
            if tests.is_empty() {
                "true".to_string()
            } else {
                tests.join(" && ")
            }
        }
    }
}

fn pattern_tests(subject: &str, pattern: &Pattern, tests: &mut Vec<String>) {
    match pattern {
        Pattern::Any | Pattern::Value(Value::Unit) => {}
        Pattern::Value(value) => tests.push(format!("{subject} == {}", literal(value))),
        Pattern::Tuple(items) => {
            for (index, item) in items.iter().enumerate() {
                pattern_tests(&format!("std::get<{index}>({subject})"), item, tests);
            }
        }
    }
}

pub(crate) fn cpp_type(ty: &Type) -> String {
    match ty {
        Type::Atom(Atom::Int) => "long".to_string(),
        Type::Atom(Atom::Char) => "char32_t".to_string(),
        Type::Atom(Atom::Bool) => "bool".to_string(),
        Type::Atom(Atom::Float) => "double".to_string(),
        Type::Atom(_) => "std::monostate".to_string(),
        Type::Tuple(items) => format!(
            "std::tuple<{}>",
            items.iter().map(cpp_type).collect::<Vec<_>>().join(", ")
        ),
        Type::Param { name, args } => match (name.as_str(), args.as_slice()) {
            ("String", []) => "std::string".to_string(),
            ("List", [item]) => format!("std::vector<{}>", cpp_type(item)),
            (_, []) => identifier(name),
            (_, args) => format!(
                "{}<{}>",
                identifier(name),
                args.iter().map(cpp_type).collect::<Vec<_>>().join(", ")
            ),
        },
        Type::Var(_) => "auto".to_string(),
        Type::Func(arg, result) => {
            format!("std::function<{}({})>", cpp_type(result), cpp_type(arg))
        }
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::Int(i) if *i < 0 => format!("({i})"),
        Value::Int(i) => i.to_string(),
        Value::Float(x) if *x < 0.0 => format!("({x:?})"),
        Value::Float(x) => format!("{x:?}"),
        Value::Char(c) => format!("U'{}'", char_body(*c)),
        Value::Bool(b) => b.to_string(),
        Value::Str(s) => format!("std::string(\"{}\")", escape(s, '"')),
        Value::Unit => "std::monostate{}".to_string(),
    }
}

fn escape(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii_graphic() || c == ' ' => out.push(c),
            // octal escapes stop after three digits, unlike `\x`
            c => {
                let mut bytes = [0u8; 4];
                for byte in c.encode_utf8(&mut bytes).bytes() {
                    out.push_str(&format!("\\{byte:03o}"));
                }
            }
        }
    }
    out
}

/// Body of a `char32_t` literal; `\U` always takes eight digits.
fn char_body(c: char) -> String {
    match c {
        '\\' | '\'' => format!("\\{c}"),
        c if c.is_ascii_graphic() || c == ' ' => c.to_string(),
        c => format!("\\U{:08x}", c as u32),
    }
}

/// Operator names become `op_` plus their code points.
fn identifier(name: &str) -> String {
    if !is_operator(name) {
        return name.replace('\'', "_");
    }
    let codes: Vec<String> = name.chars().map(|c| format!("{:x}", c as u32)).collect();
    format!("op_{}", codes.join("_"))
}

fn render_expr(expr: &Expr, fresh: &mut usize) -> String {
    match expr {
        Expr::Var(name) => name.clone(),
        Expr::Lit(value) => literal(value),
        Expr::Tuple(items) => format!(
            "std::make_tuple({})",
            items
                .iter()
                .map(|item| render_expr(item, fresh))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Expr::Lambda { param, body } => {
            format!("[=](auto {param}) {{ return {}; }}", render_expr(body, fresh))
        }
        Expr::Call { func, arity, args } => {
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
            let call = apply(func, &filled);
            params.iter().rev().fold(call, |body, param| {
                format!("[=](auto {param}) {{ return {body}; }}")
            })
        }
    }
}

/// A saturated call with its arguments already rendered.
fn apply(func: &str, args: &[String]) -> String {
    match (func, args) {
        ("/=", [a, b]) => format!("({a} != {b})"),
        ("div", [a, b]) => format!("({a} / {b})"),
        ("mod", [a, b]) => format!("({a} % {b})"),
        ("not", [a]) => format!("(!{a})"),
        ("negate", [a]) => format!("(-{a})"),
        ("fst", [a]) => format!("std::get<0>({a})"),
        ("snd", [a]) => format!("std::get<1>({a})"),
        ("id", [a]) => a.clone(),
        (op, [a, b]) if is_operator(op) && is_builtin_operator(op) => format!("({a} {op} {b})"),
        (name, args) => format!("{}({})", identifier(name), args.join(", ")),
    }
}

fn is_builtin_operator(op: &str) -> bool {
    matches!(
        op,
        "+" | "-" | "*" | "/" | "<" | "<=" | ">" | ">=" | "==" | "&&" | "||"
    )
}
