//! Graph walk: program → [`ProgramPlan`].
//!
//! Each function is walked breadth first from its roots. A node is visited
//! once every incoming arrow has been followed; nodes with more than one pin
//! wait in a second queue so a fork is opened only when no straight-line
//! work is left.
//!
//! ```text
//!   root ──> normal queue ──visit──> follow arrows ──> ready? ──> normal
//!                 │                                        │
//!                 └── empty: pop one ── branch queue <─────┘ (pins > 1)
//! ```
//!
//! Every arrow defines its target's variable under the condition of the pin
//! it leaves; the scope builder decides which blocks receive the definition.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use tracing::{debug, info};

use crate::condition::Condition;
use crate::graph::{ArrowId, Brancher, NodeId, Pattern, Program};
use crate::morphism::{Morphism, MorphismKind, Value};
use crate::scope::ScopeBuilder;
use crate::types::{Mapping, MatchError, Type, match_types};

use super::TranslateError;
use super::plan::{BranchLabel, Expr, FunctionPlan, ProgramPlan, Step, component_var, node_var};

pub const MAIN: &str = "main";

/// A function before walking: its roots and every node they reach.
#[derive(Debug)]
struct Seed {
    name: String,
    roots: Vec<NodeId>,
    param: Option<NodeId>,
}

pub fn plan_program(program: &Program) -> Result<ProgramPlan, TranslateError> {
    let seeds = partition(program)?;
    let functions = seeds
        .iter()
        .map(|seed| Walker::new(program, seed).run())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ProgramPlan {
        functions,
        ..ProgramPlan::default()
    })
}

/// One function per named root, one `main` for the unnamed ones.
fn partition(program: &Program) -> Result<Vec<Seed>, TranslateError> {
    let mut seeds = Vec::new();
    let mut main_roots = Vec::new();
    for root in program.roots() {
        let node = program.node(root);
        match &node.name {
            Some(name) => seeds.push(Seed {
                name: name.clone(),
                roots: vec![root],
                param: Some(root),
            }),
            None if node.ty == Type::SINGLETON => main_roots.push(root),
            None => {
                return Err(TranslateError::MainInput {
                    node: root,
                    found: node.ty.clone(),
                });
            }
        }
    }
    if !main_roots.is_empty() {
        seeds.push(Seed {
            name: MAIN.to_string(),
            roots: main_roots,
            param: None,
        });
    }

    let mut owner: HashMap<NodeId, usize> = HashMap::new();
    for (index, seed) in seeds.iter().enumerate() {
        let mut queue: VecDeque<NodeId> = seed.roots.iter().copied().collect();
        let mut seen = BTreeSet::new();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(other) = owner.insert(id, index) {
                if other != index {
                    return Err(TranslateError::SharedNode {
                        node: id,
                        first: seeds[other].name.clone(),
                        second: seed.name.clone(),
                    });
                }
            }
            queue.extend(program.outgoing(id).map(|arrow| program.arrow(arrow).target));
        }
    }
    Ok(seeds)
}

struct Walker<'p> {
    program: &'p Program,
    seed: &'p Seed,
    builder: ScopeBuilder<Step, BranchLabel>,
    normal: VecDeque<NodeId>,
    branch: VecDeque<NodeId>,
    remaining: HashMap<NodeId, usize>,
    /// Arrows followed into each node, with their source-pin condition.
    arrived: HashMap<NodeId, Vec<(ArrowId, Condition)>>,
    conditions: HashMap<NodeId, Condition>,
    result_type: Option<Type>,
}

impl<'p> Walker<'p> {
    fn new(program: &'p Program, seed: &'p Seed) -> Self {
        Walker {
            program,
            seed,
            builder: ScopeBuilder::new(),
            normal: VecDeque::new(),
            branch: VecDeque::new(),
            remaining: HashMap::new(),
            arrived: HashMap::new(),
            conditions: HashMap::new(),
            result_type: None,
        }
    }

    fn run(mut self) -> Result<FunctionPlan, TranslateError> {
        let truth = Condition::truth();
        let seed = self.seed;
        for root in &seed.roots {
            let var = node_var(root.0);
            let ty = self.program.node(*root).ty.clone();
            if seed.param.is_none() {
                self.builder.add_definition(
                    &truth,
                    Step::Bind {
                        var,
                        ty: ty.clone(),
                        expr: Expr::Lit(Value::Unit),
                    },
                );
            } else {
                self.unpack(*root, &truth);
            }
            self.conditions.insert(*root, truth.clone());
            self.enqueue(*root);
        }

        while let Some(id) = self.normal.pop_front().or_else(|| self.branch.pop_front()) {
            self.visit(id)?;
        }

        let body = self
            .builder
            .extract()
            .map_err(|source| TranslateError::Scope {
                function: self.seed.name.clone(),
                source,
            })?;
        let (param, param_type) = match self.seed.param {
            Some(root) => (Some(node_var(root.0)), self.program.node(root).ty.clone()),
            None => (None, Type::SINGLETON),
        };
        let result_type = self.result_type.unwrap_or(Type::SINGLETON);
        info!(function = self.seed.name.as_str(), result = %result_type, "planned function");
        Ok(FunctionPlan {
            name: self.seed.name.clone(),
            param,
            param_type,
            result_type,
            body,
        })
    }

    fn enqueue(&mut self, id: NodeId) {
        if self.program.node(id).is_branching() {
            self.branch.push_back(id);
        } else {
            self.normal.push_back(id);
        }
    }

    fn visit(&mut self, id: NodeId) -> Result<(), TranslateError> {
        let node = self.program.node(id);
        let condition = self.conditions.get(&id).cloned().unwrap_or_default();
        debug!(node = %id, condition = %condition, "visiting node");

        if node.is_sink() {
            return self.sink(id, &condition);
        }

        let pin_conditions = if node.is_branching() {
            let mut labels = Vec::with_capacity(node.pins.len());
            for (index, pin) in node.pins.iter().enumerate() {
                if pin.arrows.is_empty() {
                    return Err(TranslateError::DanglingPin { node: id, pin: index });
                }
                labels.push(self.label(id, &pin.brancher)?);
            }
            let last_open = node
                .pins
                .last()
                .is_some_and(|pin| pin.brancher.is_irrefutable());
            if !last_open {
                return Err(TranslateError::NonExhaustive { node: id });
            }
            self.builder.add_branches(&condition, labels)
        } else {
            vec![condition.clone(); node.pins.len()]
        };

        for (pin, pin_condition) in node.pins.iter().zip(&pin_conditions) {
            for arrow in &pin.arrows {
                self.follow(*arrow, pin_condition)?;
            }
        }
        Ok(())
    }

    fn sink(&mut self, id: NodeId, condition: &Condition) -> Result<(), TranslateError> {
        let ty = &self.program.node(id).ty;
        match &self.result_type {
            Some(found) if found != ty => {
                return Err(TranslateError::TypeDeduction {
                    context: format!("result of `{}` at {id}", self.seed.name),
                    source: MatchError::Mismatch {
                        pattern: found.clone(),
                        concrete: ty.clone(),
                    },
                });
            }
            Some(_) => {}
            None => self.result_type = Some(ty.clone()),
        }
        let placed = self
            .builder
            .add_definition(condition, Step::Return(Expr::var(node_var(id.0))));
        if placed == 0 {
            return Err(TranslateError::Orphan { node: id });
        }
        self.builder.close_scope(condition);
        Ok(())
    }

    fn label(&self, id: NodeId, brancher: &Brancher) -> Result<BranchLabel, TranslateError> {
        let ty = &self.program.node(id).ty;
        match brancher {
            Brancher::Any => Ok(BranchLabel::Otherwise),
            Brancher::Pattern(pattern) => {
                check_pattern(id, pattern, ty)?;
                Ok(BranchLabel::Pattern {
                    subject: node_var(id.0),
                    pattern: pattern.clone(),
                    ty: ty.clone(),
                })
            }
            Brancher::Guard(guard) => {
                let context = || format!("guard `{guard}` on {id}");
                let (expr, out) = apply(guard, &node_var(id.0), ty).map_err(|source| {
                    TranslateError::TypeDeduction {
                        context: context(),
                        source,
                    }
                })?;
                match_types(&out, &Type::BOOL).map_err(|source| {
                    TranslateError::TypeDeduction {
                        context: context(),
                        source,
                    }
                })?;
                Ok(BranchLabel::Guard(expr))
            }
        }
    }

    fn follow(&mut self, id: ArrowId, condition: &Condition) -> Result<(), TranslateError> {
        let arrow = self.program.arrow(id);
        let target = arrow.target;
        debug!(arrow = %id, target = %target, text = arrow.text.as_str(), "following arrow");

        if !arrow.is_positional() {
            let ambiguous = self.arrived.get(&target).is_some_and(|earlier| {
                earlier
                    .iter()
                    .any(|(_, other)| other.does_imply(condition) || condition.does_imply(other))
            });
            if ambiguous {
                return Err(TranslateError::AmbiguousJoin { node: target });
            }

            let expr = self.arrow_expr(id)?;
            let ty = self.program.node(target).ty.clone();
            self.define(target, condition, expr, ty)?;
        }

        self.arrived
            .entry(target)
            .or_default()
            .push((id, condition.clone()));
        let program = self.program;
        let remaining = self
            .remaining
            .entry(target)
            .or_insert_with(|| program.node(target).incoming.len());
        *remaining -= 1;
        if *remaining == 0 {
            self.ready(target)?;
        }
        Ok(())
    }

    /// All inputs of `id` are in: settle its path condition and, for an
    /// intersection, build the tuple.
    fn ready(&mut self, id: NodeId) -> Result<(), TranslateError> {
        let arrivals = self.arrived.remove(&id).unwrap_or_default();
        let positional = arrivals
            .iter()
            .any(|(arrow, _)| self.program.arrow(*arrow).is_positional());

        let condition = if positional {
            let condition = arrivals
                .iter()
                .fold(Condition::truth(), |acc, (_, c)| acc.and(c));
            let tuple = self.intersection(id, &arrivals)?;
            let ty = self.program.node(id).ty.clone();
            self.define(id, &condition, tuple, ty)?;
            condition
        } else {
            let mut conditions = arrivals.iter().map(|(_, c)| c.clone());
            let first = conditions.next().unwrap_or_default();
            conditions.fold(first, |acc, c| acc.or(&c))
        };

        self.conditions.insert(id, condition);
        self.enqueue(id);
        Ok(())
    }

    fn intersection(
        &self,
        id: NodeId,
        arrivals: &[(ArrowId, Condition)],
    ) -> Result<Expr, TranslateError> {
        let components = self.program.node(id).ty.components();
        let mut slots: BTreeMap<usize, Expr> = BTreeMap::new();
        for (arrow_id, _) in arrivals {
            let arrow = self.program.arrow(*arrow_id);
            let Some(Some(slot)) = arrow.morphism.slot() else {
                continue;
            };
            let source = self.program.node(arrow.source.node);
            let expected = components.get(slot).cloned().unwrap_or(Type::SINGLETON);
            match_types(&expected, &source.ty).map_err(|source| {
                TranslateError::TypeDeduction {
                    context: format!("`{}` into {id}", arrow.text),
                    source,
                }
            })?;
            slots.insert(slot, Expr::var(node_var(arrow.source.node.0)));
        }
        Ok(Expr::Tuple(slots.into_values().collect()))
    }

    fn arrow_expr(&self, id: ArrowId) -> Result<Expr, TranslateError> {
        let arrow = self.program.arrow(id);
        let source = self.program.node(arrow.source.node);
        let target = self.program.node(arrow.target);
        let context = || format!("`{}` from {} to {}", arrow.text, arrow.source.node, arrow.target);

        let (expr, out) =
            apply(&arrow.morphism, &node_var(arrow.source.node.0), &source.ty).map_err(
                |source| TranslateError::TypeDeduction {
                    context: context(),
                    source,
                },
            )?;
        match_types(&out, &target.ty).map_err(|source| TranslateError::TypeDeduction {
            context: context(),
            source,
        })?;
        Ok(expr)
    }

    fn define(
        &mut self,
        id: NodeId,
        condition: &Condition,
        expr: Expr,
        ty: Type,
    ) -> Result<(), TranslateError> {
        let var = node_var(id.0);
        let placed = self.builder.add_definition(condition, Step::Bind { var, ty, expr });
        if placed == 0 {
            return Err(TranslateError::Orphan { node: id });
        }
        self.unpack(id, condition);
        Ok(())
    }

    /// Tuple-typed nodes also name their components.
    fn unpack(&mut self, id: NodeId, condition: &Condition) {
        let ty = &self.program.node(id).ty;
        if let Type::Tuple(items) = ty {
            let tuple = node_var(id.0);
            let vars = (0..items.len()).map(|k| component_var(&tuple, k)).collect();
            self.builder.add_definition(
                condition,
                Step::Unpack {
                    tuple,
                    vars,
                    ty: ty.clone(),
                },
            );
        }
    }
}

fn check_pattern(id: NodeId, pattern: &Pattern, ty: &Type) -> Result<(), TranslateError> {
    match pattern {
        Pattern::Any => Ok(()),
        Pattern::Value(value) => {
            match_types(ty, &value.ty()).map_err(|source| TranslateError::TypeDeduction {
                context: format!("pattern `{pattern}` on {id}"),
                source,
            })?;
            Ok(())
        }
        Pattern::Tuple(items) => {
            let Type::Tuple(components) = ty else {
                return Err(TranslateError::BrancherArity {
                    node: id,
                    expected: 1,
                    found: items.len(),
                });
            };
            if components.len() != items.len() {
                return Err(TranslateError::BrancherArity {
                    node: id,
                    expected: components.len(),
                    found: items.len(),
                });
            }
            for (item, component) in items.iter().zip(components) {
                check_pattern(id, item, component)?;
            }
            Ok(())
        }
    }
}

/// Apply `morphism` to the value in `var` of type `ty`. Returns the
/// expression and the type it produces.
///
/// A morphism with several parameters fed a tuple of the same arity takes
/// the components as separate arguments.
pub(crate) fn apply(morphism: &Morphism, var: &str, ty: &Type) -> Result<(Expr, Type), MatchError> {
    if morphism.param_count() == 0 {
        return Ok((value_expr(morphism), morphism.result().clone()));
    }
    if let MorphismKind::Position(_) = morphism.kind() {
        return Ok((Expr::var(var), ty.clone()));
    }

    let params = morphism.params();
    if let Some((mapping, args)) = spread(params, var, ty) {
        let rest = Type::curried(&params[args.len()..], morphism.result().clone());
        return Ok((call_expr(morphism, args), mapping.apply(&rest)));
    }

    let mapping = match_types(&params[0], ty)?;
    let out = mapping.apply(&morphism.target());
    Ok((call_expr(morphism, vec![Expr::var(var)]), out))
}

fn spread(params: &[Type], var: &str, ty: &Type) -> Option<(Mapping, Vec<Expr>)> {
    let Type::Tuple(components) = ty else {
        return None;
    };
    if params.len() < 2 || params.len() != components.len() {
        return None;
    }
    let mut mapping = Mapping::empty();
    for (param, component) in params.iter().zip(components) {
        mapping = match_types(param, component)
            .and_then(|found| mapping.merge(found))
            .ok()?;
    }
    let args = (0..components.len())
        .map(|k| Expr::var(component_var(var, k)))
        .collect();
    Some((mapping, args))
}

/// `morphism` used as a value: literals as themselves, anything with open
/// parameters as a partial call.
fn value_expr(morphism: &Morphism) -> Expr {
    match morphism.kind() {
        MorphismKind::Literal(value) => Expr::Lit(value.clone()),
        MorphismKind::Common { name } => Expr::Call {
            func: name.clone(),
            arity: morphism.param_count(),
            args: vec![None; morphism.param_count()],
        },
        MorphismKind::Position(_) => Expr::Call {
            func: "id".to_string(),
            arity: 1,
            args: vec![None],
        },
        MorphismKind::Tuple(parts) if morphism.param_count() == 0 => {
            Expr::Tuple(parts.iter().map(value_expr).collect())
        }
        MorphismKind::Tuple(_) => Expr::Lambda {
            param: "arg".to_string(),
            body: Box::new(call_expr(morphism, vec![Expr::var("arg")])),
        },
        MorphismKind::Binded { .. } => call_expr(morphism, Vec::new()),
    }
}

/// Fill the unbound parameters of `morphism` with `inputs`, in order;
/// parameters left over stay holes.
fn call_expr(morphism: &Morphism, inputs: Vec<Expr>) -> Expr {
    match morphism.kind() {
        MorphismKind::Common { name } => Expr::Call {
            func: name.clone(),
            arity: morphism.param_count(),
            args: inputs.into_iter().map(Some).collect(),
        },
        MorphismKind::Literal(value) => Expr::Lit(value.clone()),
        MorphismKind::Position(_) => inputs
            .into_iter()
            .next()
            .unwrap_or_else(|| value_expr(morphism)),
        MorphismKind::Tuple(parts) => Expr::Tuple(
            parts
                .iter()
                .map(|part| {
                    if part.param_count() == 0 {
                        value_expr(part)
                    } else {
                        call_expr(part, inputs.clone())
                    }
                })
                .collect(),
        ),
        MorphismKind::Binded { inner, bindings } => {
            let mut inputs = inputs.into_iter();
            let args: Vec<Option<Expr>> = (0..inner.param_count())
                .map(|index| match bindings.get(&index) {
                    Some(bound) => Some(value_expr(bound)),
                    None => inputs.next(),
                })
                .collect();
            match inner.kind() {
                MorphismKind::Common { name } => Expr::Call {
                    func: name.clone(),
                    arity: inner.param_count(),
                    args,
                },
                _ => {
                    let supplied: Vec<Expr> = args.into_iter().flatten().collect();
                    call_expr(inner, supplied)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cook::{SymbolTable, cook, parse_morphism};
    use crate::graph::RawGraph;

    use super::*;

    fn morphism(text: &str) -> Morphism {
        parse_morphism(text, &SymbolTable::prelude()).unwrap()
    }

    #[test]
    fn test_apply_section() {
        let (expr, out) = apply(&morphism("+ 1"), "v0", &Type::INT).unwrap();
        assert_eq!(out, Type::INT);
        assert_eq!(
            expr,
            Expr::Call {
                func: "+".to_string(),
                arity: 2,
                args: vec![Some(Expr::var("v0")), Some(Expr::Lit(Value::Int(1)))],
            }
        );
    }

    #[test]
    fn test_apply_spreads_tuples() {
        let ty = Type::tuple(vec![Type::INT, Type::INT]);
        let (expr, out) = apply(&morphism("+"), "v3", &ty).unwrap();
        assert_eq!(out, Type::INT);
        assert_eq!(
            expr,
            Expr::call("+", vec![Expr::var("v3_0"), Expr::var("v3_1")])
        );

        let (expr, out) = apply(&morphism("fst"), "v3", &ty).unwrap();
        assert_eq!(out, Type::INT);
        assert_eq!(expr, Expr::call("fst", vec![Expr::var("v3")]));
    }

    #[test]
    fn test_apply_leaves_partial_calls() {
        let (expr, out) = apply(&morphism("+"), "v0", &Type::INT).unwrap();
        assert_eq!(out, Type::func(Type::INT, Type::INT));
        assert_eq!(expr.missing(), 1);
        assert!(apply(&morphism("not"), "v0", &Type::INT).is_err());
    }

    #[test]
    fn test_main_requires_singleton_roots() {
        let mut raw = RawGraph::new();
        let a = raw.new_node("Int", None, &["_"], false);
        let b = raw.new_node("Int", None, &[], true);
        raw.connect(a, b, 0, "+ 1").unwrap();
        let program = cook(&raw, &SymbolTable::prelude()).unwrap();
        assert!(matches!(
            plan_program(&program),
            Err(TranslateError::MainInput { node, .. }) if node == NodeId(0)
        ));
    }

    #[test]
    fn test_shared_node() {
        let mut raw = RawGraph::new();
        let f = raw.new_node("Int", Some("f"), &["_"], false);
        let g = raw.new_node("Int", Some("g"), &["_"], false);
        let out = raw.new_node("Int", None, &[], true);
        raw.connect(f, out, 0, "$").unwrap();
        raw.connect(g, out, 0, "$").unwrap();
        let program = cook(&raw, &SymbolTable::prelude()).unwrap();
        assert!(matches!(
            plan_program(&program),
            Err(TranslateError::SharedNode { node, .. }) if node == NodeId(2)
        ));
    }
}
