//! Constant folding over the core vocabulary.
//!
//! The registry pairs algebraic handlers with a rebuild-from-children
//! handler on the root kind, so unknown kinds pass through untouched
//! while everything foldable collapses to constants.

mod math;
mod matrix;
mod transform;
mod vector;

use std::rc::Rc;

use crate::dispatch::{Context, Registry};
use crate::error::Error;
use crate::expr::Expr;
use crate::exprs::CoreIr;
use crate::ir::Args;
use crate::value::Value;

/// Builds the constant-folding registry for the core vocabulary.
pub fn registry(core: &CoreIr) -> Rc<Registry<Expr>> {
    let mut registry = Registry::new(Rc::clone(core.ir()));

    let c = core.clone();
    registry.register(&core.math.expression, move |ctx, expr| {
        rebuild(&c, ctx, expr)
    });

    math::register(&mut registry, core);
    vector::register(&mut registry, core);
    matrix::register(&mut registry, core);
    transform::register(&mut registry, core);
    Rc::new(registry)
}

/// A fresh folding context over [`registry`].
pub fn context(core: &CoreIr) -> Context<Expr> {
    registry(core).context()
}

/// Rebuilds a node from its resolved children; the handler of last
/// resort for kinds without algebraic rules.
pub(crate) fn rebuild(core: &CoreIr, ctx: &mut Context<Expr>, expr: &Expr) -> Result<Expr, Error> {
    let mut args = Args::new();
    for value in expr.values() {
        args = match value {
            Value::Node(node) => args.arg(ctx.get(node)?),
            other => args.arg(other.clone()),
        };
    }
    core.build(expr.kind(), args)
}

pub(crate) fn scalar_value(core: &CoreIr, expr: &Expr) -> Option<f64> {
    if expr.kind() == &core.math.scalar_constant {
        expr.value(0).as_number().map(|n| n.value())
    } else {
        None
    }
}

pub(crate) fn int_value(core: &CoreIr, expr: &Expr) -> Option<i64> {
    if expr.kind() == &core.math.integer_constant {
        expr.value(0).as_int()
    } else {
        None
    }
}

pub(crate) fn bool_value(core: &CoreIr, expr: &Expr) -> Option<bool> {
    if expr.kind() == &core.math.boolean_constant {
        expr.value(0).as_bool()
    } else {
        None
    }
}

pub(crate) fn vector_values(core: &CoreIr, expr: &Expr) -> Option<[f64; 3]> {
    if expr.kind() != &core.math.vector_constant {
        return None;
    }
    let component = |index: usize| expr.value(index).as_number().map(|n| n.value());
    Some([component(0)?, component(1)?, component(2)?])
}

pub(crate) fn matrix_values(core: &CoreIr, expr: &Expr) -> Option<[f64; 16]> {
    if expr.kind() != &core.math.matrix_constant {
        return None;
    }
    let mut values = [0.0; 16];
    for (index, slot) in values.iter_mut().enumerate() {
        *slot = expr.value(index).as_number()?.value();
    }
    Some(values)
}

pub(crate) fn dot3(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn sub3(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn scale3(a: [f64; 3], factor: f64) -> [f64; 3] {
    [a[0] * factor, a[1] * factor, a[2] * factor]
}

pub(crate) fn norm3(a: [f64; 3]) -> f64 {
    dot3(a, a).sqrt()
}

pub(crate) fn cross3(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}
