use crate::dispatch::Registry;
use crate::error::Error;
use crate::expr::Expr;
use crate::exprs::CoreIr;
use crate::ir::Args;

use super::{cross3, dot3, norm3, scalar_value, vector_values};

const ZERO: [f64; 3] = [0.0; 3];

fn basis_index(v: [f64; 3]) -> Option<i64> {
    if v == [1.0, 0.0, 0.0] {
        Some(0)
    } else if v == [0.0, 1.0, 0.0] {
        Some(1)
    } else if v == [0.0, 0.0, 1.0] {
        Some(2)
    } else {
        None
    }
}

pub(super) fn register(registry: &mut Registry<Expr>, core: &CoreIr) {
    let c = core.clone();
    registry.register(&core.math.vector_component, move |ctx, expr| {
        let value = ctx.get(expr.node(0))?;
        if let Some(index @ 0..=2) = expr.value(1).as_int() {
            if let Some(v) = vector_values(&c, &value) {
                return c.scalar_const(v[index as usize]);
            }
            if value.kind() == &c.math.vector_from_scalar {
                return Ok(value.node(index as usize).clone());
            }
        }
        c.build(
            expr.kind(),
            Args::new().arg(value).arg(expr.value(1).clone()),
        )
    });

    let c = core.clone();
    registry.register(&core.math.vector_from_scalar, move |ctx, expr| {
        let x = ctx.get(expr.node(0))?;
        let y = ctx.get(expr.node(1))?;
        let z = ctx.get(expr.node(2))?;
        if let (Some(a), Some(b), Some(d)) = (
            scalar_value(&c, &x),
            scalar_value(&c, &y),
            scalar_value(&c, &z),
        ) {
            return c.vector(a, b, d);
        }
        // (v.x, v.y, v.z) recomposes v.
        let component = &c.math.vector_component;
        if x.kind() == component && y.kind() == component && z.kind() == component {
            let source = x.node(0);
            if source == y.node(0)
                && source == z.node(0)
                && x.value(1).as_int() == Some(0)
                && y.value(1).as_int() == Some(1)
                && z.value(1).as_int() == Some(2)
            {
                return Ok(source.clone());
            }
        }
        c.build_positional(expr.kind(), [x, y, z])
    });

    let c = core.clone();
    registry.register(&core.math.vector_add, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (lv, rv) = (vector_values(&c, &left), vector_values(&c, &right));
        if let (Some(a), Some(b)) = (lv, rv) {
            return c.vector(a[0] + b[0], a[1] + b[1], a[2] + b[2]);
        }
        if lv == Some(ZERO) {
            return Ok(right);
        }
        if rv == Some(ZERO) {
            return Ok(left);
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.vector_subtract, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        if let (Some(a), Some(b)) = (vector_values(&c, &left), vector_values(&c, &right)) {
            return c.vector(a[0] - b[0], a[1] - b[1], a[2] - b[2]);
        }
        if vector_values(&c, &right) == Some(ZERO) {
            return Ok(left);
        }
        if left == right {
            return c.vector(0.0, 0.0, 0.0);
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.vector_multiply, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (lv, sv) = (vector_values(&c, &left), scalar_value(&c, &right));
        if let (Some(a), Some(s)) = (lv, sv) {
            return c.vector(a[0] * s, a[1] * s, a[2] * s);
        }
        if lv == Some(ZERO) {
            return Ok(left);
        }
        if sv == Some(0.0) {
            return c.vector(0.0, 0.0, 0.0);
        }
        if sv == Some(1.0) {
            return Ok(left);
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.vector_divide, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (lv, sv) = (vector_values(&c, &left), scalar_value(&c, &right));
        if sv == Some(0.0) {
            return Err(Error::DivisionByZero);
        }
        if let (Some(a), Some(s)) = (lv, sv) {
            return c.vector(a[0] / s, a[1] / s, a[2] / s);
        }
        if sv == Some(1.0) {
            return Ok(left);
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.vector_dot, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (lv, rv) = (vector_values(&c, &left), vector_values(&c, &right));
        if let (Some(a), Some(b)) = (lv, rv) {
            return c.scalar_const(dot3(a, b));
        }
        if lv == Some(ZERO) || rv == Some(ZERO) {
            return c.scalar_const(0.0);
        }
        // Dotting against a basis vector reads a single component.
        if let Some(index) = rv.and_then(basis_index) {
            return c.component(&left, index);
        }
        if let Some(index) = lv.and_then(basis_index) {
            return c.component(&right, index);
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.vector_cross, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        if left == right {
            return c.vector(0.0, 0.0, 0.0);
        }
        if let (Some(a), Some(b)) = (vector_values(&c, &left), vector_values(&c, &right)) {
            let v = cross3(a, b);
            return c.vector(v[0], v[1], v[2]);
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.vector_length, move |ctx, expr| {
        let value = ctx.get(expr.node(0))?;
        if let Some(v) = vector_values(&c, &value) {
            return c.scalar_const(norm3(v));
        }
        if value.kind() == &c.math.vector_normalize {
            return c.scalar_const(1.0);
        }
        c.build_positional(expr.kind(), [value])
    });

    let c = core.clone();
    registry.register(&core.math.vector_normalize, move |ctx, expr| {
        let value = ctx.get(expr.node(0))?;
        if value.kind() == &c.math.vector_normalize {
            return Ok(value);
        }
        if let Some(v) = vector_values(&c, &value) {
            let length = norm3(v);
            if length == 0.0 {
                return Err(Error::DivisionByZero);
            }
            return c.vector(v[0] / length, v[1] / length, v[2] / length);
        }
        c.build_positional(expr.kind(), [value])
    });
}
