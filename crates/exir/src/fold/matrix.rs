use crate::dispatch::Registry;
use crate::error::Error;
use crate::expr::Expr;
use crate::exprs::CoreIr;
use crate::ir::Args;

use super::{matrix_values, rebuild, scalar_value, vector_values};

pub(super) const IDENTITY: [f64; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

const ZERO: [f64; 16] = [0.0; 16];

pub(super) fn mat_mul(a: &[f64; 16], b: &[f64; 16]) -> [f64; 16] {
    let mut out = [0.0; 16];
    for row in 0..4 {
        for column in 0..4 {
            out[row * 4 + column] = (0..4)
                .map(|k| a[row * 4 + k] * b[k * 4 + column])
                .sum();
        }
    }
    out
}

/// Determinant of the upper 3x3 block.
pub(super) fn det3(m: &[f64; 16]) -> f64 {
    m[0] * (m[5] * m[10] - m[6] * m[9]) - m[1] * (m[4] * m[10] - m[6] * m[8])
        + m[2] * (m[4] * m[9] - m[5] * m[8])
}

/// Full 4x4 inverse by the adjugate; `None` when the matrix is singular.
fn invert(m: &[f64; 16]) -> Option<[f64; 16]> {
    let mut adj = [0.0; 16];
    adj[0] = m[5] * m[10] * m[15] - m[5] * m[11] * m[14] - m[9] * m[6] * m[15]
        + m[9] * m[7] * m[14]
        + m[13] * m[6] * m[11]
        - m[13] * m[7] * m[10];
    adj[4] = -m[4] * m[10] * m[15] + m[4] * m[11] * m[14] + m[8] * m[6] * m[15]
        - m[8] * m[7] * m[14]
        - m[12] * m[6] * m[11]
        + m[12] * m[7] * m[10];
    adj[8] = m[4] * m[9] * m[15] - m[4] * m[11] * m[13] - m[8] * m[5] * m[15]
        + m[8] * m[7] * m[13]
        + m[12] * m[5] * m[11]
        - m[12] * m[7] * m[9];
    adj[12] = -m[4] * m[9] * m[14] + m[4] * m[10] * m[13] + m[8] * m[5] * m[14]
        - m[8] * m[6] * m[13]
        - m[12] * m[5] * m[10]
        + m[12] * m[6] * m[9];
    adj[1] = -m[1] * m[10] * m[15] + m[1] * m[11] * m[14] + m[9] * m[2] * m[15]
        - m[9] * m[3] * m[14]
        - m[13] * m[2] * m[11]
        + m[13] * m[3] * m[10];
    adj[5] = m[0] * m[10] * m[15] - m[0] * m[11] * m[14] - m[8] * m[2] * m[15]
        + m[8] * m[3] * m[14]
        + m[12] * m[2] * m[11]
        - m[12] * m[3] * m[10];
    adj[9] = -m[0] * m[9] * m[15] + m[0] * m[11] * m[13] + m[8] * m[1] * m[15]
        - m[8] * m[3] * m[13]
        - m[12] * m[1] * m[11]
        + m[12] * m[3] * m[9];
    adj[13] = m[0] * m[9] * m[14] - m[0] * m[10] * m[13] - m[8] * m[1] * m[14]
        + m[8] * m[2] * m[13]
        + m[12] * m[1] * m[10]
        - m[12] * m[2] * m[9];
    adj[2] = m[1] * m[6] * m[15] - m[1] * m[7] * m[14] - m[5] * m[2] * m[15]
        + m[5] * m[3] * m[14]
        + m[13] * m[2] * m[7]
        - m[13] * m[3] * m[6];
    adj[6] = -m[0] * m[6] * m[15] + m[0] * m[7] * m[14] + m[4] * m[2] * m[15]
        - m[4] * m[3] * m[14]
        - m[12] * m[2] * m[7]
        + m[12] * m[3] * m[6];
    adj[10] = m[0] * m[5] * m[15] - m[0] * m[7] * m[13] - m[4] * m[1] * m[15]
        + m[4] * m[3] * m[13]
        + m[12] * m[1] * m[7]
        - m[12] * m[3] * m[5];
    adj[14] = -m[0] * m[5] * m[14] + m[0] * m[6] * m[13] + m[4] * m[1] * m[14]
        - m[4] * m[2] * m[13]
        - m[12] * m[1] * m[6]
        + m[12] * m[2] * m[5];
    adj[3] = -m[1] * m[6] * m[11] + m[1] * m[7] * m[10] + m[5] * m[2] * m[11]
        - m[5] * m[3] * m[10]
        - m[9] * m[2] * m[7]
        + m[9] * m[3] * m[6];
    adj[7] = m[0] * m[6] * m[11] - m[0] * m[7] * m[10] - m[4] * m[2] * m[11]
        + m[4] * m[3] * m[10]
        + m[8] * m[2] * m[7]
        - m[8] * m[3] * m[6];
    adj[11] = -m[0] * m[5] * m[11] + m[0] * m[7] * m[9] + m[4] * m[1] * m[11]
        - m[4] * m[3] * m[9]
        - m[8] * m[1] * m[7]
        + m[8] * m[3] * m[5];
    adj[15] = m[0] * m[5] * m[10] - m[0] * m[6] * m[9] - m[4] * m[1] * m[10]
        + m[4] * m[2] * m[9]
        + m[8] * m[1] * m[6]
        - m[8] * m[2] * m[5];

    let det = m[0] * adj[0] + m[1] * adj[4] + m[2] * adj[8] + m[3] * adj[12];
    if det == 0.0 {
        return None;
    }
    let mut out = [0.0; 16];
    for (slot, cofactor) in out.iter_mut().zip(adj.iter()) {
        *slot = cofactor / det;
    }
    Some(out)
}

pub(super) fn register(registry: &mut Registry<Expr>, core: &CoreIr) {
    let c = core.clone();
    registry.register(&core.math.matrix_component, move |ctx, expr| {
        let value = ctx.get(expr.node(0))?;
        if let (Some(row @ 0..=3), Some(column @ 0..=3)) =
            (expr.value(1).as_int(), expr.value(2).as_int())
        {
            let index = (row * 4 + column) as usize;
            if let Some(m) = matrix_values(&c, &value) {
                return c.scalar_const(m[index]);
            }
            if value.kind() == &c.math.matrix_from_scalar {
                return Ok(value.node(index).clone());
            }
        }
        c.build(
            expr.kind(),
            Args::new()
                .arg(value)
                .arg(expr.value(1).clone())
                .arg(expr.value(2).clone()),
        )
    });

    let c = core.clone();
    registry.register(&core.math.matrix_from_scalar, move |ctx, expr| {
        let mut values = [0.0; 16];
        let mut constant = true;
        for (index, slot) in values.iter_mut().enumerate() {
            match scalar_value(&c, &ctx.get(expr.node(index))?) {
                Some(v) => *slot = v,
                None => {
                    constant = false;
                    break;
                }
            }
        }
        if constant {
            return c.matrix(values);
        }
        rebuild(&c, ctx, expr)
    });

    let c = core.clone();
    registry.register(&core.math.matrix_add, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (lv, rv) = (matrix_values(&c, &left), matrix_values(&c, &right));
        if let (Some(a), Some(b)) = (lv, rv) {
            return c.matrix(std::array::from_fn(|i| a[i] + b[i]));
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
    registry.register(&core.math.matrix_subtract, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        if let (Some(a), Some(b)) = (matrix_values(&c, &left), matrix_values(&c, &right)) {
            return c.matrix(std::array::from_fn(|i| a[i] - b[i]));
        }
        if matrix_values(&c, &right) == Some(ZERO) {
            return Ok(left);
        }
        if left == right {
            return c.zero_matrix();
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.matrix_multiply, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (lv, rv) = (matrix_values(&c, &left), matrix_values(&c, &right));
        if let (Some(a), Some(b)) = (lv, rv) {
            return c.matrix(mat_mul(&a, &b));
        }
        if lv == Some(ZERO) || rv == Some(ZERO) {
            return c.zero_matrix();
        }
        if lv == Some(IDENTITY) {
            return Ok(right);
        }
        if rv == Some(IDENTITY) {
            return Ok(left);
        }
        // A matrix against its own inverse cancels structurally.
        let inverse = &c.math.matrix_inverse;
        if left.kind() == inverse && left.node(0) == &right {
            return c.identity_matrix();
        }
        if right.kind() == inverse && right.node(0) == &left {
            return c.identity_matrix();
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.matrix_scalar_multiply, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (lv, sv) = (matrix_values(&c, &left), scalar_value(&c, &right));
        if let (Some(a), Some(s)) = (lv, sv) {
            return c.matrix(std::array::from_fn(|i| a[i] * s));
        }
        if sv == Some(0.0) {
            return c.zero_matrix();
        }
        if sv == Some(1.0) {
            return Ok(left);
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.matrix_divide, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (lv, sv) = (matrix_values(&c, &left), scalar_value(&c, &right));
        if sv == Some(0.0) {
            return Err(Error::DivisionByZero);
        }
        if let (Some(a), Some(s)) = (lv, sv) {
            return c.matrix(std::array::from_fn(|i| a[i] / s));
        }
        if sv == Some(1.0) {
            return Ok(left);
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.matrix_transpose, move |ctx, expr| {
        let value = ctx.get(expr.node(0))?;
        if value.kind() == &c.math.matrix_transpose {
            return Ok(value.node(0).clone());
        }
        if let Some(m) = matrix_values(&c, &value) {
            return c.matrix(std::array::from_fn(|i| m[(i % 4) * 4 + i / 4]));
        }
        c.build_positional(expr.kind(), [value])
    });

    let c = core.clone();
    registry.register(&core.math.matrix_inverse, move |ctx, expr| {
        let value = ctx.get(expr.node(0))?;
        if value.kind() == &c.math.matrix_inverse {
            return Ok(value.node(0).clone());
        }
        if let Some(m) = matrix_values(&c, &value) {
            return match invert(&m) {
                Some(inverted) => c.matrix(inverted),
                None => Err(Error::SingularMatrix),
            };
        }
        c.build_positional(expr.kind(), [value])
    });

    // Direction-style products go through the upper 3x3 block.
    let c = core.clone();
    registry.register(&core.math.matrix_vector_multiply, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (mv, vv) = (matrix_values(&c, &left), vector_values(&c, &right));
        if let (Some(m), Some(v)) = (mv, vv) {
            let out: [f64; 3] =
                std::array::from_fn(|row| (0..3).map(|k| m[row * 4 + k] * v[k]).sum());
            return c.vector(out[0], out[1], out[2]);
        }
        if mv == Some(IDENTITY) {
            return Ok(right);
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.vector_matrix_multiply, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (vv, mv) = (vector_values(&c, &left), matrix_values(&c, &right));
        if let (Some(v), Some(m)) = (vv, mv) {
            let out: [f64; 3] =
                std::array::from_fn(|column| (0..3).map(|k| v[k] * m[k * 4 + column]).sum());
            return c.vector(out[0], out[1], out[2]);
        }
        if mv == Some(IDENTITY) {
            return Ok(left);
        }
        c.build_positional(expr.kind(), [left, right])
    });
}
