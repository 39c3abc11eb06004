use crate::dispatch::Registry;
use crate::expr::Expr;
use crate::exprs::CoreIr;
use crate::ir::Args;
use crate::value::{RotateOrder, Value};

use super::matrix::{IDENTITY, det3, mat_mul};
use super::{dot3, matrix_values, norm3, scale3, scalar_value, sub3, vector_values};

fn axis_matrix(axis: usize, degrees: f64) -> [f64; 16] {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let mut m = IDENTITY;
    match axis {
        0 => {
            m[5] = cos;
            m[6] = sin;
            m[9] = -sin;
            m[10] = cos;
        }
        1 => {
            m[0] = cos;
            m[2] = -sin;
            m[8] = sin;
            m[10] = cos;
        }
        _ => {
            m[0] = cos;
            m[1] = sin;
            m[4] = -sin;
            m[5] = cos;
        }
    }
    m
}

fn euler_matrix(x: f64, y: f64, z: f64, order: RotateOrder) -> [f64; 16] {
    let axes = match order {
        RotateOrder::Xyz => [0, 1, 2],
        RotateOrder::Yxz => [1, 0, 2],
        RotateOrder::Xzy => [0, 2, 1],
        RotateOrder::Zyx => [2, 1, 0],
        RotateOrder::Yzx => [1, 2, 0],
        RotateOrder::Zxy => [2, 0, 1],
    };
    let angles = [x, y, z];
    let mut m = IDENTITY;
    for axis in axes {
        m = mat_mul(&m, &axis_matrix(axis, angles[axis]));
    }
    m
}

// Scale first, then rotate, then translate.
fn compose_matrix(translation: [f64; 3], rotation: [f64; 16], scale: [f64; 3]) -> [f64; 16] {
    let mut s = IDENTITY;
    s[0] = scale[0];
    s[5] = scale[1];
    s[10] = scale[2];
    let mut t = IDENTITY;
    t[12] = translation[0];
    t[13] = translation[1];
    t[14] = translation[2];
    mat_mul(&mat_mul(&s, &rotation), &t)
}

/// Recovers scale factors by un-skewing the upper 3x3 rows; a negative
/// determinant flips the z factor. `None` when a row collapses to zero.
fn decompose_scale(m: &[f64; 16]) -> Option<[f64; 3]> {
    let rows: [[f64; 3]; 3] = std::array::from_fn(|i| [m[i * 4], m[i * 4 + 1], m[i * 4 + 2]]);

    let sx = norm3(rows[0]);
    if sx == 0.0 {
        return None;
    }
    let u0 = scale3(rows[0], 1.0 / sx);

    let r1 = sub3(rows[1], scale3(u0, dot3(rows[1], u0)));
    let sy = norm3(r1);
    if sy == 0.0 {
        return None;
    }
    let u1 = scale3(r1, 1.0 / sy);

    let r2 = sub3(
        sub3(rows[2], scale3(u0, dot3(rows[2], u0))),
        scale3(u1, dot3(rows[2], u1)),
    );
    let sz = norm3(r2);

    let sz = if det3(m) < 0.0 { -sz } else { sz };
    Some([sx, sy, sz])
}

/// A rotation representable as a constant matrix; anything unconvertible
/// to constant Euler angles stays symbolic.
fn constant_rotation_matrix(c: &CoreIr, rotation: &Expr) -> Option<[f64; 16]> {
    if rotation.kind() == &c.transform.rotation_identity {
        return Some(IDENTITY);
    }
    let euler = if rotation.kind() == &c.transform.euler_rotation {
        rotation.clone()
    } else {
        match c
            .ir()
            .convert_to_node(&c.transform.euler_rotation, Value::from(rotation))
        {
            Ok(node) => node,
            Err(_) => return None,
        }
    };
    let x = scalar_value(c, euler.node(0))?;
    let y = scalar_value(c, euler.node(1))?;
    let z = scalar_value(c, euler.node(2))?;
    match euler.value(3) {
        Value::RotateOrder(order) => Some(euler_matrix(x, y, z, *order)),
        _ => None,
    }
}

pub(super) fn register(registry: &mut Registry<Expr>, core: &CoreIr) {
    let c = core.clone();
    registry.register(&core.transform.euler_rotation, move |ctx, expr| {
        let x = ctx.get(expr.node(0))?;
        let y = ctx.get(expr.node(1))?;
        let z = ctx.get(expr.node(2))?;
        let all_zero = [&x, &y, &z]
            .iter()
            .all(|angle| scalar_value(&c, angle) == Some(0.0));
        if all_zero {
            return c.rotation_identity();
        }
        c.build(
            expr.kind(),
            Args::new()
                .arg(x)
                .arg(y)
                .arg(z)
                .arg(expr.value(3).clone()),
        )
    });

    let c = core.clone();
    registry.register(&core.transform.matrix_from_transform, move |ctx, expr| {
        let t = ctx.get(expr.node(0))?;
        if t.kind() == &c.transform.transform_identity {
            return c.identity_matrix();
        }
        if t.kind() == &c.transform.transform_from_matrix {
            return Ok(t.node(0).clone());
        }
        if t.kind() == &c.transform.compose_transform {
            if let (Some(translation), Some(rotation), Some(scale)) = (
                vector_values(&c, t.node(0)),
                constant_rotation_matrix(&c, t.node(1)),
                vector_values(&c, t.node(2)),
            ) {
                return c.matrix(compose_matrix(translation, rotation, scale));
            }
        }
        c.build_positional(expr.kind(), [t])
    });

    let c = core.clone();
    registry.register(&core.transform.transform_from_matrix, move |ctx, expr| {
        let m = ctx.get(expr.node(0))?;
        if m.kind() == &c.transform.matrix_from_transform {
            return Ok(m.node(0).clone());
        }
        c.build_positional(expr.kind(), [m])
    });

    let c = core.clone();
    registry.register(&core.transform.local_to_world, move |ctx, expr| {
        let parent = ctx.get(expr.node(0))?;
        let local = ctx.get(expr.node(1))?;
        if parent.kind() == &c.transform.transform_identity {
            return Ok(local);
        }
        if local.kind() == &c.transform.transform_identity {
            return Ok(parent);
        }
        // Back out through the same parent.
        if local.kind() == &c.transform.world_to_local && local.node(0) == &parent {
            return Ok(local.node(1).clone());
        }
        c.build_positional(expr.kind(), [parent, local])
    });

    let c = core.clone();
    registry.register(&core.transform.world_to_local, move |ctx, expr| {
        let parent = ctx.get(expr.node(0))?;
        let world = ctx.get(expr.node(1))?;
        if parent.kind() == &c.transform.transform_identity {
            return Ok(world);
        }
        if world.kind() == &c.transform.local_to_world && world.node(0) == &parent {
            return Ok(world.node(1).clone());
        }
        c.build_positional(expr.kind(), [parent, world])
    });

    // Output accessors dispatch on the folded subject; `output` itself
    // resolves the field-shadowing case.
    let c = core.clone();
    registry.register(&core.transform.translation_output, move |ctx, expr| {
        let subject = ctx.get(expr.node(0))?;
        if subject.kind() == &c.transform.transform_identity {
            return c.vector(0.0, 0.0, 0.0);
        }
        if subject.kind() == &c.transform.transform_from_matrix {
            if let Some(m) = matrix_values(&c, subject.node(0)) {
                return c.vector(m[12], m[13], m[14]);
            }
        }
        c.output(&subject, "translation")
    });

    let c = core.clone();
    registry.register(&core.transform.rotation_output, move |ctx, expr| {
        let subject = ctx.get(expr.node(0))?;
        if subject.kind() == &c.transform.transform_identity {
            return c.rotation_identity();
        }
        c.output(&subject, "rotation")
    });

    let c = core.clone();
    registry.register(&core.transform.scale_output, move |ctx, expr| {
        let subject = ctx.get(expr.node(0))?;
        if subject.kind() == &c.transform.transform_identity {
            return c.vector(1.0, 1.0, 1.0);
        }
        if subject.kind() == &c.transform.transform_from_matrix {
            if let Some(m) = matrix_values(&c, subject.node(0)) {
                if let Some(scale) = decompose_scale(&m) {
                    return c.vector(scale[0], scale[1], scale[2]);
                }
            }
        }
        c.output(&subject, "scale")
    });
}

#[cfg(test)]
mod tests {
    use crate::expr::Expr;
    use crate::exprs::CoreIr;
    use crate::fold;
    use crate::ir::Args;
    use crate::value::RotateOrder;

    fn fold_one(core: &CoreIr, expr: &Expr) -> Expr {
        fold::context(core).get(expr).unwrap()
    }

    fn components(core: &CoreIr, expr: &Expr) -> [f64; 3] {
        assert_eq!(expr.kind(), &core.math.vector_constant);
        std::array::from_fn(|i| expr.value(i).as_number().unwrap().value())
    }

    fn entries(core: &CoreIr, expr: &Expr) -> [f64; 16] {
        assert_eq!(expr.kind(), &core.math.matrix_constant);
        std::array::from_fn(|i| expr.value(i).as_number().unwrap().value())
    }

    #[test]
    fn test_zero_euler_angles_fold_to_identity_rotation() {
        let core = CoreIr::new().unwrap();
        let rotation = core.euler(0.0, 0.0, 0.0).unwrap();
        assert_eq!(
            fold_one(&core, &rotation).kind(),
            &core.transform.rotation_identity
        );
    }

    #[test]
    fn test_identity_transform_becomes_identity_matrix() {
        let core = CoreIr::new().unwrap();
        let m = core
            .matrix_from_transform(&core.transform_identity().unwrap())
            .unwrap();
        assert_eq!(fold_one(&core, &m), core.identity_matrix().unwrap());
    }

    #[test]
    fn test_matrix_transform_round_trips_cancel() {
        let core = CoreIr::new().unwrap();

        // A transform that stays symbolic, so the round trip cancels
        // structurally instead of through constants.
        let a = core
            .compose(Args::new().kwarg("translation", core.vector(1.0, 0.0, 0.0).unwrap()))
            .unwrap();
        let b = core
            .compose(Args::new().kwarg("translation", core.vector(0.0, 2.0, 0.0).unwrap()))
            .unwrap();
        let t = core.local_to_world(&a, &b).unwrap();
        let there_and_back = core
            .transform_from_matrix(&core.matrix_from_transform(&t).unwrap())
            .unwrap();
        assert_eq!(fold_one(&core, &there_and_back), fold_one(&core, &t));

        let m = core
            .matrix([
                1.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, //
                4.0, 5.0, 6.0, 1.0,
            ])
            .unwrap();
        let other_way = core
            .matrix_from_transform(&core.transform_from_matrix(&m).unwrap())
            .unwrap();
        assert_eq!(fold_one(&core, &other_way), m);
    }

    #[test]
    fn test_constant_compose_becomes_matrix() {
        let core = CoreIr::new().unwrap();
        let composed = core
            .compose(
                Args::new()
                    .kwarg("translation", core.vector(1.0, 2.0, 3.0).unwrap())
                    .kwarg("rotation", core.euler(90.0, 0.0, 0.0).unwrap())
                    .kwarg("scale", core.vector(2.0, 2.0, 2.0).unwrap()),
            )
            .unwrap();
        let m = fold_one(&core, &core.matrix_from_transform(&composed).unwrap());
        let out = entries(&core, &m);

        // Translation occupies the last row.
        assert_eq!(&out[12..15], &[1.0, 2.0, 3.0]);
        // An x rotation of 90 degrees sends y to z, scaled by 2.
        assert!((out[5]).abs() < 1e-9);
        assert!((out[6] - 2.0).abs() < 1e-9);
        assert!((out[9] + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_order_changes_the_matrix() {
        let core = CoreIr::new().unwrap();
        let build = |order| {
            let rotation = core.euler_with_order(90.0, 90.0, 0.0, order).unwrap();
            let composed = core.compose(Args::new().kwarg("rotation", rotation)).unwrap();
            fold_one(&core, &core.matrix_from_transform(&composed).unwrap())
        };
        let a = build(RotateOrder::Xyz);
        let b = build(RotateOrder::Yxz);
        assert_eq!(a.kind(), &core.math.matrix_constant);
        assert_ne!(a, b);
    }

    #[test]
    fn test_rotation_applies_to_vectors_through_the_matrix() {
        let core = CoreIr::new().unwrap();
        let composed = core
            .compose(Args::new().kwarg("rotation", core.euler(90.0, 0.0, 0.0).unwrap()))
            .unwrap();
        let m = core.matrix_from_transform(&composed).unwrap();
        let rotated = core.mul(&core.vector(0.0, 1.0, 0.0).unwrap(), &m).unwrap();

        let out = components(&core, &fold_one(&core, &rotated));
        assert!(out[0].abs() < 1e-9);
        assert!(out[1].abs() < 1e-9);
        assert!((out[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_decompose_recovers_translation_and_scale() {
        let core = CoreIr::new().unwrap();
        let composed = core
            .compose(
                Args::new()
                    .kwarg("translation", core.vector(1.0, 2.0, 3.0).unwrap())
                    .kwarg("rotation", core.euler(0.0, 0.0, 90.0).unwrap())
                    .kwarg("scale", core.vector(1.0, 2.0, -3.0).unwrap()),
            )
            .unwrap();
        let m = fold_one(&core, &core.matrix_from_transform(&composed).unwrap());
        let recovered = core.transform_from_matrix(&m).unwrap();

        let translation = fold_one(&core, &core.translation(&recovered).unwrap());
        assert_eq!(components(&core, &translation), [1.0, 2.0, 3.0]);

        // The reflection lands on the z factor.
        let scale = fold_one(&core, &core.scale(&recovered).unwrap());
        let out = components(&core, &scale);
        assert!((out[0] - 1.0).abs() < 1e-9);
        assert!((out[1] - 2.0).abs() < 1e-9);
        assert!((out[2] + 3.0).abs() < 1e-9);

        // The rotation part stays symbolic.
        let rotation = fold_one(&core, &core.rotation(&recovered).unwrap());
        assert!(rotation.is_a(&core.transform.rotation_output));
    }

    #[test]
    fn test_identity_parent_elides_space_changes() {
        let core = CoreIr::new().unwrap();
        let identity = core.transform_identity().unwrap();
        let t = core
            .compose(Args::new().kwarg("translation", core.vector(0.0, 7.0, 0.0).unwrap()))
            .unwrap();

        let world = core.local_to_world(&identity, &t).unwrap();
        assert_eq!(fold_one(&core, &world), fold_one(&core, &t));

        let local = core.world_to_local(&identity, &t).unwrap();
        assert_eq!(fold_one(&core, &local), fold_one(&core, &t));
    }

    #[test]
    fn test_space_changes_through_the_same_parent_cancel() {
        let core = CoreIr::new().unwrap();
        let parent = core
            .compose(Args::new().kwarg("translation", core.vector(5.0, 0.0, 0.0).unwrap()))
            .unwrap();
        let t = core
            .compose(Args::new().kwarg("translation", core.vector(0.0, 7.0, 0.0).unwrap()))
            .unwrap();

        let round_trip = core
            .local_to_world(&parent, &core.world_to_local(&parent, &t).unwrap())
            .unwrap();
        assert_eq!(fold_one(&core, &round_trip), fold_one(&core, &t));

        let reversed = core
            .world_to_local(&parent, &core.local_to_world(&parent, &t).unwrap())
            .unwrap();
        assert_eq!(fold_one(&core, &reversed), fold_one(&core, &t));
    }

    #[test]
    fn test_identity_outputs_fold_to_constants() {
        let core = CoreIr::new().unwrap();
        let identity = core.transform_identity().unwrap();

        let translation = fold_one(&core, &core.translation(&identity).unwrap());
        assert_eq!(components(&core, &translation), [0.0, 0.0, 0.0]);

        let scale = fold_one(&core, &core.scale(&identity).unwrap());
        assert_eq!(components(&core, &scale), [1.0, 1.0, 1.0]);

        let rotation = fold_one(&core, &core.rotation(&identity).unwrap());
        assert_eq!(rotation.kind(), &core.transform.rotation_identity);
    }

    #[test]
    fn test_outputs_read_through_folded_subjects() {
        let core = CoreIr::new().unwrap();
        // The constant compose folds into the matrix, and the accessor
        // reads the translation back out of it.
        let composed = core
            .compose(Args::new().kwarg("translation", core.vector(8.0, 0.0, 0.0).unwrap()))
            .unwrap();
        let round_trip = core
            .transform_from_matrix(&core.matrix_from_transform(&composed).unwrap())
            .unwrap();
        let translation = fold_one(&core, &core.translation(&round_trip).unwrap());
        assert_eq!(components(&core, &translation), [8.0, 0.0, 0.0]);
    }
}
