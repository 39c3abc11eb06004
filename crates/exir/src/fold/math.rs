use crate::dispatch::Registry;
use crate::error::Error;
use crate::expr::Expr;
use crate::exprs::CoreIr;
use crate::schema::Kind;

use super::{bool_value, int_value, scalar_value};

pub(super) fn register(registry: &mut Registry<Expr>, core: &CoreIr) {
    boolean(registry, core);
    casts(registry, core);
    integer(registry, core);
    scalar(registry, core);
    comparisons(registry, core);
}

fn boolean(registry: &mut Registry<Expr>, core: &CoreIr) {
    let c = core.clone();
    registry.register(&core.math.boolean_inverse, move |ctx, expr| {
        let value = ctx.get(expr.node(0))?;
        if let Some(b) = bool_value(&c, &value) {
            return c.bool_const(!b);
        }
        if value.kind() == &c.math.boolean_inverse {
            return Ok(value.node(0).clone());
        }
        c.build_positional(expr.kind(), [value])
    });

    // Short-circuit: the right operand only resolves when the left does
    // not decide the result.
    let c = core.clone();
    registry.register_with(&core.math.boolean_and, false, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        match bool_value(&c, &left) {
            Some(false) => return c.bool_const(false),
            Some(true) => return ctx.get(expr.node(1)),
            None => {}
        }
        let right = ctx.get(expr.node(1))?;
        match bool_value(&c, &right) {
            Some(false) => c.bool_const(false),
            Some(true) => Ok(left),
            None => c.build_positional(expr.kind(), [left, right]),
        }
    });

    let c = core.clone();
    registry.register_with(&core.math.boolean_or, false, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        match bool_value(&c, &left) {
            Some(true) => return c.bool_const(true),
            Some(false) => return ctx.get(expr.node(1)),
            None => {}
        }
        let right = ctx.get(expr.node(1))?;
        match bool_value(&c, &right) {
            Some(true) => c.bool_const(true),
            Some(false) => Ok(left),
            None => c.build_positional(expr.kind(), [left, right]),
        }
    });
}

fn casts(registry: &mut Registry<Expr>, core: &CoreIr) {
    let c = core.clone();
    registry.register(&core.math.scalar_from_integer, move |ctx, expr| {
        let value = ctx.get(expr.node(0))?;
        if let Some(i) = int_value(&c, &value) {
            return c.scalar_const(i as f64);
        }
        if value.kind() == &c.math.integer_from_boolean {
            return c.build_positional(&c.math.scalar_from_boolean, [value.node(0)]);
        }
        c.build_positional(expr.kind(), [value])
    });

    let c = core.clone();
    registry.register(&core.math.scalar_from_boolean, move |ctx, expr| {
        let value = ctx.get(expr.node(0))?;
        if let Some(b) = bool_value(&c, &value) {
            return c.scalar_const(if b { 1.0 } else { 0.0 });
        }
        c.build_positional(expr.kind(), [value])
    });

    let c = core.clone();
    registry.register(&core.math.integer_from_scalar, move |ctx, expr| {
        let value = ctx.get(expr.node(0))?;
        if let Some(v) = scalar_value(&c, &value) {
            return c.int_const(v.trunc() as i64);
        }
        // A scalar that was lifted from an integer or boolean never
        // needs the truncating round trip.
        if value.kind() == &c.math.scalar_from_integer {
            return Ok(value.node(0).clone());
        }
        if value.kind() == &c.math.scalar_from_boolean {
            return c.build_positional(&c.math.integer_from_boolean, [value.node(0)]);
        }
        c.build_positional(expr.kind(), [value])
    });

    let c = core.clone();
    registry.register(&core.math.integer_from_boolean, move |ctx, expr| {
        let value = ctx.get(expr.node(0))?;
        if let Some(b) = bool_value(&c, &value) {
            return c.int_const(i64::from(b));
        }
        c.build_positional(expr.kind(), [value])
    });

    let c = core.clone();
    registry.register(&core.math.boolean_from_scalar, move |ctx, expr| {
        let value = ctx.get(expr.node(0))?;
        if let Some(v) = scalar_value(&c, &value) {
            return c.bool_const(v != 0.0);
        }
        if value.kind() == &c.math.scalar_from_boolean {
            return Ok(value.node(0).clone());
        }
        if value.kind() == &c.math.scalar_from_integer {
            return c.build_positional(&c.math.boolean_from_integer, [value.node(0)]);
        }
        c.build_positional(expr.kind(), [value])
    });

    let c = core.clone();
    registry.register(&core.math.boolean_from_integer, move |ctx, expr| {
        let value = ctx.get(expr.node(0))?;
        if let Some(i) = int_value(&c, &value) {
            return c.bool_const(i != 0);
        }
        if value.kind() == &c.math.integer_from_boolean {
            return Ok(value.node(0).clone());
        }
        c.build_positional(expr.kind(), [value])
    });
}

fn integer(registry: &mut Registry<Expr>, core: &CoreIr) {
    let c = core.clone();
    registry.register(&core.math.integer_add, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (lv, rv) = (int_value(&c, &left), int_value(&c, &right));
        if let (Some(a), Some(b)) = (lv, rv) {
            return c.int_const(a + b);
        }
        if lv == Some(0) {
            return Ok(right);
        }
        if rv == Some(0) {
            return Ok(left);
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.integer_subtract, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        if let (Some(a), Some(b)) = (int_value(&c, &left), int_value(&c, &right)) {
            return c.int_const(a - b);
        }
        if int_value(&c, &right) == Some(0) {
            return Ok(left);
        }
        if left == right {
            return c.int_const(0);
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.integer_multiply, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (lv, rv) = (int_value(&c, &left), int_value(&c, &right));
        if let (Some(a), Some(b)) = (lv, rv) {
            return c.int_const(a * b);
        }
        if lv == Some(0) || rv == Some(0) {
            return c.int_const(0);
        }
        if lv == Some(1) {
            return Ok(right);
        }
        if rv == Some(1) {
            return Ok(left);
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.integer_divide, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (lv, rv) = (int_value(&c, &left), int_value(&c, &right));
        if rv == Some(0) {
            return Err(Error::DivisionByZero);
        }
        if let (Some(a), Some(b)) = (lv, rv) {
            return c.int_const(a / b);
        }
        if lv == Some(0) {
            return c.int_const(0);
        }
        if rv == Some(1) {
            return Ok(left);
        }
        if left == right {
            return c.int_const(1);
        }
        c.build_positional(expr.kind(), [left, right])
    });
}

fn scalar(registry: &mut Registry<Expr>, core: &CoreIr) {
    let c = core.clone();
    registry.register(&core.math.scalar_add, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (lv, rv) = (scalar_value(&c, &left), scalar_value(&c, &right));
        if let (Some(a), Some(b)) = (lv, rv) {
            return c.scalar_const(a + b);
        }
        if lv == Some(0.0) {
            return Ok(right);
        }
        if rv == Some(0.0) {
            return Ok(left);
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.scalar_subtract, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        if let (Some(a), Some(b)) = (scalar_value(&c, &left), scalar_value(&c, &right)) {
            return c.scalar_const(a - b);
        }
        if scalar_value(&c, &right) == Some(0.0) {
            return Ok(left);
        }
        if left == right {
            return c.scalar_const(0.0);
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.scalar_multiply, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (lv, rv) = (scalar_value(&c, &left), scalar_value(&c, &right));
        if let (Some(a), Some(b)) = (lv, rv) {
            return c.scalar_const(a * b);
        }
        if lv == Some(0.0) || rv == Some(0.0) {
            return c.scalar_const(0.0);
        }
        if lv == Some(1.0) {
            return Ok(right);
        }
        if rv == Some(1.0) {
            return Ok(left);
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.scalar_divide, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (lv, rv) = (scalar_value(&c, &left), scalar_value(&c, &right));
        if rv == Some(0.0) {
            return Err(Error::DivisionByZero);
        }
        if let (Some(a), Some(b)) = (lv, rv) {
            return c.scalar_const(a / b);
        }
        if lv == Some(0.0) {
            return c.scalar_const(0.0);
        }
        if rv == Some(1.0) {
            return Ok(left);
        }
        if left == right {
            return c.scalar_const(1.0);
        }
        c.build_positional(expr.kind(), [left, right])
    });

    let c = core.clone();
    registry.register(&core.math.scalar_power, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        let (lv, rv) = (scalar_value(&c, &left), scalar_value(&c, &right));
        if let (Some(a), Some(b)) = (lv, rv) {
            return c.scalar_const(a.powf(b));
        }
        if rv == Some(1.0) {
            return Ok(left);
        }
        if rv == Some(0.0) || lv == Some(1.0) {
            return c.scalar_const(1.0);
        }
        c.build_positional(expr.kind(), [left, right])
    });
}

fn comparisons(registry: &mut Registry<Expr>, core: &CoreIr) {
    comparison(registry, core, core.math.equals.clone(), true, |a, b| a == b);
    comparison(registry, core, core.math.not_equals.clone(), false, |a, b| {
        a != b
    });
    comparison(registry, core, core.math.greater_than.clone(), false, |a, b| {
        a > b
    });
    comparison(
        registry,
        core,
        core.math.greater_than_equals.clone(),
        true,
        |a, b| a >= b,
    );
    comparison(registry, core, core.math.less_than.clone(), false, |a, b| {
        a < b
    });
    comparison(
        registry,
        core,
        core.math.less_than_equals.clone(),
        true,
        |a, b| a <= b,
    );
}

// A structurally identical pair decides reflexive comparisons without a
// constant value.
fn comparison<F>(registry: &mut Registry<Expr>, core: &CoreIr, kind: Kind, reflexive: bool, op: F)
where
    F: Fn(f64, f64) -> bool + 'static,
{
    let c = core.clone();
    registry.register(&kind, move |ctx, expr| {
        let left = ctx.get(expr.node(0))?;
        let right = ctx.get(expr.node(1))?;
        if left == right {
            return c.bool_const(reflexive);
        }
        if let (Some(a), Some(b)) = (scalar_value(&c, &left), scalar_value(&c, &right)) {
            return c.bool_const(op(a, b));
        }
        c.build_positional(expr.kind(), [left, right])
    });
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::expr::Expr;
    use crate::exprs::CoreIr;
    use crate::fold;
    use crate::ir::Args;
    use rstest::*;

    fn fold_one(core: &CoreIr, expr: &Expr) -> Expr {
        fold::context(core).get(expr).unwrap()
    }

    fn scalar_of(core: &CoreIr, expr: &Expr) -> f64 {
        assert_eq!(expr.kind(), &core.math.scalar_constant);
        expr.value(0).as_number().unwrap().value()
    }

    // A scalar no amount of folding can decide: a world-space component
    // of an unresolved transform chain.
    fn symbolic_scalar(core: &CoreIr) -> Expr {
        let parent = core
            .compose(Args::new().kwarg("translation", core.vector(1.0, 0.0, 0.0).unwrap()))
            .unwrap();
        let local = core
            .compose(Args::new().kwarg("translation", core.vector(0.0, 1.0, 0.0).unwrap()))
            .unwrap();
        let world = core.local_to_world(&parent, &local).unwrap();
        core.x(&core.translation(&world).unwrap()).unwrap()
    }

    #[test]
    fn test_arithmetic_expression_folds_to_constant() {
        let core = CoreIr::new().unwrap();
        let sum = core
            .add(&core.scalar_const(1.0).unwrap(), &core.scalar_const(2.0).unwrap())
            .unwrap();
        let power = core
            .pow(&core.scalar_const(7.0).unwrap(), &core.scalar_const(2.0).unwrap())
            .unwrap();
        let quotient = core
            .div(&core.scalar_const(4.0).unwrap(), &core.scalar_const(3.0).unwrap())
            .unwrap();
        let product = core
            .mul(&sum, &core.sub(&power, &quotient).unwrap())
            .unwrap();

        let folded = fold_one(&core, &product);
        assert!((scalar_of(&core, &folded) - 143.0).abs() < 1e-9);
    }

    #[test]
    fn test_integer_division_truncates() {
        let core = CoreIr::new().unwrap();
        let q = core
            .div(&core.int_const(-7).unwrap(), &core.int_const(2).unwrap())
            .unwrap();
        let folded = fold_one(&core, &q);
        assert_eq!(folded.value(0).as_int(), Some(-3));
    }

    #[test]
    fn test_division_by_constant_zero_is_eager() {
        let core = CoreIr::new().unwrap();
        let q = core
            .div(&symbolic_scalar(&core), &core.scalar_const(0.0).unwrap())
            .unwrap();
        assert_eq!(
            fold::context(&core).get(&q).unwrap_err(),
            Error::DivisionByZero
        );
    }

    #[test]
    fn test_subtraction_is_reflexive_but_addition_is_not() {
        let core = CoreIr::new().unwrap();
        let a = symbolic_scalar(&core);

        let difference = fold_one(&core, &core.sub(&a, &a).unwrap());
        assert_eq!(scalar_of(&core, &difference), 0.0);

        let sum = fold_one(&core, &core.add(&a, &a).unwrap());
        assert_eq!(sum.kind(), &core.math.scalar_add);
    }

    #[test]
    fn test_identity_operands_drop_out() {
        let core = CoreIr::new().unwrap();
        let a = symbolic_scalar(&core);
        let one = core.scalar_const(1.0).unwrap();
        let zero = core.scalar_const(0.0).unwrap();

        assert_eq!(fold_one(&core, &core.add(&zero, &a).unwrap()), fold_one(&core, &a));
        assert_eq!(fold_one(&core, &core.mul(&a, &one).unwrap()), fold_one(&core, &a));
        assert_eq!(
            scalar_of(&core, &fold_one(&core, &core.mul(&a, &zero).unwrap())),
            0.0
        );
        assert_eq!(fold_one(&core, &core.pow(&a, &one).unwrap()), fold_one(&core, &a));
        assert_eq!(
            scalar_of(&core, &fold_one(&core, &core.pow(&a, &zero).unwrap())),
            1.0
        );
    }

    #[test]
    fn test_and_short_circuits_left_to_right() {
        let core = CoreIr::new().unwrap();
        // A comparison whose left side raises when folded.
        let zero_div = core
            .div(&core.scalar_const(1.0).unwrap(), &core.scalar_const(0.0).unwrap())
            .unwrap();
        let raising = core.eq(&zero_div, &core.scalar_const(0.0).unwrap()).unwrap();
        let f = core.bool_const(false).unwrap();

        let guarded = core.and_(&f, &raising).unwrap();
        let folded = fold_one(&core, &guarded);
        assert_eq!(folded.value(0).as_bool(), Some(false));

        let unguarded = core.and_(&raising, &f).unwrap();
        assert_eq!(
            fold::context(&core).get(&unguarded).unwrap_err(),
            Error::DivisionByZero
        );
    }

    #[test]
    fn test_or_with_constant_true_wins() {
        let core = CoreIr::new().unwrap();
        let zero_div = core
            .div(&core.scalar_const(1.0).unwrap(), &core.scalar_const(0.0).unwrap())
            .unwrap();
        let raising = core.eq(&zero_div, &core.scalar_const(0.0).unwrap()).unwrap();

        let guarded = core.or_(&core.bool_const(true).unwrap(), &raising).unwrap();
        let folded = fold_one(&core, &guarded);
        assert_eq!(folded.value(0).as_bool(), Some(true));
    }

    #[test]
    fn test_double_inverse_cancels() {
        let core = CoreIr::new().unwrap();
        let b = core
            .gt(&symbolic_scalar(&core), &core.scalar_const(2.0).unwrap())
            .unwrap();
        let twice = core.not_(&core.not_(&b).unwrap()).unwrap();
        assert_eq!(fold_one(&core, &twice), fold_one(&core, &b));
    }

    #[test]
    fn test_comparison_folds_constants_and_reflexive_pairs() {
        let core = CoreIr::new().unwrap();
        let a = symbolic_scalar(&core);

        let lt = core
            .lt(&core.scalar_const(1.0).unwrap(), &core.scalar_const(2.0).unwrap())
            .unwrap();
        assert_eq!(fold_one(&core, &lt).value(0).as_bool(), Some(true));

        assert_eq!(
            fold_one(&core, &core.ge(&a, &a).unwrap()).value(0).as_bool(),
            Some(true)
        );
        assert_eq!(
            fold_one(&core, &core.ne(&a, &a).unwrap()).value(0).as_bool(),
            Some(false)
        );
    }

    #[test]
    fn test_cast_chains_collapse() {
        let core = CoreIr::new().unwrap();
        let i = core.int_const(3).unwrap();

        // Scalar lift of a constant integer becomes a scalar constant.
        let lifted = core.scalar(&i).unwrap();
        assert_eq!(scalar_of(&core, &fold_one(&core, &lifted)), 3.0);

        // int(scalar(x)) is x even when x stays symbolic.
        let x = symbolic_scalar(&core);
        let round_trip = core.integer(&core.scalar(&core.integer(&x).unwrap()).unwrap()).unwrap();
        let folded = fold_one(&core, &round_trip);
        assert_eq!(folded.kind(), &core.math.integer_from_scalar);
        assert_eq!(folded, fold_one(&core, &core.integer(&x).unwrap()));
    }

    #[rstest]
    #[case::rounds_down(2.9, 2)]
    #[case::rounds_toward_zero(-2.9, -2)]
    #[case::exact(3.0, 3)]
    fn test_integer_cast_truncates(#[case] value: f64, #[case] expected: i64) {
        let core = CoreIr::new().unwrap();
        let i = core.integer(&core.scalar_const(value).unwrap()).unwrap();
        assert_eq!(fold_one(&core, &i).value(0).as_int(), Some(expected));
    }

    #[rstest]
    #[case::zero_is_false(0.0, false)]
    #[case::nonzero_is_true(-2.5, true)]
    fn test_boolean_cast_folds(#[case] value: f64, #[case] expected: bool) {
        let core = CoreIr::new().unwrap();
        let b = core.boolean(&core.scalar_const(value).unwrap()).unwrap();
        assert_eq!(fold_one(&core, &b).value(0).as_bool(), Some(expected));
    }
}
