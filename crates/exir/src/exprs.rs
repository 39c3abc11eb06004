pub mod math;
pub mod transform;

use std::rc::Rc;

use crate::error::Error;
use crate::expr::Expr;
use crate::ir::{Args, Ir};
use crate::schema::Kind;
use crate::value::Value;

/// The registered core vocabulary: one frozen [`Ir`] plus handles to
/// every kind the math and transform domains declare. Cloning shares the
/// registry.
#[derive(Clone)]
pub struct CoreIr {
    ir: Rc<Ir>,
    pub math: math::MathKinds,
    pub transform: transform::TransformKinds,
}

impl CoreIr {
    pub fn new() -> Result<Self, Error> {
        let mut ir = Ir::new();
        let math = math::MathKinds::register(&mut ir)?;
        let transform = transform::TransformKinds::register(&mut ir, &math)?;
        Ok(CoreIr {
            ir: Rc::new(ir),
            math,
            transform,
        })
    }

    pub fn ir(&self) -> &Rc<Ir> {
        &self.ir
    }

    pub fn build(&self, kind: &Kind, args: Args) -> Result<Expr, Error> {
        self.ir.build(kind, args)
    }

    pub fn build_positional<I>(&self, kind: &Kind, values: I) -> Result<Expr, Error>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.ir.build_positional(kind, values)
    }

    /// The derived output node `expr.name`; a field of the same name
    /// shadows the output.
    pub fn output(&self, expr: &Expr, name: &str) -> Result<Expr, Error> {
        self.ir.output(expr, name)
    }

    pub(crate) fn binary(&self, kind: &Kind, left: &Expr, right: &Expr) -> Result<Expr, Error> {
        self.build(kind, Args::new().arg(left).arg(right))
    }

    pub(crate) fn unary(&self, kind: &Kind, value: &Expr) -> Result<Expr, Error> {
        self.build(kind, Args::new().arg(value))
    }
}
