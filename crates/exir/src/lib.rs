//! `exir` is an expression-graph compiler core: a typed vocabulary of
//! value-semantic nodes with structural identity, a dispatch and
//! memoization engine for rewriting and lowering graphs, and a
//! constant-folding pass over the built-in math and transform kinds.
//!
//! ## Examples
//!
//! ```rs
//! use exir::{CoreIr, fold};
//!
//! let core = CoreIr::new().unwrap();
//! let sum = core
//!     .add(&core.scalar(1.0).unwrap(), &core.scalar(2.0).unwrap())
//!     .unwrap();
//!
//! let folded = fold::context(&core).get(&sum).unwrap();
//! assert_eq!(folded.kind(), &core.math.scalar_constant);
//!
//! // Declare new kinds and dispatch over them
//! use exir::{Ir, Registry, Schema, TypeRef};
//! use std::rc::Rc;
//!
//! let mut ir = Ir::new();
//! let root = Schema::declare("Expression")
//!     .abstract_kind()
//!     .register(&mut ir.schema)
//!     .unwrap();
//! let constant = Schema::declare("Constant")
//!     .extends(&root)
//!     .field("value", TypeRef::Number)
//!     .register(&mut ir.schema)
//!     .unwrap();
//!
//! let mut registry: Registry<f64> = Registry::new(Rc::new(ir));
//! registry.register(&constant, |_, expr| {
//!     Ok(expr.value(0).as_number().unwrap().value())
//! });
//! ```

mod backend;
mod conversions;
mod dispatch;
mod error;
mod expr;
mod exprs;
pub mod fold;
mod ir;
mod number;
mod schema;
mod value;

pub use backend::Materialized;
pub use conversions::ConversionGraph;
pub use conversions::ConvertFn;
pub use conversions::constructor;
pub use dispatch::Context;
pub use dispatch::HandlerFn;
pub use dispatch::Pipeline;
pub use dispatch::Registry;
pub use dispatch::Rewrite;
pub use error::Error;
pub use expr::Expr;
pub use exprs::CoreIr;
pub use exprs::math::MathKinds;
pub use exprs::transform::TransformKinds;
pub use ir::{Args, Ir};
pub use number::Number;
pub use schema::{AncestorKinds, FieldDef, Kind, KindBuilder, KindId, OutputType, Schema};
pub use value::{RotateOrder, TypeRef, Value};
