use std::rc::Rc;

use itertools::Itertools;

use crate::error::Error;
use crate::expr::Expr;
use crate::ir::{Args, Ir};
use crate::schema::{Kind, Schema};
use crate::value::{TypeRef, Value};

use super::CoreIr;

/// Handles to the boolean, integer, scalar, vector, and matrix kinds.
#[derive(Debug, Clone)]
pub struct MathKinds {
    pub expression: Kind,

    pub boolean: Kind,
    pub boolean_constant: Kind,
    pub boolean_inverse: Kind,
    pub boolean_and: Kind,
    pub boolean_or: Kind,
    pub boolean_from_scalar: Kind,
    pub boolean_from_integer: Kind,

    pub integer: Kind,
    pub integer_constant: Kind,
    pub integer_add: Kind,
    pub integer_subtract: Kind,
    pub integer_multiply: Kind,
    pub integer_divide: Kind,
    pub integer_from_scalar: Kind,
    pub integer_from_boolean: Kind,

    pub scalar: Kind,
    pub scalar_constant: Kind,
    pub scalar_add: Kind,
    pub scalar_subtract: Kind,
    pub scalar_multiply: Kind,
    pub scalar_divide: Kind,
    pub scalar_power: Kind,
    pub scalar_from_integer: Kind,
    pub scalar_from_boolean: Kind,

    pub equals: Kind,
    pub not_equals: Kind,
    pub greater_than: Kind,
    pub greater_than_equals: Kind,
    pub less_than: Kind,
    pub less_than_equals: Kind,

    pub vector: Kind,
    pub vector_constant: Kind,
    pub vector_from_scalar: Kind,
    pub vector_component: Kind,
    pub vector_add: Kind,
    pub vector_subtract: Kind,
    pub vector_multiply: Kind,
    pub vector_divide: Kind,
    pub vector_dot: Kind,
    pub vector_cross: Kind,
    pub vector_length: Kind,
    pub vector_normalize: Kind,

    pub matrix: Kind,
    pub matrix_constant: Kind,
    pub matrix_from_scalar: Kind,
    pub matrix_component: Kind,
    pub matrix_add: Kind,
    pub matrix_subtract: Kind,
    pub matrix_multiply: Kind,
    pub matrix_scalar_multiply: Kind,
    pub matrix_divide: Kind,
    pub matrix_transpose: Kind,
    pub matrix_inverse: Kind,
    pub matrix_vector_multiply: Kind,
    pub vector_matrix_multiply: Kind,
}

fn number_from_int(_: &Ir, value: Value) -> Result<Value, Error> {
    match value {
        Value::Int(i) => Ok(Value::from(i as f64)),
        other => Err(bad_step(TypeRef::Number, &other)),
    }
}

fn number_from_bool(_: &Ir, value: Value) -> Result<Value, Error> {
    match value {
        Value::Bool(b) => Ok(Value::from(if b { 1.0 } else { 0.0 })),
        other => Err(bad_step(TypeRef::Number, &other)),
    }
}

fn int_from_number(_: &Ir, value: Value) -> Result<Value, Error> {
    match value {
        Value::Number(n) => Ok(Value::Int(n.to_int())),
        other => Err(bad_step(TypeRef::Int, &other)),
    }
}

fn int_from_bool(_: &Ir, value: Value) -> Result<Value, Error> {
    match value {
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        other => Err(bad_step(TypeRef::Int, &other)),
    }
}

fn bool_from_number(_: &Ir, value: Value) -> Result<Value, Error> {
    match value {
        Value::Number(n) => Ok(Value::Bool(!n.is_zero())),
        other => Err(bad_step(TypeRef::Bool, &other)),
    }
}

fn bool_from_int(_: &Ir, value: Value) -> Result<Value, Error> {
    match value {
        Value::Int(i) => Ok(Value::Bool(i != 0)),
        other => Err(bad_step(TypeRef::Bool, &other)),
    }
}

fn bad_step(to: TypeRef, from: &Value) -> Error {
    Error::ConversionNotFound {
        to: to.name(),
        from: from.type_ref().name(),
    }
}

impl MathKinds {
    pub(crate) fn register(ir: &mut Ir) -> Result<Self, Error> {
        let schema = &mut ir.schema;

        let expression = Schema::declare("Expression")
            .abstract_kind()
            .register(schema)?;

        let boolean = Schema::declare("Boolean")
            .abstract_kind()
            .extends(&expression)
            .register(schema)?;
        let integer = Schema::declare("Integer")
            .abstract_kind()
            .extends(&expression)
            .register(schema)?;
        let scalar = Schema::declare("Scalar")
            .abstract_kind()
            .extends(&expression)
            .register(schema)?;
        let vector = Schema::declare("Vector")
            .abstract_kind()
            .extends(&expression)
            .register(schema)?;
        let matrix = Schema::declare("Matrix")
            .abstract_kind()
            .extends(&expression)
            .register(schema)?;

        let boolean_t = TypeRef::Kind(boolean.clone());
        let integer_t = TypeRef::Kind(integer.clone());
        let scalar_t = TypeRef::Kind(scalar.clone());
        let vector_t = TypeRef::Kind(vector.clone());
        let matrix_t = TypeRef::Kind(matrix.clone());

        let boolean_constant = Schema::declare("BooleanConstant")
            .extends(&boolean)
            .field("value", TypeRef::Bool)
            .register(schema)?;
        let boolean_inverse = Schema::declare("BooleanInverse")
            .extends(&boolean)
            .field("value", boolean_t.clone())
            .register(schema)?;
        let boolean_and = Schema::declare("BooleanAnd")
            .extends(&boolean)
            .field("left", boolean_t.clone())
            .field("right", boolean_t.clone())
            .register(schema)?;
        let boolean_or = Schema::declare("BooleanOr")
            .extends(&boolean)
            .field("left", boolean_t.clone())
            .field("right", boolean_t.clone())
            .register(schema)?;
        let boolean_from_scalar = Schema::declare("BooleanFromScalar")
            .extends(&boolean)
            .field("value", scalar_t.clone())
            .register(schema)?;
        let boolean_from_integer = Schema::declare("BooleanFromInteger")
            .extends(&boolean)
            .field("value", integer_t.clone())
            .register(schema)?;

        let integer_constant = Schema::declare("IntegerConstant")
            .extends(&integer)
            .field("value", TypeRef::Int)
            .register(schema)?;
        let integer_binary = |name: &str, schema: &mut Schema| {
            Schema::declare(name)
                .extends(&integer)
                .field("left", integer_t.clone())
                .field("right", integer_t.clone())
                .register(schema)
        };
        let integer_add = integer_binary("IntegerAdd", schema)?;
        let integer_subtract = integer_binary("IntegerSubtract", schema)?;
        let integer_multiply = integer_binary("IntegerMultiply", schema)?;
        let integer_divide = integer_binary("IntegerDivide", schema)?;
        let integer_from_scalar = Schema::declare("IntegerFromScalar")
            .extends(&integer)
            .field("value", scalar_t.clone())
            .register(schema)?;
        let integer_from_boolean = Schema::declare("IntegerFromBoolean")
            .extends(&integer)
            .field("value", boolean_t.clone())
            .register(schema)?;

        let scalar_constant = Schema::declare("ScalarConstant")
            .extends(&scalar)
            .field("value", TypeRef::Number)
            .register(schema)?;
        let scalar_binary = |name: &str, schema: &mut Schema| {
            Schema::declare(name)
                .extends(&scalar)
                .field("left", scalar_t.clone())
                .field("right", scalar_t.clone())
                .register(schema)
        };
        let scalar_add = scalar_binary("ScalarAdd", schema)?;
        let scalar_subtract = scalar_binary("ScalarSubtract", schema)?;
        let scalar_multiply = scalar_binary("ScalarMultiply", schema)?;
        let scalar_divide = scalar_binary("ScalarDivide", schema)?;
        let scalar_power = scalar_binary("ScalarPower", schema)?;
        let scalar_from_integer = Schema::declare("ScalarFromInteger")
            .extends(&scalar)
            .field("value", integer_t.clone())
            .register(schema)?;
        let scalar_from_boolean = Schema::declare("ScalarFromBoolean")
            .extends(&scalar)
            .field("value", boolean_t.clone())
            .register(schema)?;

        let comparison = |name: &str, schema: &mut Schema| {
            Schema::declare(name)
                .extends(&boolean)
                .field("left", scalar_t.clone())
                .field("right", scalar_t.clone())
                .register(schema)
        };
        let equals = comparison("Equals", schema)?;
        let not_equals = comparison("NotEquals", schema)?;
        let greater_than = comparison("GreaterThan", schema)?;
        let greater_than_equals = comparison("GreaterThanEquals", schema)?;
        let less_than = comparison("LessThan", schema)?;
        let less_than_equals = comparison("LessThanEquals", schema)?;

        let vector_constant = Schema::declare("VectorConstant")
            .extends(&vector)
            .field_with_default("xvalue", TypeRef::Number, 0.0)
            .field_with_default("yvalue", TypeRef::Number, 0.0)
            .field_with_default("zvalue", TypeRef::Number, 0.0)
            .register(schema)?;
        let vector_from_scalar = Schema::declare("VectorFromScalar")
            .extends(&vector)
            .field("xvalue", scalar_t.clone())
            .field("yvalue", scalar_t.clone())
            .field("zvalue", scalar_t.clone())
            .register(schema)?;
        let vector_component = Schema::declare("VectorComponent")
            .extends(&scalar)
            .field("value", vector_t.clone())
            .field("index", TypeRef::Int)
            .register(schema)?;
        let vector_binary = |name: &str, schema: &mut Schema| {
            Schema::declare(name)
                .extends(&vector)
                .field("left", vector_t.clone())
                .field("right", vector_t.clone())
                .register(schema)
        };
        let vector_add = vector_binary("VectorAdd", schema)?;
        let vector_subtract = vector_binary("VectorSubtract", schema)?;
        let vector_cross = vector_binary("VectorCrossProduct", schema)?;
        let vector_multiply = Schema::declare("VectorMultiply")
            .extends(&vector)
            .field("left", vector_t.clone())
            .field("right", scalar_t.clone())
            .register(schema)?;
        let vector_divide = Schema::declare("VectorDivide")
            .extends(&vector)
            .field("left", vector_t.clone())
            .field("right", scalar_t.clone())
            .register(schema)?;
        let vector_dot = Schema::declare("VectorDotProduct")
            .extends(&scalar)
            .field("left", vector_t.clone())
            .field("right", vector_t.clone())
            .register(schema)?;
        let vector_length = Schema::declare("VectorLength")
            .extends(&scalar)
            .field("value", vector_t.clone())
            .register(schema)?;
        let vector_normalize = Schema::declare("VectorNormalize")
            .extends(&vector)
            .field("value", vector_t.clone())
            .register(schema)?;

        let mut matrix_constant = Schema::declare("MatrixConstant").extends(&matrix);
        for (row, column) in (0..4).cartesian_product(0..4) {
            let default = if row == column { 1.0 } else { 0.0 };
            matrix_constant = matrix_constant.field_with_default(
                &format!("a{}{}", row, column),
                TypeRef::Number,
                default,
            );
        }
        let matrix_constant = matrix_constant.register(schema)?;

        let scalar_zero = ir.build_positional(&scalar_constant, [0.0])?;
        let scalar_one = ir.build_positional(&scalar_constant, [1.0])?;
        let schema = &mut ir.schema;
        let mut matrix_from_scalar = Schema::declare("MatrixFromScalar").extends(&matrix);
        for (row, column) in (0..4).cartesian_product(0..4) {
            let default = if row == column {
                &scalar_one
            } else {
                &scalar_zero
            };
            matrix_from_scalar = matrix_from_scalar.field_with_default(
                &format!("a{}{}", row, column),
                scalar_t.clone(),
                default,
            );
        }
        let matrix_from_scalar = matrix_from_scalar.register(schema)?;

        let matrix_component = Schema::declare("MatrixComponent")
            .extends(&scalar)
            .field("value", matrix_t.clone())
            .field("row", TypeRef::Int)
            .field("column", TypeRef::Int)
            .register(schema)?;
        let matrix_binary = |name: &str, schema: &mut Schema| {
            Schema::declare(name)
                .extends(&matrix)
                .field("left", matrix_t.clone())
                .field("right", matrix_t.clone())
                .register(schema)
        };
        let matrix_add = matrix_binary("MatrixAdd", schema)?;
        let matrix_subtract = matrix_binary("MatrixSubtract", schema)?;
        let matrix_multiply = matrix_binary("MatrixMultiply", schema)?;
        let matrix_scalar_multiply = Schema::declare("MatrixScalarMultiply")
            .extends(&matrix)
            .field("left", matrix_t.clone())
            .field("right", scalar_t.clone())
            .register(schema)?;
        let matrix_divide = Schema::declare("MatrixDivide")
            .extends(&matrix)
            .field("left", matrix_t.clone())
            .field("right", scalar_t.clone())
            .register(schema)?;
        let matrix_transpose = Schema::declare("MatrixTranspose")
            .extends(&matrix)
            .field("value", matrix_t.clone())
            .register(schema)?;
        let matrix_inverse = Schema::declare("MatrixInverse")
            .extends(&matrix)
            .field("value", matrix_t.clone())
            .register(schema)?;
        let matrix_vector_multiply = Schema::declare("MatrixVectorMultiply")
            .extends(&vector)
            .field("left", matrix_t.clone())
            .field("right", vector_t.clone())
            .register(schema)?;
        let vector_matrix_multiply = Schema::declare("VectorMatrixMultiply")
            .extends(&vector)
            .field("left", vector_t.clone())
            .field("right", matrix_t.clone())
            .register(schema)?;

        // Primitive payload conversions first, then constant wrappers,
        // then the cast node kinds.
        ir.register_conversion(TypeRef::Number, TypeRef::Int, Rc::new(number_from_int));
        ir.register_conversion(TypeRef::Number, TypeRef::Bool, Rc::new(number_from_bool));
        ir.register_conversion(TypeRef::Int, TypeRef::Number, Rc::new(int_from_number));
        ir.register_conversion(TypeRef::Int, TypeRef::Bool, Rc::new(int_from_bool));
        ir.register_conversion(TypeRef::Bool, TypeRef::Number, Rc::new(bool_from_number));
        ir.register_conversion(TypeRef::Bool, TypeRef::Int, Rc::new(bool_from_int));

        for (constant, from) in [
            (&scalar_constant, TypeRef::Number),
            (&integer_constant, TypeRef::Int),
            (&boolean_constant, TypeRef::Bool),
        ] {
            ir.register_conversion(
                TypeRef::Kind((*constant).clone()),
                from,
                crate::conversions::constructor(constant),
            );
        }

        for (cast, from) in [
            (&scalar_from_integer, &integer_t),
            (&scalar_from_boolean, &boolean_t),
            (&integer_from_scalar, &scalar_t),
            (&integer_from_boolean, &boolean_t),
            (&boolean_from_scalar, &scalar_t),
            (&boolean_from_integer, &integer_t),
        ] {
            ir.register_conversion(
                TypeRef::Kind((*cast).clone()),
                from.clone(),
                crate::conversions::constructor(cast),
            );
        }

        Ok(MathKinds {
            expression,
            boolean,
            boolean_constant,
            boolean_inverse,
            boolean_and,
            boolean_or,
            boolean_from_scalar,
            boolean_from_integer,
            integer,
            integer_constant,
            integer_add,
            integer_subtract,
            integer_multiply,
            integer_divide,
            integer_from_scalar,
            integer_from_boolean,
            scalar,
            scalar_constant,
            scalar_add,
            scalar_subtract,
            scalar_multiply,
            scalar_divide,
            scalar_power,
            scalar_from_integer,
            scalar_from_boolean,
            equals,
            not_equals,
            greater_than,
            greater_than_equals,
            less_than,
            less_than_equals,
            vector,
            vector_constant,
            vector_from_scalar,
            vector_component,
            vector_add,
            vector_subtract,
            vector_multiply,
            vector_divide,
            vector_dot,
            vector_cross,
            vector_length,
            vector_normalize,
            matrix,
            matrix_constant,
            matrix_from_scalar,
            matrix_component,
            matrix_add,
            matrix_subtract,
            matrix_multiply,
            matrix_scalar_multiply,
            matrix_divide,
            matrix_transpose,
            matrix_inverse,
            matrix_vector_multiply,
            vector_matrix_multiply,
        })
    }
}

impl CoreIr {
    /// Converts any supported payload or node to a Scalar.
    pub fn scalar(&self, value: impl Into<Value>) -> Result<Expr, Error> {
        self.ir().convert_to_node(&self.math.scalar, value.into())
    }

    pub fn integer(&self, value: impl Into<Value>) -> Result<Expr, Error> {
        self.ir().convert_to_node(&self.math.integer, value.into())
    }

    pub fn boolean(&self, value: impl Into<Value>) -> Result<Expr, Error> {
        self.ir().convert_to_node(&self.math.boolean, value.into())
    }

    pub fn scalar_const(&self, value: f64) -> Result<Expr, Error> {
        self.build_positional(&self.math.scalar_constant, [value])
    }

    pub fn int_const(&self, value: i64) -> Result<Expr, Error> {
        self.build_positional(&self.math.integer_constant, [value])
    }

    pub fn bool_const(&self, value: bool) -> Result<Expr, Error> {
        self.build_positional(&self.math.boolean_constant, [value])
    }

    pub fn vector(&self, x: f64, y: f64, z: f64) -> Result<Expr, Error> {
        self.build_positional(&self.math.vector_constant, [x, y, z])
    }

    /// A vector recomposed from three scalar expressions.
    pub fn vector_from(&self, x: &Expr, y: &Expr, z: &Expr) -> Result<Expr, Error> {
        self.build_positional(&self.math.vector_from_scalar, [x, y, z])
    }

    pub fn matrix(&self, values: [f64; 16]) -> Result<Expr, Error> {
        self.build_positional(&self.math.matrix_constant, values)
    }

    pub fn identity_matrix(&self) -> Result<Expr, Error> {
        self.build(&self.math.matrix_constant, Args::new())
    }

    pub fn zero_matrix(&self) -> Result<Expr, Error> {
        self.matrix([0.0; 16])
    }

    /// Type-promoting addition: integers stay integers, everything else
    /// goes through the scalar domain unless both sides are vectors or
    /// matrices.
    pub fn add(&self, left: &Expr, right: &Expr) -> Result<Expr, Error> {
        let k = &self.math;
        let kind = if left.is_a(&k.vector) && right.is_a(&k.vector) {
            &k.vector_add
        } else if left.is_a(&k.matrix) && right.is_a(&k.matrix) {
            &k.matrix_add
        } else if left.is_a(&k.integer) && right.is_a(&k.integer) {
            &k.integer_add
        } else {
            &k.scalar_add
        };
        self.binary(kind, left, right)
    }

    pub fn sub(&self, left: &Expr, right: &Expr) -> Result<Expr, Error> {
        let k = &self.math;
        let kind = if left.is_a(&k.vector) && right.is_a(&k.vector) {
            &k.vector_subtract
        } else if left.is_a(&k.matrix) && right.is_a(&k.matrix) {
            &k.matrix_subtract
        } else if left.is_a(&k.integer) && right.is_a(&k.integer) {
            &k.integer_subtract
        } else {
            &k.scalar_subtract
        };
        self.binary(kind, left, right)
    }

    pub fn mul(&self, left: &Expr, right: &Expr) -> Result<Expr, Error> {
        let k = &self.math;
        let kind = if left.is_a(&k.matrix) && right.is_a(&k.matrix) {
            &k.matrix_multiply
        } else if left.is_a(&k.matrix) && right.is_a(&k.vector) {
            &k.matrix_vector_multiply
        } else if left.is_a(&k.vector) && right.is_a(&k.matrix) {
            &k.vector_matrix_multiply
        } else if left.is_a(&k.vector) {
            &k.vector_multiply
        } else if left.is_a(&k.matrix) {
            &k.matrix_scalar_multiply
        } else if left.is_a(&k.integer) && right.is_a(&k.integer) {
            &k.integer_multiply
        } else {
            &k.scalar_multiply
        };
        self.binary(kind, left, right)
    }

    pub fn div(&self, left: &Expr, right: &Expr) -> Result<Expr, Error> {
        let k = &self.math;
        let kind = if left.is_a(&k.vector) {
            &k.vector_divide
        } else if left.is_a(&k.matrix) {
            &k.matrix_divide
        } else if left.is_a(&k.integer) && right.is_a(&k.integer) {
            &k.integer_divide
        } else {
            &k.scalar_divide
        };
        self.binary(kind, left, right)
    }

    pub fn pow(&self, left: &Expr, right: &Expr) -> Result<Expr, Error> {
        self.binary(&self.math.scalar_power, left, right)
    }

    pub fn eq(&self, left: &Expr, right: &Expr) -> Result<Expr, Error> {
        self.binary(&self.math.equals, left, right)
    }

    pub fn ne(&self, left: &Expr, right: &Expr) -> Result<Expr, Error> {
        self.binary(&self.math.not_equals, left, right)
    }

    pub fn gt(&self, left: &Expr, right: &Expr) -> Result<Expr, Error> {
        self.binary(&self.math.greater_than, left, right)
    }

    pub fn ge(&self, left: &Expr, right: &Expr) -> Result<Expr, Error> {
        self.binary(&self.math.greater_than_equals, left, right)
    }

    pub fn lt(&self, left: &Expr, right: &Expr) -> Result<Expr, Error> {
        self.binary(&self.math.less_than, left, right)
    }

    pub fn le(&self, left: &Expr, right: &Expr) -> Result<Expr, Error> {
        self.binary(&self.math.less_than_equals, left, right)
    }

    pub fn and_(&self, left: &Expr, right: &Expr) -> Result<Expr, Error> {
        self.binary(&self.math.boolean_and, left, right)
    }

    pub fn or_(&self, left: &Expr, right: &Expr) -> Result<Expr, Error> {
        self.binary(&self.math.boolean_or, left, right)
    }

    pub fn not_(&self, value: &Expr) -> Result<Expr, Error> {
        self.unary(&self.math.boolean_inverse, value)
    }

    pub fn component(&self, vector: &Expr, index: i64) -> Result<Expr, Error> {
        self.build(
            &self.math.vector_component,
            Args::new().arg(vector).arg(index),
        )
    }

    pub fn x(&self, vector: &Expr) -> Result<Expr, Error> {
        self.component(vector, 0)
    }

    pub fn y(&self, vector: &Expr) -> Result<Expr, Error> {
        self.component(vector, 1)
    }

    pub fn z(&self, vector: &Expr) -> Result<Expr, Error> {
        self.component(vector, 2)
    }

    pub fn dot(&self, left: &Expr, right: &Expr) -> Result<Expr, Error> {
        self.binary(&self.math.vector_dot, left, right)
    }

    pub fn cross(&self, left: &Expr, right: &Expr) -> Result<Expr, Error> {
        self.binary(&self.math.vector_cross, left, right)
    }

    pub fn length(&self, vector: &Expr) -> Result<Expr, Error> {
        self.unary(&self.math.vector_length, vector)
    }

    pub fn normalize(&self, vector: &Expr) -> Result<Expr, Error> {
        self.unary(&self.math.vector_normalize, vector)
    }

    pub fn matrix_component(&self, matrix: &Expr, row: i64, column: i64) -> Result<Expr, Error> {
        self.build(
            &self.math.matrix_component,
            Args::new().arg(matrix).arg(row).arg(column),
        )
    }

    pub fn transpose(&self, matrix: &Expr) -> Result<Expr, Error> {
        self.unary(&self.math.matrix_transpose, matrix)
    }

    pub fn inverse(&self, matrix: &Expr) -> Result<Expr, Error> {
        self.unary(&self.math.matrix_inverse, matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_promotes_integer_operand() {
        let core = CoreIr::new().unwrap();
        let int = core.int_const(2).unwrap();
        let sum = core.add(&int, &core.scalar_const(1.5).unwrap()).unwrap();

        assert_eq!(sum.kind(), &core.math.scalar_add);
        // The integer operand is lifted through a cast node.
        assert_eq!(sum.node(0).kind(), &core.math.scalar_from_integer);
    }

    #[test]
    fn test_integer_operands_stay_integer() {
        let core = CoreIr::new().unwrap();
        let sum = core
            .add(&core.int_const(1).unwrap(), &core.int_const(2).unwrap())
            .unwrap();
        assert_eq!(sum.kind(), &core.math.integer_add);
    }

    #[test]
    fn test_mul_picks_domain_kind() {
        let core = CoreIr::new().unwrap();
        let m = core.identity_matrix().unwrap();
        let v = core.vector(1.0, 0.0, 0.0).unwrap();
        let s = core.scalar_const(2.0).unwrap();

        assert_eq!(
            core.mul(&m, &m).unwrap().kind(),
            &core.math.matrix_multiply
        );
        assert_eq!(
            core.mul(&m, &v).unwrap().kind(),
            &core.math.matrix_vector_multiply
        );
        assert_eq!(
            core.mul(&v, &m).unwrap().kind(),
            &core.math.vector_matrix_multiply
        );
        assert_eq!(
            core.mul(&v, &s).unwrap().kind(),
            &core.math.vector_multiply
        );
        assert_eq!(
            core.mul(&m, &s).unwrap().kind(),
            &core.math.matrix_scalar_multiply
        );
    }

    #[test]
    fn test_identity_matrix_defaults() {
        let core = CoreIr::new().unwrap();
        let m = core.identity_matrix().unwrap();
        assert_eq!(m.field("a00"), Some(&Value::from(1.0)));
        assert_eq!(m.field("a01"), Some(&Value::from(0.0)));
        assert_eq!(m.field("a33"), Some(&Value::from(1.0)));
    }

    #[test]
    fn test_boolean_conversion_from_payloads() {
        let core = CoreIr::new().unwrap();
        let b = core.boolean(true).unwrap();
        assert_eq!(b.kind(), &core.math.boolean_constant);

        // A scalar node lifts through the cast kind.
        let b = core.boolean(&core.scalar_const(2.0).unwrap()).unwrap();
        assert_eq!(b.kind(), &core.math.boolean_from_scalar);
    }
}
