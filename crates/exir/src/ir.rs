use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::conversions::{ConversionGraph, ConvertFn};
use crate::error::Error;
use crate::expr::{Expr, FieldValues};
use crate::schema::{Kind, Schema};
use crate::value::{TypeRef, Value};

/// Arguments for node construction: positionals bound to fields in
/// declaration order, then keywords and declared defaults for the rest.
#[derive(Debug, Default, Clone)]
pub struct Args {
    positional: SmallVec<[Value; 4]>,
    keywords: SmallVec<[(SmolStr, Value); 2]>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            keywords: SmallVec::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.keywords.push((SmolStr::new(name), value.into()));
        self
    }
}

/// Schema plus conversion graph: everything construction needs.
#[derive(Default)]
pub struct Ir {
    pub schema: Schema,
    pub conversions: ConversionGraph,
}

impl Ir {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_conversion(&mut self, to: TypeRef, from: TypeRef, func: ConvertFn) {
        self.conversions.register(to, from, func);
    }

    /// Coerces `value` to `to` along the shortest registered path.
    pub fn convert(&self, to: &TypeRef, value: Value) -> Result<Value, Error> {
        let from = value.type_ref();
        let path = self.conversions.path(to, &from)?;
        let mut value = value;
        for func in path.iter() {
            value = func(self, value)?;
        }
        Ok(value)
    }

    pub fn is_convertible(&self, to: &TypeRef, from: &TypeRef) -> bool {
        self.conversions.is_convertible(to, from)
    }

    /// Converts to a kind and returns the resulting node.
    pub fn convert_to_node(&self, to: &Kind, value: Value) -> Result<Expr, Error> {
        let to = TypeRef::Kind(to.clone());
        match self.convert(&to, value)? {
            Value::Node(node) => Ok(node),
            other => Err(Error::ConversionNotFound {
                to: to.name(),
                from: other.type_ref().name(),
            }),
        }
    }

    /// Builds a node, binding and coercing `args` against the kind's
    /// fields.
    pub fn build(&self, kind: &Kind, args: Args) -> Result<Expr, Error> {
        if kind.is_abstract() {
            return Err(Error::AbstractInstantiation(kind.name().clone()));
        }
        let fields = kind.fields();
        let Args {
            positional,
            mut keywords,
        } = args;
        if positional.len() > fields.len() {
            return Err(Error::Arity {
                kind: kind.name().clone(),
                expected: fields.len(),
                got: positional.len(),
            });
        }

        let mut positional = positional.into_iter();
        let mut values: FieldValues = SmallVec::with_capacity(fields.len());
        for field in fields {
            let raw = if let Some(value) = positional.next() {
                value
            } else if let Some(index) = keywords
                .iter()
                .position(|(name, _)| name == field.name.as_str())
            {
                keywords.remove(index).1
            } else if let Some(default) = &field.default {
                default.clone()
            } else {
                return Err(Error::MissingField {
                    kind: kind.name().clone(),
                    field: field.name.clone(),
                });
            };
            values.push(self.convert(&field.ty, raw)?);
        }

        if let Some((name, _)) = keywords.first() {
            return Err(Error::UnexpectedKeyword {
                kind: kind.name().clone(),
                keyword: name.clone(),
            });
        }

        Ok(Expr::from_parts(kind.clone(), values))
    }

    pub fn build_positional<I>(&self, kind: &Kind, values: I) -> Result<Expr, Error>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.build(kind, Args::positional(values))
    }

    /// The derived output node `expr.name`. A field with the same name
    /// shadows the output and is returned directly.
    pub fn output(&self, expr: &Expr, name: &str) -> Result<Expr, Error> {
        if let Some(value) = expr.field(name) {
            return value.as_node().cloned().ok_or_else(|| Error::UnknownOutput {
                kind: expr.kind().name().clone(),
                output: SmolStr::new(name),
            });
        }
        let kind = self.schema.output_kind(expr.kind(), name)?;
        self.build_positional(&kind, [Value::Node(expr.clone())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversions::constructor;
    use crate::number::Number;
    use rstest::*;
    use std::rc::Rc;

    struct Fixture {
        ir: Ir,
        scalar: Kind,
        constant: Kind,
        add: Kind,
        offset: Kind,
    }

    fn fixture() -> Fixture {
        let mut ir = Ir::new();
        let root = Schema::declare("Expression")
            .abstract_kind()
            .register(&mut ir.schema)
            .unwrap();
        let scalar = Schema::declare("Scalar")
            .abstract_kind()
            .extends(&root)
            .register(&mut ir.schema)
            .unwrap();
        let constant = Schema::declare("ScalarConstant")
            .extends(&scalar)
            .field("value", TypeRef::Number)
            .register(&mut ir.schema)
            .unwrap();
        let add = Schema::declare("ScalarAdd")
            .extends(&scalar)
            .field("left", TypeRef::Kind(scalar.clone()))
            .field("right", TypeRef::Kind(scalar.clone()))
            .register(&mut ir.schema)
            .unwrap();
        let offset = Schema::declare("ScalarOffset")
            .extends(&scalar)
            .field("value", TypeRef::Kind(scalar.clone()))
            .field_with_default("offset", TypeRef::Number, 1.0)
            .register(&mut ir.schema)
            .unwrap();

        ir.register_conversion(
            TypeRef::Kind(constant.clone()),
            TypeRef::Number,
            constructor(&constant),
        );
        ir.register_conversion(
            TypeRef::Number,
            TypeRef::Int,
            Rc::new(|_, value| match value {
                Value::Int(i) => Ok(Value::Number(Number::new(i as f64))),
                other => Ok(other),
            }),
        );

        Fixture {
            ir,
            scalar,
            constant,
            add,
            offset,
        }
    }

    #[test]
    fn test_positional_binding_coerces_fields() {
        let f = fixture();
        let node = f.ir.build_positional(&f.add, [1.0, 2.0]).unwrap();

        assert_eq!(node.kind(), &f.add);
        assert_eq!(node.node(0).kind(), &f.constant);
        assert_eq!(node.node(0).value(0), &Value::from(1.0));
        assert!(node.node(1).is_a(&f.scalar));
    }

    #[test]
    fn test_keyword_and_default_binding() {
        let f = fixture();
        let explicit = f
            .ir
            .build(&f.offset, Args::new().arg(3.0).kwarg("offset", 2.0))
            .unwrap();
        assert_eq!(explicit.value(1), &Value::from(2.0));

        let defaulted = f.ir.build_positional(&f.offset, [3.0]).unwrap();
        assert_eq!(defaulted.value(1), &Value::from(1.0));
    }

    #[test]
    fn test_abstract_instantiation_fails() {
        let f = fixture();
        assert_eq!(
            f.ir.build(&f.scalar, Args::new()).unwrap_err(),
            Error::AbstractInstantiation("Scalar".into())
        );
    }

    #[test]
    fn test_too_many_positionals() {
        let f = fixture();
        assert_eq!(
            f.ir.build_positional(&f.constant, [1.0, 2.0]).unwrap_err(),
            Error::Arity {
                kind: "ScalarConstant".into(),
                expected: 1,
                got: 2,
            }
        );
    }

    #[rstest]
    #[case::unknown_name("wrong")]
    #[case::already_bound("value")]
    fn test_unexpected_keyword(#[case] keyword: &str) {
        let f = fixture();
        assert_eq!(
            f.ir.build(&f.constant, Args::new().arg(1.0).kwarg(keyword, 2.0))
                .unwrap_err(),
            Error::UnexpectedKeyword {
                kind: "ScalarConstant".into(),
                keyword: keyword.into(),
            }
        );
    }

    #[test]
    fn test_missing_field() {
        let f = fixture();
        assert_eq!(
            f.ir.build_positional(&f.add, [1.0]).unwrap_err(),
            Error::MissingField {
                kind: "ScalarAdd".into(),
                field: "right".into(),
            }
        );
    }

    #[test]
    fn test_unconvertible_field_value() {
        let f = fixture();
        let err = f.ir.build_positional(&f.constant, ["nope"]).unwrap_err();
        assert_eq!(
            err,
            Error::ConversionNotFound {
                to: "Number".into(),
                from: "String".into(),
            }
        );
    }

    #[test]
    fn test_abstract_kind_as_conversion_target() {
        let f = fixture();
        // Int -> Number -> ScalarConstant, then a free upcast to Scalar.
        let node = f.ir.convert_to_node(&f.scalar, Value::Int(3)).unwrap();
        assert_eq!(node.kind(), &f.constant);
        assert_eq!(node.value(0), &Value::from(3.0));
    }
}
