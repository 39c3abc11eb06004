use std::fmt;

use smol_str::SmolStr;

use crate::expr::Expr;
use crate::number::Number;
use crate::schema::Kind;

/// Rotation application order for Euler angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotateOrder {
    Xyz,
    Yxz,
    Xzy,
    Zyx,
    Yzx,
    Zxy,
}

impl fmt::Display for RotateOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RotateOrder::Xyz => "XYZ",
            RotateOrder::Yxz => "YXZ",
            RotateOrder::Xzy => "XZY",
            RotateOrder::Zyx => "ZYX",
            RotateOrder::Yzx => "YZX",
            RotateOrder::Zxy => "ZXY",
        };
        write!(f, "{}", name)
    }
}

/// A field payload: either a primitive value or a child node.
#[derive(Debug, Clone, PartialEq, Hash)]
pub enum Value {
    Number(Number),
    Int(i64),
    Bool(bool),
    String(SmolStr),
    RotateOrder(RotateOrder),
    Node(Expr),
}

impl Eq for Value {}

impl Value {
    pub fn type_ref(&self) -> TypeRef {
        match self {
            Value::Number(_) => TypeRef::Number,
            Value::Int(_) => TypeRef::Int,
            Value::Bool(_) => TypeRef::Bool,
            Value::String(_) => TypeRef::String,
            Value::RotateOrder(_) => TypeRef::RotateOrder,
            Value::Node(node) => TypeRef::Kind(node.kind().clone()),
        }
    }

    pub fn as_node(&self) -> Option<&Expr> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Int(i) => write!(f, "{}", i),
            Value::Bool(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::RotateOrder(o) => write!(f, "{}", o),
            Value::Node(node) => write!(f, "{}", node),
        }
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::new(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(SmolStr::new(value))
    }
}

impl From<RotateOrder> for Value {
    fn from(value: RotateOrder) -> Self {
        Value::RotateOrder(value)
    }
}

impl From<Expr> for Value {
    fn from(value: Expr) -> Self {
        Value::Node(value)
    }
}

impl From<&Expr> for Value {
    fn from(value: &Expr) -> Self {
        Value::Node(value.clone())
    }
}

/// A vertex in the conversion graph: a primitive payload type or a node
/// kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Number,
    Int,
    Bool,
    String,
    RotateOrder,
    Kind(Kind),
}

impl TypeRef {
    pub fn name(&self) -> SmolStr {
        match self {
            TypeRef::Number => SmolStr::new_static("Number"),
            TypeRef::Int => SmolStr::new_static("Int"),
            TypeRef::Bool => SmolStr::new_static("Bool"),
            TypeRef::String => SmolStr::new_static("String"),
            TypeRef::RotateOrder => SmolStr::new_static("RotateOrder"),
            TypeRef::Kind(kind) => kind.name().clone(),
        }
    }

    /// Self first, then parents to the root. Primitives have no hierarchy.
    pub fn ancestor_chain(&self) -> Vec<TypeRef> {
        match self {
            TypeRef::Kind(kind) => kind.ancestor_kinds().map(TypeRef::Kind).collect(),
            other => vec![other.clone()],
        }
    }

    pub fn is_subtype_of(&self, other: &TypeRef) -> bool {
        match (self, other) {
            (TypeRef::Kind(a), TypeRef::Kind(b)) => a.is_a(b),
            _ => self == other,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
