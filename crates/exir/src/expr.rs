use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use rustc_hash::FxHasher;
use smallvec::SmallVec;

use crate::schema::Kind;
use crate::value::Value;

pub(crate) type FieldValues = SmallVec<[Value; 4]>;

#[derive(Debug)]
struct ExprData {
    kind: Kind,
    values: FieldValues,
    // Structural hash, computed on first use.
    hash: Cell<Option<u64>>,
}

/// An immutable expression node. Cloning shares the allocation; equality
/// and hashing are structural over `(kind, field values)`, so two
/// separately built but identical subtrees compare equal and collide in
/// caches.
#[derive(Debug, Clone)]
pub struct Expr(Rc<ExprData>);

impl Expr {
    pub(crate) fn from_parts(kind: Kind, values: FieldValues) -> Self {
        Expr(Rc::new(ExprData {
            kind,
            values,
            hash: Cell::new(None),
        }))
    }

    pub fn kind(&self) -> &Kind {
        &self.0.kind
    }

    pub fn is_a(&self, kind: &Kind) -> bool {
        self.0.kind.is_a(kind)
    }

    pub fn values(&self) -> &[Value] {
        &self.0.values
    }

    pub fn value(&self, index: usize) -> &Value {
        &self.0.values[index]
    }

    /// The node held by the field at `index`.
    ///
    /// Construction coerces every field to its declared type, so a field
    /// declared with a kind always holds a node.
    pub fn node(&self, index: usize) -> &Expr {
        match &self.0.values[index] {
            Value::Node(node) => node,
            value => unreachable!("field {} of {} holds {}", index, self.0.kind, value),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0
            .kind
            .field_index(name)
            .map(|index| &self.0.values[index])
    }

    pub fn node_field(&self, name: &str) -> Option<&Expr> {
        self.field(name).and_then(Value::as_node)
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = &Expr> {
        self.0.values.iter().filter_map(Value::as_node)
    }

    fn cached_hash(&self) -> u64 {
        if let Some(hash) = self.0.hash.get() {
            return hash;
        }
        let mut hasher = FxHasher::default();
        self.0.kind.id().hash(&mut hasher);
        for value in &self.0.values {
            value.hash(&mut hasher);
        }
        let hash = hasher.finish();
        self.0.hash.set(Some(hash));
        hash
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        self.0.kind == other.0.kind && self.0.values == other.0.values
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.cached_hash());
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.0.kind)?;
        for (index, value) in self.0.values.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::value::TypeRef;
    use smallvec::smallvec;

    fn scalar_constant() -> Kind {
        let mut schema = Schema::new();
        let root = Schema::declare("Expression")
            .abstract_kind()
            .register(&mut schema)
            .unwrap();
        Schema::declare("ScalarConstant")
            .extends(&root)
            .field("value", TypeRef::Number)
            .register(&mut schema)
            .unwrap()
    }

    #[test]
    fn test_structural_equality() {
        let kind = scalar_constant();
        let a = Expr::from_parts(kind.clone(), smallvec![Value::from(1.5)]);
        let b = Expr::from_parts(kind.clone(), smallvec![Value::from(1.5)]);
        let c = Expr::from_parts(kind, smallvec![Value::from(2.0)]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_equal_nodes_hash_alike() {
        use rustc_hash::FxHashSet;

        let kind = scalar_constant();
        let a = Expr::from_parts(kind.clone(), smallvec![Value::from(1.5)]);
        let b = Expr::from_parts(kind, smallvec![Value::from(1.5)]);

        let mut set = FxHashSet::default();
        set.insert(a);
        assert!(set.contains(&b));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_field_lookup() {
        let kind = scalar_constant();
        let node = Expr::from_parts(kind, smallvec![Value::from(4.0)]);
        assert_eq!(node.field("value"), Some(&Value::from(4.0)));
        assert_eq!(node.field("missing"), None);
    }

    #[test]
    fn test_display() {
        let kind = scalar_constant();
        let node = Expr::from_parts(kind, smallvec![Value::from(4.0)]);
        assert_eq!(node.to_string(), "ScalarConstant(4)");
    }
}
