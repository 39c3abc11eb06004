use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::Error;
use crate::ir::Ir;
use crate::schema::Kind;
use crate::value::{TypeRef, Value};

/// One conversion step. Steps may build nodes, so they get the [`Ir`]
/// back.
pub type ConvertFn = Rc<dyn Fn(&Ir, Value) -> Result<Value, Error>>;

/// A conversion that wraps its input in a node of the given kind.
pub fn constructor(kind: &Kind) -> ConvertFn {
    let kind = kind.clone();
    Rc::new(move |ir, value| {
        ir.build_positional(&kind, [value]).map(Value::Node)
    })
}

struct Edge {
    to: TypeRef,
    func: ConvertFn,
}

type PathCacheKey = (TypeRef, TypeRef);

/// Directed graph of registered coercions between payload types and node
/// kinds. Upcasts along the kind hierarchy are implicit and free.
#[derive(Default)]
pub struct ConversionGraph {
    // Edge lists keep registration order; ties between equal-length paths
    // resolve to the earliest registration.
    edges: FxHashMap<TypeRef, Vec<Edge>>,
    path_cache: RefCell<FxHashMap<PathCacheKey, Option<Rc<[ConvertFn]>>>>,
}

impl ConversionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a conversion step from `from` to `to`. Re-registering an
    /// existing edge replaces its function in place, keeping its original
    /// position. Any memoized paths are discarded.
    pub fn register(&mut self, to: TypeRef, from: TypeRef, func: ConvertFn) {
        self.path_cache.borrow_mut().clear();
        let edges = self.edges.entry(from).or_default();
        if let Some(edge) = edges.iter_mut().find(|edge| edge.to == to) {
            edge.func = func;
        } else {
            edges.push(Edge { to, func });
        }
    }

    /// The shortest conversion path from `from` to `to`, memoized.
    /// Failures are memoized too, and reported as the recoverable
    /// [`Error::ConversionNotFound`].
    pub fn path(&self, to: &TypeRef, from: &TypeRef) -> Result<Rc<[ConvertFn]>, Error> {
        let key = (to.clone(), from.clone());
        if let Some(cached) = self.path_cache.borrow().get(&key) {
            return cached.clone().ok_or_else(|| Self::not_found(to, from));
        }
        let found = self.search(to, from);
        self.path_cache.borrow_mut().insert(key, found.clone());
        found.ok_or_else(|| Self::not_found(to, from))
    }

    pub fn is_convertible(&self, to: &TypeRef, from: &TypeRef) -> bool {
        self.path(to, from).is_ok()
    }

    fn not_found(to: &TypeRef, from: &TypeRef) -> Error {
        Error::ConversionNotFound {
            to: to.name(),
            from: from.name(),
        }
    }

    /// Breadth-first search. A visited type reaches the destination as
    /// soon as the destination appears in its ancestor chain, and its
    /// outgoing edges are the edges registered on any of its ancestors,
    /// most specific first.
    fn search(&self, to: &TypeRef, from: &TypeRef) -> Option<Rc<[ConvertFn]>> {
        let mut queue: VecDeque<(TypeRef, Vec<ConvertFn>)> = VecDeque::new();
        let mut visited: FxHashSet<TypeRef> = FxHashSet::default();
        visited.insert(from.clone());
        queue.push_back((from.clone(), Vec::new()));

        while let Some((current, path)) = queue.pop_front() {
            if current.is_subtype_of(to) {
                return Some(path.into());
            }
            for ancestor in current.ancestor_chain() {
                let Some(edges) = self.edges.get(&ancestor) else {
                    continue;
                };
                for edge in edges {
                    if visited.insert(edge.to.clone()) {
                        let mut next = path.clone();
                        next.push(Rc::clone(&edge.func));
                        queue.push_back((edge.to.clone(), next));
                    }
                }
            }
        }
        None
    }
}
