use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::Error;
use crate::expr::Expr;
use crate::ir::Ir;
use crate::schema::{Kind, KindId};

pub type HandlerFn<R> = Rc<dyn Fn(&mut Context<R>, &Expr) -> Result<R, Error>>;

pub struct Handler<R> {
    func: HandlerFn<R>,
    propagate: bool,
}

impl<R> Clone for Handler<R> {
    fn clone(&self) -> Self {
        Self {
            func: Rc::clone(&self.func),
            propagate: self.propagate,
        }
    }
}

/// Handlers keyed by node kind. Resolution walks a node's ancestor list
/// in specificity order, so a handler registered on an abstract kind
/// covers every descendant that has no closer match; results are
/// memoized per kind.
pub struct Registry<R> {
    ir: Rc<Ir>,
    handlers: FxHashMap<KindId, Handler<R>>,
    default: Option<Handler<R>>,
    resolved: RefCell<FxHashMap<KindId, Option<Handler<R>>>>,
}

impl<R> Registry<R> {
    pub fn new(ir: Rc<Ir>) -> Self {
        Self {
            ir,
            handlers: FxHashMap::default(),
            default: None,
            resolved: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn ir(&self) -> &Rc<Ir> {
        &self.ir
    }

    /// Registers an eager handler: the engine resolves the node's
    /// children before the handler runs.
    pub fn register<F>(&mut self, kind: &Kind, func: F)
    where
        F: Fn(&mut Context<R>, &Expr) -> Result<R, Error> + 'static,
    {
        self.register_with(kind, true, func);
    }

    /// Registers a handler with an explicit propagate flag. A
    /// non-propagating handler resolves its own children, so operands it
    /// never asks for are never evaluated.
    pub fn register_with<F>(&mut self, kind: &Kind, propagate: bool, func: F)
    where
        F: Fn(&mut Context<R>, &Expr) -> Result<R, Error> + 'static,
    {
        self.resolved.borrow_mut().clear();
        self.handlers.insert(
            kind.id(),
            Handler {
                func: Rc::new(func),
                propagate,
            },
        );
    }

    pub fn register_default<F>(&mut self, propagate: bool, func: F)
    where
        F: Fn(&mut Context<R>, &Expr) -> Result<R, Error> + 'static,
    {
        self.resolved.borrow_mut().clear();
        self.default = Some(Handler {
            func: Rc::new(func),
            propagate,
        });
    }

    fn resolve(&self, kind: &Kind) -> Result<Handler<R>, Error> {
        if let Some(cached) = self.resolved.borrow().get(&kind.id()) {
            return cached
                .clone()
                .ok_or_else(|| Error::UnsupportedExpression(kind.name().clone()));
        }
        let found = kind
            .ancestors()
            .iter()
            .find_map(|id| self.handlers.get(id).cloned())
            .or_else(|| self.default.clone());
        self.resolved.borrow_mut().insert(kind.id(), found.clone());
        found.ok_or_else(|| Error::UnsupportedExpression(kind.name().clone()))
    }

    pub fn context(self: &Rc<Self>) -> Context<R>
    where
        R: Clone,
    {
        Context::new(Rc::clone(self))
    }
}

/// A node-rewriting stage: anything a context can chain under.
pub trait Rewrite {
    fn get(&mut self, node: &Expr) -> Result<Expr, Error>;
}

/// One evaluation of a graph against a registry. Results are memoized by
/// node structure, so structurally equal subtrees evaluate once per
/// context.
pub struct Context<R> {
    registry: Rc<Registry<R>>,
    cache: FxHashMap<Expr, R>,
    parent: Option<Box<dyn Rewrite>>,
}

impl<R: Clone> Context<R> {
    pub fn new(registry: Rc<Registry<R>>) -> Self {
        Self {
            registry,
            cache: FxHashMap::default(),
            parent: None,
        }
    }

    /// Chains this context under a parent stage: the parent rewrites each
    /// node first and this context evaluates the rewritten node.
    pub fn with_parent(registry: Rc<Registry<R>>, parent: impl Rewrite + 'static) -> Self {
        Self {
            registry,
            cache: FxHashMap::default(),
            parent: Some(Box::new(parent)),
        }
    }

    pub fn ir(&self) -> Rc<Ir> {
        Rc::clone(self.registry.ir())
    }

    pub fn get(&mut self, node: &Expr) -> Result<R, Error> {
        let node = match self.parent.as_mut() {
            Some(parent) => parent.get(node)?,
            None => node.clone(),
        };
        if let Some(result) = self.cache.get(&node) {
            return Ok(result.clone());
        }
        self.evaluate(node)
    }

    /// Explicit-stack traversal. Discovery pushes children of propagating
    /// handlers behind a seen-set; handlers then run in reverse discovery
    /// order so children are usually resolved before the parents that
    /// pushed them. Handlers fetch children through `get`, which falls
    /// back to recursive evaluation when a shared node was discovered
    /// ahead of one of its parents.
    fn evaluate(&mut self, root: Expr) -> Result<R, Error> {
        let mut pending = vec![root.clone()];
        let mut seen: FxHashSet<Expr> = FxHashSet::default();
        let mut order: Vec<(Expr, Handler<R>)> = Vec::new();

        while let Some(node) = pending.pop() {
            if self.cache.contains_key(&node) || !seen.insert(node.clone()) {
                continue;
            }
            let handler = self.registry.resolve(node.kind())?;
            if handler.propagate {
                pending.extend(node.child_nodes().cloned());
            }
            order.push((node, handler));
        }

        for (node, handler) in order.into_iter().rev() {
            if self.cache.contains_key(&node) {
                continue;
            }
            let result = (handler.func)(self, &node)?;
            self.cache.insert(node, result);
        }

        match self.cache.get(&root) {
            Some(result) => Ok(result.clone()),
            None => Err(Error::UnsupportedExpression(root.kind().name().clone())),
        }
    }
}

impl Rewrite for Context<Expr> {
    fn get(&mut self, node: &Expr) -> Result<Expr, Error> {
        Context::get(self, node)
    }
}

/// Rewrite stages applied left to right.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Rewrite>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: impl Rewrite + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }
}

impl Rewrite for Pipeline {
    fn get(&mut self, node: &Expr) -> Result<Expr, Error> {
        let mut node = node.clone();
        for stage in &mut self.stages {
            node = stage.get(&node)?;
        }
        Ok(node)
    }
}
