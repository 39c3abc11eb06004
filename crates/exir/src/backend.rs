use crate::error::Error;
use crate::value::Value;

/// Capability surface a backend result must provide. A backend registry
/// is a `Registry<R>` for some `R: Materialized`; its contexts chain
/// under a folding context so handlers only ever see simplified nodes.
pub trait Materialized: Clone {
    /// Whether the result can change after materialization, as opposed to
    /// a constant baked in at build time.
    fn is_varying(&self) -> bool;

    /// Writes this result into `target`.
    fn assign(&self, target: &Self) -> Result<(), Error>;

    /// Addresses a sub-component of a compound result by index.
    fn child(&self, index: usize) -> Result<Self, Error>;

    /// Reads the current value back out of the backend.
    fn read(&self) -> Result<Value, Error>;
}
