//! Link-time registry of operations marked `#[counted]`.

/// An operation carrying the `#[counted]` marker.
///
/// Submitted by the attribute macro; collected with [`registered_operations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountedOperation {
    pub name: &'static str,
    pub module: &'static str,
}

impl CountedOperation {
    pub const fn new(name: &'static str, module: &'static str) -> Self {
        Self { name, module }
    }
}

inventory::collect!(CountedOperation);

/// Every `#[counted]` operation linked into this binary, sorted by name.
pub fn registered_operations() -> Vec<&'static CountedOperation> {
    let mut ops: Vec<_> = inventory::iter::<CountedOperation>.into_iter().collect();
    ops.sort_by(|a, b| a.name.cmp(b.name).then(a.module.cmp(b.module)));
    ops
}
