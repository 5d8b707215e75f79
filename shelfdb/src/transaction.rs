/// A single write or delete within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// An ordered set of operations committed as one atomic unit.
///
/// Each public store operation builds exactly one batch and hands it to
/// [`Backend::apply`](crate::Backend::apply); the operation's future resolves
/// only once the whole batch is applied, so callers never observe a partial
/// write. Order matters: a `Put` after a `Delete` of the same key leaves the
/// key present.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    ops: Vec<Op>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(Op::Put { key, value });
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.push(Op::Delete { key });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Consumes the batch and returns its operations in insertion order.
    pub fn into_ops(self) -> Vec<Op> {
        self.ops
    }
}
