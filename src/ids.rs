use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::handler::Handler;

/// Strongly typed identifier of one top-level dispatch, backed by ULID.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct DispatchId(pub ulid::Ulid);

impl DispatchId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    pub fn from_ulid(id: ulid::Ulid) -> Self {
        Self(id)
    }
}

impl Default for DispatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DispatchId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identity of a handler instance: the address of its shared
/// allocation.
///
/// Every `Arc` clone of one instance yields the same id, two instances of
/// the same class never do while both are alive. An id can only be reused
/// after every strong and weak reference to the old instance is gone.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct HandlerId(usize);

impl HandlerId {
    pub(crate) fn of(inner: &Arc<dyn Handler>) -> Self {
        Self(Arc::as_ptr(inner) as *const () as usize)
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl Display for HandlerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "handler#{:x}", self.0)
    }
}
