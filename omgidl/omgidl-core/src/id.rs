use std::fmt::{Display, Formatter, Result};

/// Stable index of a definition in the symbol table arena.
///
/// A forward declaration allocates its id immediately; the later full
/// definition is written into the same slot, so ids held by earlier
/// references stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(u32);

impl DefId {
    /// The global scope.
    pub const ROOT: DefId = DefId(0);

    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for DefId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "#{}", self.0)
    }
}
