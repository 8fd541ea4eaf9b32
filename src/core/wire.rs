use std::{fmt, ops::Deref};

/// Flat index into the append-only table of gate outputs.
///
/// A gate at position `w` in the program may only reference wires `< w`;
/// the gate list is topologically pre-sorted by construction, so there is
/// no separate wire allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Wire(pub usize);

impl Wire {
    /// Name of this wire in the circuit description language.
    pub fn name(&self) -> String {
        format!("w{}", self.0)
    }
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for Wire {
    type Target = usize;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<usize> for Wire {
    fn from(index: usize) -> Self {
        Wire(index)
    }
}
