//! Multi-hop pointer paths in a foreign process.

use crate::descriptor::ProcessDescriptor;
use crate::memory::{Address, RemoteProcess};

/// A base address plus an ordered chain of signed offsets describing a
/// multi-hop pointer path.
///
/// The path carries no process affinity: it can be rebuilt between ticks and
/// reused across processes that share a layout. Each hop reads an
/// address-sized value, except the last offset, which is only added to the
/// final address. That lets the last element point at a field inside a
/// structure instead of at another pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeepPointer {
    pub base: Address,
    pub offsets: Vec<i64>,
}

impl DeepPointer {
    pub fn new(base: Address, offsets: impl Into<Vec<i64>>) -> Self {
        Self {
            base,
            offsets: offsets.into(),
        }
    }

    /// Walk the path and return the final address, or 0 if any hop reads a
    /// null or unmapped pointer.
    ///
    /// With no offsets the base is returned as-is without touching the
    /// process. Otherwise the base is dereferenced, every offset but the
    /// last is applied and dereferenced in turn, and the last offset is
    /// added without a final dereference. Intermediate addresses are never
    /// cached; the target mutates its memory at will, so each call starts
    /// from the base.
    pub fn dereference<P: RemoteProcess>(&self, process: &ProcessDescriptor<P>) -> Address {
        let Some((&last, rest)) = self.offsets.split_last() else {
            return self.base;
        };

        let mut address = process.read_address(self.base);
        if address == 0 {
            return 0;
        }

        for &offset in rest {
            address = process.read_address(address.wrapping_add_signed(offset));
            if address == 0 {
                return 0;
            }
        }

        address.wrapping_add_signed(last)
    }
}
