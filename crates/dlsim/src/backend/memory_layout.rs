use crate::HashMap;
use crate::ir::{AbsoluteAddr, Program};

/// Slot assignment for every net of a flattened program.
///
/// The stable region and the working region share this layout; a slot holds
/// one full-width net.
#[derive(Debug, Clone)]
pub struct MemoryLayout {
    pub offsets: HashMap<AbsoluteAddr, usize>,
    /// Width of each slot, indexed by slot.
    pub widths: Vec<usize>,
    /// Net stored in each slot, indexed by slot.
    pub addrs: Vec<AbsoluteAddr>,
}

impl MemoryLayout {
    pub fn build(program: &Program) -> Self {
        let mut offsets = HashMap::default();
        let mut widths = Vec::new();
        let mut addrs = Vec::new();
        // Instance then declaration order keeps top-level ports in the first slots.
        for addr in program.all_addrs() {
            let width = program
                .get_variable_info(&addr)
                .map(|info| info.width)
                .unwrap_or(1);
            offsets.insert(addr, widths.len());
            widths.push(width);
            addrs.push(addr);
        }
        Self {
            offsets,
            widths,
            addrs,
        }
    }

    pub fn slot(&self, addr: &AbsoluteAddr) -> Option<usize> {
        self.offsets.get(addr).copied()
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }
}
