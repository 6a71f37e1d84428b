use std::fmt;

/// LIFO stack of saved snapshots used by `#PUSHS` and `#POPS`.
mod stack;

pub use stack::{SnapshotError, SnapshotStack};

/// A complete 64 KiB memory image.
///
/// Addresses wrap at the top of memory, so reading eight bytes from `$FFFC`
/// continues at `$0000`.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    data: Box<[u8; Snapshot::SIZE]>,
}

impl Snapshot {
    pub const SIZE: usize = 64 * 1024;

    pub fn new() -> Self {
        Self {
            data: Box::new([0; Snapshot::SIZE]),
        }
    }

    /// Build a snapshot with `bytes` loaded at `org`.
    #[tracing::instrument(skip(bytes))]
    pub fn from_bytes(org: u16, bytes: &[u8]) -> Self {
        let mut snapshot = Self::new();
        snapshot.load(org, bytes);
        snapshot
    }

    pub fn load(&mut self, start_address: u16, data: &[u8]) {
        let mut address = start_address as u32;
        for byte in data {
            self.poke(address, *byte);
            address += 1;
        }
    }

    /// Reads a byte from memory.
    pub fn peek(&self, address: u32) -> u8 {
        self.data[address as usize % Snapshot::SIZE]
    }

    /// Writes a byte to memory.
    pub fn poke(&mut self, address: u32, value: u8) {
        self.data[address as usize % Snapshot::SIZE] = value;
    }

    /// Read `count` bytes starting at `address`, `step` bytes apart.
    pub fn read_strided(&self, address: u32, step: u32, count: u32) -> Vec<u8> {
        (0..count)
            .map(|n| self.peek(address.wrapping_add(n.wrapping_mul(step))))
            .collect()
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let used = self.data.iter().filter(|b| **b != 0).count();
        write!(f, "Snapshot({} non-zero bytes)", used)
    }
}
