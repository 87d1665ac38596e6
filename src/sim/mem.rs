//! Memory handling for the UVM simulator.
//!
//! This module consists of:
//! - [`Mem`]: The memory.
//! - [`MEM_SIZE`]: The number of words the memory holds.

use super::SimErr;

/// The number of words in the memory.
pub const MEM_SIZE: usize = 2048;

/// The memory. This stores [`MEM_SIZE`] 64-bit words, all zero at creation.
///
/// Words are read with [`Mem::read`] and written with [`Mem::write`].
/// Both functions verify the address is in bounds. A write additionally
/// reduces its value modulo 2^64 before storing it, so values beyond the
/// 64-bit unsigned range (and negative values, which wrap from the top)
/// can be written; a read never transforms the stored value.
#[derive(Debug, Clone)]
pub struct Mem {
    data: Box<[u64; MEM_SIZE]>,
}

impl Mem {
    /// Creates a zero-filled memory.
    pub fn new() -> Self {
        Mem {
            data: Box::new([0; MEM_SIZE]),
        }
    }

    /// Gets the word at the provided address, failing if the address is out of bounds.
    pub fn read(&self, addr: i64) -> Result<u64, SimErr> {
        usize::try_from(addr)
            .ok()
            .and_then(|i| self.data.get(i))
            .copied()
            .ok_or(SimErr::AccessOutOfBounds(addr))
    }

    /// Sets the word at the provided address, failing if the address is out of bounds.
    ///
    /// The stored word is `value mod 2^64`.
    pub fn write(&mut self, addr: i64, value: i128) -> Result<(), SimErr> {
        let slot = usize::try_from(addr)
            .ok()
            .and_then(|i| self.data.get_mut(i))
            .ok_or(SimErr::AccessOutOfBounds(addr))?;

        *slot = value as u64;
        Ok(())
    }

    /// The full contents of the memory, in address order.
    pub fn as_slice(&self) -> &[u64] {
        &*self.data
    }
}

impl Default for Mem {
    fn default() -> Self {
        Mem::new()
    }
}
