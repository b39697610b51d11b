//! Word-addressed data memory over a bounded address window.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// First valid data address
pub const ADDR_LO: u32 = 600;
/// Last valid data address
pub const ADDR_HI: u32 = 636;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryError {
    #[error("address {0} is outside the data memory window")]
    OutOfWindow(u32),
    #[error("address {0} is not aligned to a 4-byte boundary")]
    Misaligned(u32),
}

/// Flat word-addressed memory. Every in-window word reads as zero until it
/// is written. Read by the DS stage for loads, written by the DS stage for
/// stores.
#[derive(Debug, Default, Clone)]
pub struct DataMemory {
    data: HashMap<u32, i32>,
}

fn check_address(addr: u32) -> Result<(), MemoryError> {
    if !(ADDR_LO..=ADDR_HI).contains(&addr) {
        Err(MemoryError::OutOfWindow(addr))
    } else if addr % 4 != 0 {
        Err(MemoryError::Misaligned(addr))
    } else {
        Ok(())
    }
}

impl DataMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, addr: u32) -> Result<i32, MemoryError> {
        check_address(addr)?;
        Ok(self.data.get(&addr).copied().unwrap_or(0))
    }

    pub fn write(&mut self, addr: u32, value: i32) -> Result<(), MemoryError> {
        check_address(addr)?;
        self.data.insert(addr, value);
        Ok(())
    }
}

impl fmt::Display for DataMemory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Data memory:")?;
        for addr in (ADDR_LO..=ADDR_HI).step_by(4) {
            let value = self.data.get(&addr).copied().unwrap_or(0);
            writeln!(f, "{addr}: {value}")?;
        }
        Ok(())
    }
}
