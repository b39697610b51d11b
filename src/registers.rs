//! The architectural integer register file.

use itertools::Itertools;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    #[error("encountered invalid register index {0}")]
    IndexOutOfRange(u8),
}

/// 32 named 32-bit integer slots. Read by the RF stage, written by the WB
/// stage. Register zero is an ordinary slot here: nothing is hard-wired.
#[derive(Debug, Default, Clone)]
pub struct RegisterFile {
    registers: [i32; 32],
}

impl RegisterFile {
    pub fn new() -> Self {
        Self { registers: [0; 32] }
    }

    pub fn read(&self, which: u8) -> Result<i32, RegisterError> {
        if which < 32 {
            Ok(self.registers[which as usize])
        } else {
            Err(RegisterError::IndexOutOfRange(which))
        }
    }

    pub fn write(&mut self, which: u8, value: i32) -> Result<(), RegisterError> {
        if which < 32 {
            self.registers[which as usize] = value;
            Ok(())
        } else {
            Err(RegisterError::IndexOutOfRange(which))
        }
    }
}

impl fmt::Display for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Integer registers:")?;
        for row in &(0..32usize).chunks(4) {
            for n in row {
                write!(f, "R{n}\t{}\t", self.registers[n])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_read_write() {
        let mut regs = RegisterFile::new();
        regs.write(3, -7).unwrap();
        assert_eq!(regs.read(3).unwrap(), -7);
        assert_eq!(regs.read(4).unwrap(), 0);
    }

    #[test]
    fn check_register_zero_is_writable() {
        let mut regs = RegisterFile::new();
        regs.write(0, 42).unwrap();
        assert_eq!(regs.read(0).unwrap(), 42);
    }

    #[test]
    fn check_out_of_range_index() {
        let mut regs = RegisterFile::new();
        assert_eq!(regs.read(32), Err(RegisterError::IndexOutOfRange(32)));
        assert_eq!(regs.write(40, 1), Err(RegisterError::IndexOutOfRange(40)));
    }

    #[test]
    fn check_display_layout() {
        let regs = RegisterFile::new();
        let text = regs.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Integer registers:");
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[1], "R0\t0\tR1\t0\tR2\t0\tR3\t0\t");
        assert_eq!(lines[8], "R28\t0\tR29\t0\tR30\t0\tR31\t0\t");
    }
}
