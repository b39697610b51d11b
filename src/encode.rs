//! Instruction word builders, plus one macro per mnemonic.
//!
//! The macros keep test programs readable: `addi!(1, 0, 5)` is
//! `ADDI R1, R0, #5`. They are also the other half of the decoder's
//! round-trip property.

/// Make an I-type instruction word
pub fn itype(imm: i32, rs1: u8, funct3: u32, rd: u8, opcode: u32) -> u32 {
    ((imm as u32) & 0xfff) << 20
        | (rs1 as u32) << 15
        | funct3 << 12
        | (rd as u32) << 7
        | opcode
}

/// Make an R-type instruction word
pub fn rtype(funct7: u32, rs2: u8, rs1: u8, funct3: u32, rd: u8, opcode: u32) -> u32 {
    funct7 << 25
        | (rs2 as u32) << 20
        | (rs1 as u32) << 15
        | funct3 << 12
        | (rd as u32) << 7
        | opcode
}

/// Make an S-type instruction word, splitting the immediate over its
/// two fields
pub fn stype(imm: i32, rs2: u8, rs1: u8, funct3: u32, opcode: u32) -> u32 {
    let imm = imm as u32;
    ((imm >> 5) & 0x7f) << 25
        | (rs2 as u32) << 20
        | (rs1 as u32) << 15
        | funct3 << 12
        | (imm & 0x1f) << 7
        | opcode
}

/// Make a B-type instruction word. The offset must be even; its bit 0 is
/// not encoded.
pub fn btype(offset: i32, rs2: u8, rs1: u8, funct3: u32, opcode: u32) -> u32 {
    let imm = offset as u32;
    ((imm >> 12) & 1) << 31
        | ((imm >> 5) & 0x3f) << 25
        | (rs2 as u32) << 20
        | (rs1 as u32) << 15
        | funct3 << 12
        | ((imm >> 1) & 0xf) << 8
        | ((imm >> 11) & 1) << 7
        | opcode
}

/// Make a J-type instruction word. The offset must be even; its bit 0 is
/// not encoded.
pub fn jtype(offset: i32, rd: u8, opcode: u32) -> u32 {
    let imm = offset as u32;
    ((imm >> 20) & 1) << 31
        | ((imm >> 1) & 0x3ff) << 21
        | ((imm >> 11) & 1) << 20
        | ((imm >> 12) & 0xff) << 12
        | (rd as u32) << 7
        | opcode
}

#[macro_export]
macro_rules! addi {
    ($rd:expr, $rs1:expr, $imm:expr) => {
        $crate::encode::itype($imm, $rs1, $crate::opcodes::FUNCT3_ADDI, $rd, $crate::opcodes::OP_IMM)
    };
}
pub use addi;

#[macro_export]
macro_rules! slti {
    ($rd:expr, $rs1:expr, $imm:expr) => {
        $crate::encode::itype($imm, $rs1, $crate::opcodes::FUNCT3_SLTI, $rd, $crate::opcodes::OP_IMM)
    };
}
pub use slti;

/// NOP is ADDI with all-zero fields
#[macro_export]
macro_rules! nop {
    () => {
        $crate::encode::itype(0, 0, $crate::opcodes::FUNCT3_ADDI, 0, $crate::opcodes::OP_IMM)
    };
}
pub use nop;

#[macro_export]
macro_rules! add {
    ($rd:expr, $rs1:expr, $rs2:expr) => {
        $crate::encode::rtype(
            $crate::opcodes::FUNCT7_ADD,
            $rs2,
            $rs1,
            $crate::opcodes::FUNCT3_ADD_SUB,
            $rd,
            $crate::opcodes::OP_REG_REG,
        )
    };
}
pub use add;

#[macro_export]
macro_rules! sub {
    ($rd:expr, $rs1:expr, $rs2:expr) => {
        $crate::encode::rtype(
            $crate::opcodes::FUNCT7_SUB,
            $rs2,
            $rs1,
            $crate::opcodes::FUNCT3_ADD_SUB,
            $rd,
            $crate::opcodes::OP_REG_REG,
        )
    };
}
pub use sub;

#[macro_export]
macro_rules! sll {
    ($rd:expr, $rs1:expr, $rs2:expr) => {
        $crate::encode::rtype(0, $rs2, $rs1, $crate::opcodes::FUNCT3_SLL, $rd, $crate::opcodes::OP_REG_REG)
    };
}
pub use sll;

#[macro_export]
macro_rules! slt {
    ($rd:expr, $rs1:expr, $rs2:expr) => {
        $crate::encode::rtype(0, $rs2, $rs1, $crate::opcodes::FUNCT3_SLT, $rd, $crate::opcodes::OP_REG_REG)
    };
}
pub use slt;

#[macro_export]
macro_rules! xor {
    ($rd:expr, $rs1:expr, $rs2:expr) => {
        $crate::encode::rtype(0, $rs2, $rs1, $crate::opcodes::FUNCT3_XOR, $rd, $crate::opcodes::OP_REG_REG)
    };
}
pub use xor;

#[macro_export]
macro_rules! srl {
    ($rd:expr, $rs1:expr, $rs2:expr) => {
        $crate::encode::rtype(0, $rs2, $rs1, $crate::opcodes::FUNCT3_SRL, $rd, $crate::opcodes::OP_REG_REG)
    };
}
pub use srl;

#[macro_export]
macro_rules! or {
    ($rd:expr, $rs1:expr, $rs2:expr) => {
        $crate::encode::rtype(0, $rs2, $rs1, $crate::opcodes::FUNCT3_OR, $rd, $crate::opcodes::OP_REG_REG)
    };
}
pub use or;

#[macro_export]
macro_rules! and {
    ($rd:expr, $rs1:expr, $rs2:expr) => {
        $crate::encode::rtype(0, $rs2, $rs1, $crate::opcodes::FUNCT3_AND, $rd, $crate::opcodes::OP_REG_REG)
    };
}
pub use and;

#[macro_export]
macro_rules! lw {
    ($rd:expr, $base:expr, $offset:expr) => {
        $crate::encode::itype($offset, $base, $crate::opcodes::FUNCT3_LW, $rd, $crate::opcodes::OP_LOAD)
    };
}
pub use lw;

#[macro_export]
macro_rules! sw {
    ($src:expr, $base:expr, $offset:expr) => {
        $crate::encode::stype($offset, $src, $base, $crate::opcodes::FUNCT3_SW, $crate::opcodes::OP_STORE)
    };
}
pub use sw;

#[macro_export]
macro_rules! beq {
    ($rs1:expr, $rs2:expr, $offset:expr) => {
        $crate::encode::btype($offset, $rs2, $rs1, $crate::opcodes::FUNCT3_BEQ, $crate::opcodes::OP_BRANCH)
    };
}
pub use beq;

#[macro_export]
macro_rules! bne {
    ($rs1:expr, $rs2:expr, $offset:expr) => {
        $crate::encode::btype($offset, $rs2, $rs1, $crate::opcodes::FUNCT3_BNE, $crate::opcodes::OP_BRANCH)
    };
}
pub use bne;

#[macro_export]
macro_rules! blt {
    ($rs1:expr, $rs2:expr, $offset:expr) => {
        $crate::encode::btype($offset, $rs2, $rs1, $crate::opcodes::FUNCT3_BLT, $crate::opcodes::OP_BRANCH)
    };
}
pub use blt;

#[macro_export]
macro_rules! bge {
    ($rs1:expr, $rs2:expr, $offset:expr) => {
        $crate::encode::btype($offset, $rs2, $rs1, $crate::opcodes::FUNCT3_BGE, $crate::opcodes::OP_BRANCH)
    };
}
pub use bge;

#[macro_export]
macro_rules! jal {
    ($rd:expr, $offset:expr) => {
        $crate::encode::jtype($offset, $rd, $crate::opcodes::OP_JAL)
    };
}
pub use jal;

/// J is JAL with destination register zero
#[macro_export]
macro_rules! j {
    ($offset:expr) => {
        $crate::encode::jtype($offset, 0, $crate::opcodes::OP_JAL)
    };
}
pub use j;

#[macro_export]
macro_rules! jalr {
    ($rd:expr, $base:expr, $offset:expr) => {
        $crate::encode::itype($offset, $base, 0, $rd, $crate::opcodes::OP_JALR)
    };
}
pub use jalr;

/// RET is JALR x0, x1, 0
#[macro_export]
macro_rules! ret {
    () => {
        $crate::encode::itype(0, 1, 0, 0, $crate::opcodes::OP_JALR)
    };
}
pub use ret;
