//! Opcode and function-field constants for the supported instruction subset.

pub const OP_JAL: u32 = 0x6f;
pub const OP_JALR: u32 = 0x67;
pub const OP_REG_REG: u32 = 0x33;
pub const OP_STORE: u32 = 0x23;
pub const OP_LOAD: u32 = 0x03;
pub const OP_IMM: u32 = 0x13;
pub const OP_BRANCH: u32 = 0x63;

pub const FUNCT3_ADD_SUB: u32 = 0;
pub const FUNCT3_SLL: u32 = 1;
pub const FUNCT3_SLT: u32 = 2;
pub const FUNCT3_XOR: u32 = 4;
pub const FUNCT3_SRL: u32 = 5;
pub const FUNCT3_OR: u32 = 6;
pub const FUNCT3_AND: u32 = 7;

// Note: this corpus encodes SUB with funct7 = 8, not the canonical 0x20.
pub const FUNCT7_ADD: u32 = 0;
pub const FUNCT7_SUB: u32 = 8;

pub const FUNCT3_ADDI: u32 = 0;
pub const FUNCT3_SLTI: u32 = 2;

pub const FUNCT3_BEQ: u32 = 0;
pub const FUNCT3_BNE: u32 = 1;
pub const FUNCT3_BLT: u32 = 4;
pub const FUNCT3_BGE: u32 = 5;

pub const FUNCT3_LW: u32 = 2;
pub const FUNCT3_SW: u32 = 2;
