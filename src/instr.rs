//! Instruction categories, precise operations and the decoded record.
//!
//! Decoding is infallible: a word that matches no known encoding is tagged
//! [`Op::Error`] and flows through the pipeline as a NOP, observable only
//! through the disassembler.

use crate::fields::*;
use crate::opcodes::*;
use std::fmt;

/// Instruction category, selected by opcode bits 6..0. An all-zero word is
/// `Blank`: a placeholder that occupies program space but never decodes
/// into an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Blank,
    Jal,
    Jalr,
    RegReg,
    Store,
    Load,
    RegImm,
    Branch,
    Other,
}

/// Precise operation, including the encoding aliases: J is JAL with rd = 0,
/// RET is JALR with rd = 0, rs1 = 1, imm = 0, and NOP is ADDI with all-zero
/// fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Jal,
    J,
    Jalr,
    Ret,
    Sw,
    Lw,
    Slt,
    Sll,
    Srl,
    Sub,
    Add,
    Nop,
    And,
    Or,
    Xor,
    Addi,
    Slti,
    Beq,
    Bne,
    Bge,
    Blt,
    Blank,
    Error,
}

/// A decoded instruction. The immediate is sign-extended here, once, and
/// never re-extended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instr {
    pub word: u32,
    pub kind: Kind,
    pub op: Op,
    pub rs1: u8,
    pub rs2: u8,
    pub rd: u8,
    pub imm: i32,
}

impl Instr {
    pub fn decode(word: u32) -> Self {
        if word == 0 {
            return Self {
                word,
                kind: Kind::Blank,
                op: Op::Blank,
                rs1: 0,
                rs2: 0,
                rd: 0,
                imm: 0,
            };
        }

        let rd = rd!(word);
        let rs1 = rs1!(word);
        let rs2 = rs2!(word);
        let funct3 = funct3!(word);
        let funct7 = funct7!(word);

        let (kind, op, imm) = match opcode!(word) {
            OP_JAL => {
                let imm = sign_extend(jal_offset!(word), 20);
                let op = if rd == 0 { Op::J } else { Op::Jal };
                (Kind::Jal, op, imm)
            }
            OP_JALR => {
                let imm = sign_extend(imm_itype!(word), 11);
                let op = if rd == 0 && rs1 == 1 && imm == 0 {
                    Op::Ret
                } else {
                    Op::Jalr
                };
                (Kind::Jalr, op, imm)
            }
            OP_REG_REG => {
                let op = match funct3 {
                    FUNCT3_SLL => Op::Sll,
                    FUNCT3_SLT => Op::Slt,
                    FUNCT3_XOR => Op::Xor,
                    FUNCT3_SRL => Op::Srl,
                    FUNCT3_OR => Op::Or,
                    FUNCT3_AND => Op::And,
                    FUNCT3_ADD_SUB => match funct7 {
                        FUNCT7_ADD => Op::Add,
                        FUNCT7_SUB => Op::Sub,
                        _ => Op::Error,
                    },
                    _ => Op::Error,
                };
                (Kind::RegReg, op, 0)
            }
            OP_STORE => {
                let imm = sign_extend(imm_stype!(word), 11);
                (Kind::Store, Op::Sw, imm)
            }
            OP_LOAD => {
                let imm = sign_extend(imm_itype!(word), 11);
                (Kind::Load, Op::Lw, imm)
            }
            OP_IMM => {
                let imm = sign_extend(imm_itype!(word), 11);
                let op = match funct3 {
                    FUNCT3_ADDI => {
                        if rd == 0 && rs1 == 0 && imm == 0 {
                            Op::Nop
                        } else {
                            Op::Addi
                        }
                    }
                    FUNCT3_SLTI => Op::Slti,
                    _ => Op::Error,
                };
                (Kind::RegImm, op, imm)
            }
            OP_BRANCH => {
                let imm = sign_extend(imm_btype!(word), 12);
                let op = match funct3 {
                    FUNCT3_BEQ => Op::Beq,
                    FUNCT3_BNE => Op::Bne,
                    FUNCT3_BLT => Op::Blt,
                    FUNCT3_BGE => Op::Bge,
                    _ => Op::Error,
                };
                (Kind::Branch, op, imm)
            }
            _ => (Kind::Other, Op::Error, 0),
        };

        Self {
            word,
            kind,
            op,
            rs1,
            rs2,
            rd,
            imm,
        }
    }

    /// Rebuild the instruction word from the decoded fields. For every
    /// non-error decode this reproduces the original word.
    pub fn encode(&self) -> u32 {
        use crate::encode::{btype, itype, jtype, rtype, stype};
        match self.kind {
            Kind::Blank => 0,
            Kind::Jal => jtype(self.imm, self.rd, OP_JAL),
            Kind::Jalr => itype(self.imm, self.rs1, 0, self.rd, OP_JALR),
            Kind::RegReg => {
                let (funct7, funct3) = match self.op {
                    Op::Add => (FUNCT7_ADD, FUNCT3_ADD_SUB),
                    Op::Sub => (FUNCT7_SUB, FUNCT3_ADD_SUB),
                    Op::Sll => (0, FUNCT3_SLL),
                    Op::Slt => (0, FUNCT3_SLT),
                    Op::Xor => (0, FUNCT3_XOR),
                    Op::Srl => (0, FUNCT3_SRL),
                    Op::Or => (0, FUNCT3_OR),
                    Op::And => (0, FUNCT3_AND),
                    _ => return self.word,
                };
                rtype(funct7, self.rs2, self.rs1, funct3, self.rd, OP_REG_REG)
            }
            Kind::Store => stype(self.imm, self.rs2, self.rs1, FUNCT3_SW, OP_STORE),
            Kind::Load => itype(self.imm, self.rs1, FUNCT3_LW, self.rd, OP_LOAD),
            Kind::RegImm => {
                let funct3 = match self.op {
                    Op::Slti => FUNCT3_SLTI,
                    _ => FUNCT3_ADDI,
                };
                itype(self.imm, self.rs1, funct3, self.rd, OP_IMM)
            }
            Kind::Branch => {
                let funct3 = match self.op {
                    Op::Beq => FUNCT3_BEQ,
                    Op::Bne => FUNCT3_BNE,
                    Op::Blt => FUNCT3_BLT,
                    Op::Bge => FUNCT3_BGE,
                    _ => return self.word,
                };
                btype(self.imm, self.rs2, self.rs1, funct3, OP_BRANCH)
            }
            Kind::Other => self.word,
        }
    }

    /// Which of {rs1, rs2} the operation reads in the RF stage.
    pub fn reads(&self) -> [bool; 2] {
        match self.op {
            Op::Jalr | Op::Ret | Op::Lw | Op::Addi | Op::Slti => [true, false],
            Op::Sw | Op::Beq | Op::Bne | Op::Bge | Op::Blt => [true, true],
            Op::Add | Op::Sub | Op::Slt | Op::Sll | Op::Srl | Op::And | Op::Or | Op::Xor => {
                [true, true]
            }
            Op::Jal | Op::J | Op::Nop | Op::Blank | Op::Error => [false, false],
        }
    }

    /// The register this instruction produces a value for, as seen by the
    /// hazard unit. Loads and ALU operations qualify; jump links do not
    /// (everything that could consume them is squashed), and NOP never
    /// computes.
    pub fn produces(&self) -> Option<u8> {
        match self.op {
            Op::Add
            | Op::Sub
            | Op::Slt
            | Op::Sll
            | Op::Srl
            | Op::And
            | Op::Or
            | Op::Xor
            | Op::Addi
            | Op::Slti
            | Op::Lw => Some(self.rd),
            _ => None,
        }
    }

    /// Whether WB writes this instruction's result to the register file.
    /// The discard-link aliases J and RET have no destination, even though
    /// their encodings carry rd = 0.
    pub fn writes_register(&self) -> bool {
        match self.op {
            Op::Nop | Op::Blank | Op::Error | Op::J | Op::Ret => false,
            _ => matches!(
                self.kind,
                Kind::RegImm | Kind::RegReg | Kind::Load | Kind::Jal | Kind::Jalr
            ),
        }
    }

    fn mnemonic(&self) -> &'static str {
        match self.op {
            Op::Jal => "JAL",
            Op::J => "J",
            Op::Jalr => "JALR",
            Op::Ret => "RET",
            Op::Sw => "SW",
            Op::Lw => "LW",
            Op::Slt => "SLT",
            Op::Sll => "SLL",
            Op::Srl => "SRL",
            Op::Sub => "SUB",
            Op::Add => "ADD",
            Op::Nop => "NOP",
            Op::And => "AND",
            Op::Or => "OR",
            Op::Xor => "XOR",
            Op::Addi => "ADDI",
            Op::Slti => "SLTI",
            Op::Beq => "BEQ",
            Op::Bne => "BNE",
            Op::Bge => "BGE",
            Op::Blt => "BLT",
            Op::Blank => "NOP",
            Op::Error => "<invalid>",
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.mnemonic();
        match self.op {
            Op::Nop | Op::Ret | Op::Blank | Op::Error => write!(f, "{m}"),
            Op::J => write!(f, "{m} #{}", self.imm),
            Op::Jal => write!(f, "{m} R{}, #{}", self.rd, self.imm),
            Op::Jalr => write!(f, "{m} R{}, R{}, #{}", self.rd, self.rs1, self.imm),
            Op::Lw => write!(f, "{m} R{}, {}(R{})", self.rd, self.imm, self.rs1),
            Op::Sw => write!(f, "{m} R{}, {}(R{})", self.rs2, self.imm, self.rs1),
            Op::Addi | Op::Slti => {
                write!(f, "{m} R{}, R{}, #{}", self.rd, self.rs1, self.imm)
            }
            Op::Beq | Op::Bne | Op::Bge | Op::Blt => {
                write!(f, "{m} R{}, R{}, #{}", self.rs1, self.rs2, self.imm)
            }
            _ => write!(f, "{m} R{}, R{}, R{}", self.rd, self.rs1, self.rs2),
        }
    }
}

/// One line of the disassembly listing: raw bits, address, decoded text.
/// Blank words print their literal value.
pub fn disassemble_line(word: u32, addr: u32) -> String {
    let instr = Instr::decode(word);
    let text = if instr.kind == Kind::Blank {
        word.to_string()
    } else {
        instr.to_string()
    };
    format!("{word:032b}\t{addr}\t{text}")
}
