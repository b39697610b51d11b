//! Named inter-stage pipeline registers.
//!
//! Each latch carries a value between two consecutive stages for one
//! cycle. A latch holds its last value until the producing stage acts
//! again; the IR clears when IS empties.

#[derive(Debug, Default, Clone)]
pub struct Latches {
    /// IF/IS.NPC — the next program counter
    pub npc: u32,
    /// IS/ID.IR — the raw instruction register
    pub ir: u32,
    /// RF/EX.A — first register read
    pub a: i32,
    /// RF/EX.B — second register read
    pub b: i32,
    /// EX/DF.ALUout — ALU result or effective address
    pub alu_out: i32,
    /// EX/DF.B — store data, after any forwarding
    pub fwd_b: i32,
    /// DS/WB.ALUout-LMD — final result or load memory data
    pub result: i32,
}
