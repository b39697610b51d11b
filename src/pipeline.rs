//! The pipeline execution engine.
//!
//! Eight in-order stages advance one instruction per slot per cycle.
//! Within a cycle the stage actions run in reverse pipeline order (WB
//! first), so a stage consuming values produced by its successor observes
//! the successor's state from the end of the previous cycle. Writes into
//! the register file happen only in WB and reads only in RF; the gap in
//! between is covered by the forwarding network.

pub mod hazard;
pub mod latches;
pub mod stage;
mod trace;

use crate::instr::{Instr, Kind, Op};
use crate::loader::ProgramImage;
use crate::memory::DataMemory;
use crate::registers::{RegisterError, RegisterFile};
use self::hazard::{ForwardPath, Forwarding, StallState, Stats};
use self::latches::Latches;
use self::stage::{InFlight, Src, Stage};
use std::io;
use thiserror::Error;

/// Cycles a load-use consumer is held before it may advance again
const LOAD_USE_STALL: u32 = 2;
/// Length of the control-stall window opened by a taken branch or jump
const BRANCH_STALL_WINDOW: u32 = 8;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("register access failed: {0}")]
    Register(#[from] RegisterError),
    #[error("could not write trace output: {0}")]
    Io(#[from] io::Error),
}

/// The whole simulator: pipeline slots, latches, architectural state,
/// stall and forwarding bookkeeping, and the program image.
#[derive(Debug)]
pub struct Simulator {
    cycle: u64,
    pc: u32,
    slots: [Option<InFlight>; 8],
    latches: Latches,
    regs: RegisterFile,
    mem: DataMemory,
    program: ProgramImage,
    stall: StallState,
    stats: Stats,
    forwarding: Forwarding,
    /// Control-transfer target, applied at the next cycle's PC step
    redirect: Option<u32>,
    /// Last address issued into IF; stops a stalled PC re-issuing it
    last_issue: Option<u32>,
    /// Nullified memory accesses seen so far
    violations: u64,
}

impl Simulator {
    pub fn new(program: ProgramImage) -> Self {
        let base = program.base();
        Self {
            cycle: 0,
            pc: base.wrapping_sub(4),
            slots: Default::default(),
            latches: Latches {
                npc: base,
                ..Default::default()
            },
            regs: RegisterFile::new(),
            mem: DataMemory::new(),
            program,
            stall: StallState::default(),
            stats: Stats::default(),
            forwarding: Forwarding::default(),
            redirect: None,
            last_issue: None,
            violations: 0,
        }
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    pub fn memory(&self) -> &DataMemory {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut DataMemory {
        &mut self.mem
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// How many loads or stores were nullified for violating the data
    /// memory window.
    pub fn memory_violations(&self) -> u64 {
        self.violations
    }

    /// The instruction currently occupying a stage, if any.
    pub fn in_flight(&self, stage: Stage) -> Option<&Instr> {
        self.slots[stage.index()].as_ref().map(|fl| &fl.instr)
    }

    /// Advance the simulation by one cycle. Returns false once the program
    /// image is exhausted and the pipeline has drained; the final cycle is
    /// still traceable.
    pub fn step(&mut self) -> Result<bool, SimError> {
        if let Some(target) = self.redirect.take() {
            self.pc = target;
            self.last_issue = None;
            self.latches.npc = self.pc.wrapping_add(4);
        } else if !self.stall.raw_stalled {
            self.pc = self.pc.wrapping_add(4);
            self.latches.npc = self.pc.wrapping_add(4);
        }

        self.forwarding.reset();
        self.stall.tick();

        self.advance_slots();

        let in_image = self.fetch();
        let ended = !in_image && self.slots.iter().all(Option::is_none);

        self.write_back()?;
        self.data_store();
        self.data_fetch();
        self.execute();
        self.register_fetch()?;
        self.hazard_check();
        self.latch_instruction();

        self.cycle += 1;
        Ok(!ended)
    }

    /// Run to completion, rendering one trace block per cycle.
    pub fn run<W: io::Write>(
        &mut self,
        out: &mut W,
        max_cycles: Option<u64>,
    ) -> Result<(), SimError> {
        loop {
            let more = self.step()?;
            self.write_trace(out)?;
            if !more {
                break;
            }
            if max_cycles.is_some_and(|limit| self.cycle >= limit) {
                log::warn!("stopping at the {limit}-cycle limit", limit = self.cycle);
                break;
            }
        }
        Ok(())
    }

    /// Drain WB and move every slot toward it, honouring the RAW hold
    /// stage. Moving from an empty slot is an ordinary bubble; moving into
    /// an occupied slot is contention and the move is skipped.
    fn advance_slots(&mut self) {
        let mut arrived = [false; 8];

        self.slots[Stage::Wb.index()] = None;

        self.shift(Stage::Ds, Stage::Wb, &mut arrived);
        self.shift(Stage::Df, Stage::Ds, &mut arrived);
        self.shift(Stage::Ex, Stage::Df, &mut arrived);

        let hold = self.stall.stop_stage.filter(|_| self.stall.raw_stalled);
        if hold.is_none() || hold == Some(Stage::Id) {
            self.shift(Stage::Rf, Stage::Ex, &mut arrived);
        }
        if hold.is_none() || hold == Some(Stage::Rf) {
            self.shift(Stage::Id, Stage::Rf, &mut arrived);
        }
        self.shift(Stage::Is, Stage::Id, &mut arrived);
        self.shift(Stage::If, Stage::Is, &mut arrived);

        if let Some(hold) = hold {
            self.bump_held_distances(hold, &arrived);
        }
    }

    fn shift(&mut self, from: Stage, to: Stage, arrived: &mut [bool; 8]) {
        if self.slots[from.index()].is_none() {
            log::trace!("cycle {}: bubble at {from}", self.cycle);
            return;
        }
        if self.slots[to.index()].is_some() {
            log::debug!(
                "cycle {}: cannot move {from} -> {to}, destination occupied",
                self.cycle
            );
            return;
        }
        self.slots[to.index()] = self.slots[from.index()].take();
        arrived[to.index()] = true;
    }

    /// A held instruction watches its producers walk away: every armed
    /// forwarding distance whose producer lies past the hold stage (and
    /// therefore advanced this cycle) grows by one, so it keeps naming the
    /// same producer.
    fn bump_held_distances(&mut self, hold: Stage, arrived: &[bool; 8]) {
        for stage in [Stage::Id, Stage::Rf] {
            if stage > hold || arrived[stage.index()] {
                continue;
            }
            let Some(fl) = &mut self.slots[stage.index()] else {
                continue;
            };
            for src in Src::BOTH {
                if let Some(d) = fl.fwd_from[src.index()] {
                    if let Some(producer) = stage.ahead(d) {
                        if producer > hold {
                            fl.fwd_from[src.index()] = Some(d + 1);
                        }
                    }
                }
            }
        }
    }

    /// Issue the word at PC into IF. Returns whether the program image has
    /// a word at PC at all, which is what end-of-program detection needs.
    fn fetch(&mut self) -> bool {
        let Some(word) = self.program.word_at(self.pc) else {
            return false;
        };
        if self.slots[Stage::If.index()].is_some() {
            return true;
        }
        if self.last_issue == Some(self.pc) {
            return true;
        }
        self.slots[Stage::If.index()] = Some(InFlight::new(Instr::decode(word), self.pc));
        self.last_issue = Some(self.pc);
        true
    }

    /// WB: the only writer of the register file.
    fn write_back(&mut self) -> Result<(), SimError> {
        let Some(fl) = &self.slots[Stage::Wb.index()] else {
            return Ok(());
        };
        if fl.instr.writes_register() {
            self.regs.write(fl.instr.rd, fl.result)?;
        }
        Ok(())
    }

    /// DS: loads read data memory into the instruction's result, stores
    /// write it. A violating access is reported and nullified.
    fn data_store(&mut self) {
        let Some(fl) = &mut self.slots[Stage::Ds.index()] else {
            return;
        };
        match fl.instr.op {
            Op::Sw => {
                if let Err(e) = self.mem.write(fl.mem_addr, fl.operands[Src::Rs2.index()]) {
                    log::error!("cycle {}: store nullified: {e}", self.cycle);
                    self.violations += 1;
                }
            }
            Op::Lw => match self.mem.read(fl.mem_addr) {
                Ok(value) => {
                    fl.result = value;
                    self.latches.result = value;
                }
                Err(e) => {
                    log::error!("cycle {}: load nullified: {e}", self.cycle);
                    self.violations += 1;
                }
            },
            _ => {
                if fl.instr.writes_register() {
                    self.latches.result = fl.result;
                }
            }
        }
    }

    /// DF: a store's data operand gets its last forwarding opportunity
    /// here; loads have no side effect until DS.
    fn data_fetch(&mut self) {
        let Some(mut fl) = self.slots[Stage::Df.index()].take() else {
            return;
        };
        if fl.instr.op == Op::Sw {
            self.pull_forward(Stage::Df, &mut fl, Src::Rs2);
            self.latches.fwd_b = fl.operand(Src::Rs2);
        }
        self.slots[Stage::Df.index()] = Some(fl);
    }

    /// EX: compute the ALU result or effective address and resolve control
    /// transfers, with operands replaced by forwarded values first.
    fn execute(&mut self) {
        let Some(mut fl) = self.slots[Stage::Ex.index()].take() else {
            return;
        };
        match fl.instr.kind {
            Kind::RegImm => self.execute_reg_imm(&mut fl),
            Kind::RegReg => self.execute_reg_reg(&mut fl),
            Kind::Load => self.execute_load(&mut fl),
            Kind::Store => self.execute_store(&mut fl),
            Kind::Branch => self.execute_branch(&mut fl),
            Kind::Jal | Kind::Jalr => self.execute_jump(&mut fl),
            Kind::Blank | Kind::Other => {}
        }
        self.slots[Stage::Ex.index()] = Some(fl);
    }

    fn execute_reg_imm(&mut self, fl: &mut InFlight) {
        self.pull_forward(Stage::Ex, fl, Src::Rs1);
        let a = fl.operand(Src::Rs1);
        let result = match fl.instr.op {
            Op::Addi => a.wrapping_add(fl.instr.imm),
            Op::Slti => (a < fl.instr.imm) as i32,
            // NOP and malformed immediates compute nothing
            _ => return,
        };
        fl.result = result;
        self.latches.alu_out = result;
    }

    fn execute_reg_reg(&mut self, fl: &mut InFlight) {
        self.pull_forward(Stage::Ex, fl, Src::Rs1);
        self.pull_forward(Stage::Ex, fl, Src::Rs2);
        let a = fl.operand(Src::Rs1);
        let b = fl.operand(Src::Rs2);
        let result = match fl.instr.op {
            Op::Add => a.wrapping_add(b),
            Op::Sub => a.wrapping_sub(b),
            Op::Sll => ((a as u32) << (b & 0x1f)) as i32,
            Op::Srl => ((a as u32) >> (b & 0x1f)) as i32,
            Op::Slt => (a < b) as i32,
            Op::And => a & b,
            Op::Or => a | b,
            Op::Xor => a ^ b,
            _ => return,
        };
        fl.result = result;
        self.latches.alu_out = result;
    }

    fn execute_load(&mut self, fl: &mut InFlight) {
        self.pull_forward(Stage::Ex, fl, Src::Rs1);
        let addr = fl.operand(Src::Rs1).wrapping_add(fl.instr.imm) as u32;
        fl.mem_addr = addr;
        self.latches.alu_out = addr as i32;
    }

    fn execute_store(&mut self, fl: &mut InFlight) {
        self.pull_forward(Stage::Ex, fl, Src::Rs1);
        let addr = fl.operand(Src::Rs1).wrapping_add(fl.instr.imm) as u32;
        fl.mem_addr = addr;
        self.latches.alu_out = addr as i32;
        // Last chance for the store data: a producer this far ahead retires
        // before the store reaches DF.
        let retiring = Stage::Wb.index() - Stage::Ex.index();
        if fl.fwd_from[Src::Rs2.index()] == Some(retiring) {
            self.pull_forward(Stage::Ex, fl, Src::Rs2);
        }
        self.latches.fwd_b = fl.operand(Src::Rs2);
    }

    fn execute_branch(&mut self, fl: &mut InFlight) {
        self.pull_forward(Stage::Ex, fl, Src::Rs1);
        self.pull_forward(Stage::Ex, fl, Src::Rs2);
        let a = fl.operand(Src::Rs1);
        let b = fl.operand(Src::Rs2);
        let taken = match fl.instr.op {
            Op::Beq => a == b,
            Op::Bne => a != b,
            Op::Blt => a < b,
            Op::Bge => a >= b,
            _ => return,
        };
        if taken {
            self.take_branch(fl.pc.wrapping_add(fl.instr.imm as u32));
        }
    }

    fn execute_jump(&mut self, fl: &mut InFlight) {
        let target = match fl.instr.op {
            Op::Jal | Op::J => fl.pc.wrapping_add(fl.instr.imm as u32),
            Op::Jalr | Op::Ret => {
                self.pull_forward(Stage::Ex, fl, Src::Rs1);
                (fl.operand(Src::Rs1).wrapping_add(fl.instr.imm) as u32) & !1
            }
            _ => return,
        };
        let link = fl.pc.wrapping_add(4) as i32;
        fl.result = link;
        self.latches.alu_out = link;
        self.take_branch(target);
    }

    /// Redirect the program counter, squash the four stages behind EX and
    /// open the control-stall window.
    fn take_branch(&mut self, target: u32) {
        self.redirect = Some(target);
        for stage in [Stage::If, Stage::Is, Stage::Id, Stage::Rf] {
            self.slots[stage.index()] = None;
        }
        // A RAW stall whose consumer was just squashed has nothing left
        // to hold.
        self.stall.raw_stalled = false;
        self.stall.raw_remaining = 0;
        self.stall.stop_stage = None;
        self.stall.branch_stalled = true;
        self.stall.branch_remaining = BRANCH_STALL_WINDOW;
        self.stats.branch_stalls += 1;
        log::debug!("cycle {}: control transfer to {target}", self.cycle);
    }

    /// RF: read the operands this operation needs from the register file.
    /// A re-read on a later cycle is harmless; it can only pick up fresher
    /// values, since WB acts first.
    fn register_fetch(&mut self) -> Result<(), SimError> {
        let [reads_rs1, reads_rs2] = match &self.slots[Stage::Rf.index()] {
            Some(fl) => fl.instr.reads(),
            None => return Ok(()),
        };
        if reads_rs1 {
            let (rs1, _) = self.source_registers(Stage::Rf);
            let value = self.regs.read(rs1)?;
            if let Some(fl) = &mut self.slots[Stage::Rf.index()] {
                fl.set_operand(Src::Rs1, value);
            }
            self.latches.a = value;
        }
        if reads_rs2 {
            let (_, rs2) = self.source_registers(Stage::Rf);
            let value = self.regs.read(rs2)?;
            if let Some(fl) = &mut self.slots[Stage::Rf.index()] {
                fl.set_operand(Src::Rs2, value);
            }
            self.latches.b = value;
        }
        Ok(())
    }

    fn source_registers(&self, stage: Stage) -> (u8, u8) {
        match &self.slots[stage.index()] {
            Some(fl) => (fl.instr.rs1, fl.instr.rs2),
            None => (0, 0),
        }
    }

    /// ID: examine the instruction against everything in RF..DS, arm
    /// forwarding for each matched source, and raise a load-use stall when
    /// the producer cannot forward in time. Runs once per instruction,
    /// even if the instruction lingers in ID across stalled cycles.
    fn hazard_check(&mut self) {
        let Some(mut fl) = self.slots[Stage::Id.index()].take() else {
            return;
        };
        if fl.hazard_checked {
            self.slots[Stage::Id.index()] = Some(fl);
            return;
        }
        fl.hazard_checked = true;

        let reads = fl.instr.reads();
        let mut stall_at: Option<Stage> = None;
        for src in Src::BOTH {
            if !reads[src.index()] {
                continue;
            }
            let reg = match src {
                Src::Rs1 => fl.instr.rs1,
                Src::Rs2 => fl.instr.rs2,
            };
            let Some((producer_stage, producer_op, producer_text)) = self.nearest_producer(reg)
            else {
                continue;
            };
            let distance = producer_stage.index() - Stage::Id.index();
            fl.fwd_from[src.index()] = Some(distance);
            self.forwarding
                .detected
                .push((producer_text, fl.instr.to_string()));

            // Classic load-use: the value is needed in EX too soon after
            // the load's own EX. A store's data operand is needed later,
            // in DF, and forwards instead.
            let needed_in_ex = !(fl.instr.op == Op::Sw && src == Src::Rs2);
            if producer_op == Op::Lw && needed_in_ex {
                match producer_stage {
                    Stage::Rf => stall_at = Some(Stage::Id),
                    Stage::Ex => stall_at = stall_at.or(Some(Stage::Rf)),
                    _ => {}
                }
            }
        }
        self.slots[Stage::Id.index()] = Some(fl);

        if let Some(stop) = stall_at {
            self.set_raw_stall(LOAD_USE_STALL, stop);
        }
    }

    /// Scan RF, EX, DF, DS in that order for the nearest in-flight
    /// instruction producing `reg`.
    fn nearest_producer(&self, reg: u8) -> Option<(Stage, Op, String)> {
        for stage in [Stage::Rf, Stage::Ex, Stage::Df, Stage::Ds] {
            if let Some(fl) = &self.slots[stage.index()] {
                if fl.instr.produces() == Some(reg) {
                    return Some((stage, fl.instr.op, fl.instr.to_string()));
                }
            }
        }
        None
    }

    /// Hold every stage at or before `stop` for `cycles` extra cycles. The
    /// PC moves one instruction ahead so fetch keeps pace while the front
    /// of the pipeline is frozen.
    fn set_raw_stall(&mut self, cycles: u32, stop: Stage) {
        self.stall.raw_stalled = true;
        self.stall.raw_remaining = cycles;
        self.stall.stop_stage = Some(stop);
        self.stats.load_stalls += 1;
        self.pc = self.pc.wrapping_add(4);
        log::debug!("cycle {}: load-use stall, holding at {stop}", self.cycle);
    }

    /// IS: the fetched word becomes visible in the IS/ID instruction
    /// register.
    fn latch_instruction(&mut self) {
        self.latches.ir = match &self.slots[Stage::Is.index()] {
            Some(fl) => fl.instr.word,
            None => 0,
        };
    }

    /// Replace an armed operand with the producer's result if a forwarding
    /// path resolves from `at` this cycle. A distance that has walked past
    /// WB is dropped: the register file already holds the value.
    fn pull_forward(&mut self, at: Stage, fl: &mut InFlight, src: Src) {
        let Some(d) = fl.fwd_from[src.index()] else {
            return;
        };
        let Some(from) = at.ahead(d) else {
            fl.fwd_from[src.index()] = None;
            return;
        };
        let Some(path) = ForwardPath::between(from, at) else {
            return;
        };
        let Some(producer) = &self.slots[from.index()] else {
            log::debug!("cycle {}: armed forward from empty {from} dropped", self.cycle);
            fl.fwd_from[src.index()] = None;
            return;
        };
        let value = producer.result;
        if self.forwarding.fired[path.index()].is_none() {
            self.forwarding.fired[path.index()] =
                Some(format!("({}) to ({})", producer.instr, fl.instr));
            self.stats.forwards[path.index()] += 1;
        }
        fl.set_operand(src, value);
        fl.fwd_from[src.index()] = None;
        log::debug!(
            "cycle {}: forwarded {value} over {}",
            self.cycle,
            path.label()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::*;
    use crate::loader::CODE_BASE;
    use crate::memory::ADDR_LO;

    fn simulator(words: Vec<u32>) -> Simulator {
        Simulator::new(ProgramImage::from_words(words, CODE_BASE))
    }

    fn run_to_end(sim: &mut Simulator) -> u64 {
        while sim.step().unwrap() {}
        sim.cycle()
    }

    #[test]
    fn check_single_addi() {
        let mut sim = simulator(vec![addi!(1, 0, 5)]);
        run_to_end(&mut sim);
        assert_eq!(sim.registers().read(1).unwrap(), 5);
        assert_eq!(sim.stats().load_stalls, 0);
        assert_eq!(sim.stats().branch_stalls, 0);
        assert_eq!(sim.stats().forwards, [0; 5]);
    }

    #[test]
    fn check_nop_program_drains_in_n_plus_eight() {
        for n in [1u64, 3, 5] {
            let mut sim = simulator(vec![nop!(); n as usize]);
            let cycles = run_to_end(&mut sim);
            // The last instruction writes back in cycle n + 6, its slot is
            // freed during cycle n + 7's advance, and the end-of-program
            // check runs on that post-advance state, so the final cycle
            // index is n + 7 and the cycle counter finishes one past it.
            assert_eq!(cycles, n + 8, "for {n} nops");
        }
    }

    #[test]
    fn check_instruction_advances_one_stage_per_cycle() {
        let mut sim = simulator(vec![addi!(1, 0, 5)]);
        for expected in Stage::ALL {
            sim.step().unwrap();
            for stage in Stage::ALL {
                let occupied = sim.in_flight(stage).is_some();
                assert_eq!(occupied, stage == expected, "cycle {}", sim.cycle());
            }
        }
    }

    #[test]
    fn check_raw_hazard_forwards_ex_df_to_rf_ex() {
        let mut sim = simulator(vec![addi!(1, 0, 7), add!(2, 1, 1)]);
        run_to_end(&mut sim);
        assert_eq!(sim.registers().read(1).unwrap(), 7);
        assert_eq!(sim.registers().read(2).unwrap(), 14);
        assert_eq!(sim.stats().load_stalls, 0);
        // both sources pull from the same producer over the same path in
        // the same cycle: one forwarding event
        assert_eq!(
            sim.stats().forwards[ForwardPath::ExDfToRfEx.index()],
            1
        );
    }

    #[test]
    fn check_two_apart_dependency_forwards_df_ds_to_rf_ex() {
        let mut sim = simulator(vec![addi!(1, 0, 3), nop!(), add!(2, 1, 1)]);
        run_to_end(&mut sim);
        assert_eq!(sim.registers().read(2).unwrap(), 6);
        assert_eq!(
            sim.stats().forwards[ForwardPath::DfDsToRfEx.index()],
            1
        );
    }

    #[test]
    fn check_load_use_stalls_and_forwards_from_wb() {
        let mut sim = simulator(vec![lw!(1, 2, 0), add!(3, 1, 1)]);
        sim.registers_mut().write(2, ADDR_LO as i32).unwrap();
        sim.memory_mut().write(ADDR_LO, 42).unwrap();
        let cycles = run_to_end(&mut sim);
        assert_eq!(sim.registers().read(1).unwrap(), 42);
        assert_eq!(sim.registers().read(3).unwrap(), 84);
        assert_eq!(sim.stats().load_stalls, 1);
        assert_eq!(
            sim.stats().forwards[ForwardPath::DsWbToRfEx.index()],
            1
        );
        // the two-instruction program pays the full two-cycle penalty
        assert_eq!(cycles, 2 + 8 + 2);
    }

    #[test]
    fn check_load_use_with_gap_stalls_at_rf() {
        let mut sim = simulator(vec![lw!(1, 2, 0), nop!(), add!(3, 1, 1)]);
        sim.registers_mut().write(2, ADDR_LO as i32).unwrap();
        sim.memory_mut().write(ADDR_LO, 10).unwrap();
        run_to_end(&mut sim);
        assert_eq!(sim.registers().read(3).unwrap(), 20);
        assert_eq!(sim.stats().load_stalls, 1);
    }

    #[test]
    fn check_load_into_store_data_does_not_stall() {
        // the store needs R1 only at DF, where DS/WB -> EX/DF reaches it
        let mut sim = simulator(vec![lw!(1, 2, 0), sw!(1, 2, 4)]);
        sim.registers_mut().write(2, ADDR_LO as i32).unwrap();
        sim.memory_mut().write(ADDR_LO, 77).unwrap();
        run_to_end(&mut sim);
        assert_eq!(sim.stats().load_stalls, 0);
        assert_eq!(sim.memory().read(ADDR_LO + 4).unwrap(), 77);
    }

    #[test]
    fn check_store_data_forwarded_at_df() {
        let mut sim = simulator(vec![addi!(1, 0, 9), sw!(1, 2, 0)]);
        sim.registers_mut().write(2, ADDR_LO as i32).unwrap();
        run_to_end(&mut sim);
        assert_eq!(sim.memory().read(ADDR_LO).unwrap(), 9);
        assert_eq!(
            sim.stats().forwards[ForwardPath::DfDsToExDf.index()],
            1
        );
    }

    #[test]
    fn check_taken_branch_squashes_younger_instructions() {
        let mut sim = simulator(vec![
            beq!(0, 0, 12),
            addi!(1, 0, 1),
            addi!(2, 0, 2),
            addi!(3, 0, 3),
        ]);
        run_to_end(&mut sim);
        assert_eq!(sim.registers().read(1).unwrap(), 0);
        assert_eq!(sim.registers().read(2).unwrap(), 0);
        assert_eq!(sim.registers().read(3).unwrap(), 3);
        assert_eq!(sim.stats().branch_stalls, 1);
    }

    #[test]
    fn check_not_taken_branch_falls_through() {
        let mut sim = simulator(vec![bne!(0, 0, 12), addi!(1, 0, 1)]);
        run_to_end(&mut sim);
        assert_eq!(sim.registers().read(1).unwrap(), 1);
        assert_eq!(sim.stats().branch_stalls, 0);
    }

    #[test]
    fn check_blt_is_strict_signed_compare() {
        // -1 < 1 taken; equal operands not taken
        let mut sim = simulator(vec![blt!(1, 2, 8), addi!(3, 0, 3), addi!(4, 0, 4)]);
        sim.registers_mut().write(1, -1).unwrap();
        sim.registers_mut().write(2, 1).unwrap();
        run_to_end(&mut sim);
        assert_eq!(sim.registers().read(3).unwrap(), 0);
        assert_eq!(sim.registers().read(4).unwrap(), 4);

        let mut sim = simulator(vec![blt!(1, 1, 8), addi!(3, 0, 3)]);
        sim.registers_mut().write(1, 5).unwrap();
        run_to_end(&mut sim);
        assert_eq!(sim.registers().read(3).unwrap(), 3);
    }

    #[test]
    fn check_bge_signed_compare() {
        // -1 >= 1 is false for signed operands
        let mut sim = simulator(vec![bge!(1, 2, 8), addi!(3, 0, 3)]);
        sim.registers_mut().write(1, -1).unwrap();
        sim.registers_mut().write(2, 1).unwrap();
        run_to_end(&mut sim);
        assert_eq!(sim.registers().read(3).unwrap(), 3);
        assert_eq!(sim.stats().branch_stalls, 0);
    }

    #[test]
    fn check_jal_links_and_redirects() {
        let mut sim = simulator(vec![
            jal!(1, 12),
            addi!(2, 0, 2),
            addi!(3, 0, 3),
            addi!(4, 0, 4),
        ]);
        run_to_end(&mut sim);
        assert_eq!(sim.registers().read(1).unwrap(), CODE_BASE as i32 + 4);
        assert_eq!(sim.registers().read(2).unwrap(), 0);
        assert_eq!(sim.registers().read(3).unwrap(), 0);
        assert_eq!(sim.registers().read(4).unwrap(), 4);
        assert_eq!(sim.stats().branch_stalls, 1);
    }

    #[test]
    fn check_j_discards_its_link() {
        let mut sim = simulator(vec![j!(8), addi!(2, 0, 2), addi!(3, 0, 3)]);
        run_to_end(&mut sim);
        assert_eq!(sim.registers().read(0).unwrap(), 0);
        assert_eq!(sim.registers().read(2).unwrap(), 0);
        assert_eq!(sim.registers().read(3).unwrap(), 3);
        assert_eq!(sim.stats().branch_stalls, 1);
    }

    #[test]
    fn check_ret_jumps_through_r1() {
        let target = CODE_BASE + 12;
        let mut sim = simulator(vec![
            ret!(),
            addi!(2, 0, 2),
            addi!(3, 0, 3),
            addi!(4, 0, 4),
        ]);
        sim.registers_mut().write(1, target as i32).unwrap();
        run_to_end(&mut sim);
        assert_eq!(sim.registers().read(2).unwrap(), 0);
        assert_eq!(sim.registers().read(3).unwrap(), 0);
        assert_eq!(sim.registers().read(4).unwrap(), 4);
    }

    #[test]
    fn check_jalr_masks_target_bit_zero() {
        let mut sim = simulator(vec![jalr!(5, 1, 1), addi!(2, 0, 2), addi!(3, 0, 3)]);
        sim.registers_mut().write(1, CODE_BASE as i32 + 7).unwrap();
        run_to_end(&mut sim);
        // (503 + 1) & !1 = 504: the third instruction
        assert_eq!(sim.registers().read(3).unwrap(), 3);
        assert_eq!(sim.registers().read(2).unwrap(), 0);
        assert_eq!(sim.registers().read(5).unwrap(), CODE_BASE as i32 + 4);
    }

    #[test]
    fn check_store_then_load_round_trip() {
        let value = 0xdead_beefu32 as i32;
        let mut sim = simulator(vec![sw!(1, 2, 0), lw!(3, 2, 0)]);
        sim.registers_mut().write(1, value).unwrap();
        sim.registers_mut().write(2, ADDR_LO as i32).unwrap();
        run_to_end(&mut sim);
        assert_eq!(sim.memory().read(ADDR_LO).unwrap(), value);
        assert_eq!(sim.registers().read(3).unwrap(), value);
    }

    #[test]
    fn check_memory_violation_is_nullified() {
        let mut sim = simulator(vec![sw!(1, 2, 0), lw!(3, 2, 0), addi!(4, 0, 4)]);
        sim.registers_mut().write(1, 13).unwrap();
        sim.registers_mut().write(2, 100).unwrap();
        run_to_end(&mut sim);
        // the faulting store and load do nothing, the rest proceeds
        assert_eq!(sim.registers().read(3).unwrap(), 0);
        assert_eq!(sim.registers().read(4).unwrap(), 4);
        assert_eq!(sim.memory_violations(), 2);
    }

    #[test]
    fn check_blank_words_flow_through_without_effects() {
        let mut sim = simulator(vec![addi!(1, 0, 5), 0, 0, addi!(2, 0, 6)]);
        let cycles = run_to_end(&mut sim);
        assert_eq!(sim.registers().read(1).unwrap(), 5);
        assert_eq!(sim.registers().read(2).unwrap(), 6);
        assert_eq!(cycles, 4 + 8);
    }

    #[test]
    fn check_slt_and_shifts() {
        let mut sim = simulator(vec![
            addi!(1, 0, 1),
            addi!(2, 0, 8),
            sll!(3, 2, 1),
            srl!(4, 2, 1),
            slt!(5, 1, 2),
            slti!(6, 2, 3),
        ]);
        run_to_end(&mut sim);
        assert_eq!(sim.registers().read(3).unwrap(), 16);
        assert_eq!(sim.registers().read(4).unwrap(), 4);
        assert_eq!(sim.registers().read(5).unwrap(), 1);
        assert_eq!(sim.registers().read(6).unwrap(), 0);
    }

    #[test]
    fn check_logic_ops() {
        let mut sim = simulator(vec![
            addi!(1, 0, 0xff),
            addi!(2, 0, 0x0f),
            and!(3, 1, 2),
            or!(4, 1, 2),
            xor!(5, 1, 2),
            sub!(6, 1, 2),
        ]);
        run_to_end(&mut sim);
        assert_eq!(sim.registers().read(3).unwrap(), 0x0f);
        assert_eq!(sim.registers().read(4).unwrap(), 0xff);
        assert_eq!(sim.registers().read(5).unwrap(), 0xf0);
        assert_eq!(sim.registers().read(6).unwrap(), 0xf0);
    }

    #[test]
    fn check_error_word_flows_as_nop() {
        let mut sim = simulator(vec![0xffff_ffff, addi!(1, 0, 5)]);
        run_to_end(&mut sim);
        assert_eq!(sim.registers().read(1).unwrap(), 5);
    }

    #[test]
    fn check_backward_branch_re_executes_target() {
        // ADDI R1 += 1; BNE R1, R2, -4 loops back until R1 == 3
        let mut sim = simulator(vec![add!(1, 1, 3), bne!(1, 2, -4), addi!(4, 0, 4)]);
        sim.registers_mut().write(3, 1).unwrap();
        sim.registers_mut().write(2, 3).unwrap();
        run_to_end(&mut sim);
        assert_eq!(sim.registers().read(1).unwrap(), 3);
        assert_eq!(sim.registers().read(4).unwrap(), 4);
        assert_eq!(sim.stats().branch_stalls, 2);
    }

    #[test]
    fn check_trace_is_deterministic() {
        let program = vec![
            addi!(1, 0, 7),
            add!(2, 1, 1),
            sw!(2, 3, 600),
            lw!(4, 3, 600),
            beq!(4, 2, 8),
            addi!(5, 0, 5),
            addi!(6, 0, 6),
        ];
        let mut first = Vec::new();
        let mut sim = simulator(program.clone());
        sim.run(&mut first, None).unwrap();
        let mut second = Vec::new();
        let mut sim = simulator(program);
        sim.run(&mut second, None).unwrap();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn check_max_cycles_limit() {
        let mut sim = simulator(vec![nop!(); 20]);
        let mut out = Vec::new();
        sim.run(&mut out, Some(5)).unwrap();
        assert_eq!(sim.cycle(), 5);
    }
}
