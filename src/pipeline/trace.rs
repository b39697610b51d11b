//! Per-cycle trace rendering.

use super::hazard::ForwardPath;
use super::stage::Stage;
use super::Simulator;
use itertools::Itertools;
use std::io::{self, Write};

fn format_ir(ir: u32) -> String {
    if ir == 0 {
        "0".to_string()
    } else {
        format!(
            "<{}>",
            ir.to_le_bytes().iter().map(|b| format!("{b:02x}")).join(" ")
        )
    }
}

impl Simulator {
    /// Render the trace block for the cycle that [`Simulator::step`] just
    /// completed.
    pub fn write_trace<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let cycle = self.cycle.saturating_sub(1);
        writeln!(
            out,
            "***** Cycle #{cycle}***********************************************"
        )?;
        writeln!(out, "Current PC = {}", self.pc)?;
        writeln!(out)?;

        writeln!(out, "Pipeline Status:")?;
        for stage in Stage::ALL {
            writeln!(out, "* {} : {}", stage.name(), self.stage_status(stage))?;
        }
        writeln!(out)?;

        writeln!(out, "Stall Instruction: {}", self.stalled_instruction())?;
        writeln!(out)?;

        writeln!(out, "Forwarding:")?;
        if self.forwarding.detected.is_empty() {
            writeln!(out, " Detected: (none)")?;
        } else {
            writeln!(out, " Detected:")?;
            for (producer, consumer) in &self.forwarding.detected {
                writeln!(out, "  ({producer}) to ({consumer})")?;
            }
        }
        writeln!(out, " Forwarded:")?;
        for path in ForwardPath::ALL {
            let fired = self.forwarding.fired[path.index()]
                .as_deref()
                .unwrap_or("(none)");
            writeln!(out, " * {} : {}", path.label(), fired)?;
        }
        writeln!(out)?;

        writeln!(out, "Pipeline Registers:")?;
        writeln!(out, "* IF/IS.NPC  : {}", self.latches.npc)?;
        writeln!(out, "* IS/ID.IR   : {}", format_ir(self.latches.ir))?;
        writeln!(out, "* RF/EX.A    : {}", self.latches.a)?;
        writeln!(out, "* RF/EX.B    : {}", self.latches.b)?;
        writeln!(out, "* EX/DF.ALUout : {}", self.latches.alu_out)?;
        writeln!(out, "* EX/DF.B    : {}", self.latches.fwd_b)?;
        writeln!(out, "* DS/WB.ALUout-LMD : {}", self.latches.result)?;
        writeln!(out)?;

        write!(out, "{}", self.regs)?;
        writeln!(out)?;
        write!(out, "{}", self.mem)?;
        writeln!(out)?;

        writeln!(out, "Total Stalls:")?;
        writeln!(out, "* Loads    : {}", self.stats.load_stalls)?;
        writeln!(out, "* Branches : {}", self.stats.branch_stalls)?;
        writeln!(out, "* Other    : {}", self.stats.other_stalls)?;
        writeln!(out)?;

        writeln!(out, "Total Forwardings:")?;
        for path in ForwardPath::ALL {
            writeln!(
                out,
                "* {} : {}",
                path.label(),
                self.stats.forwards[path.index()]
            )?;
        }
        writeln!(out)?;
        Ok(())
    }

    /// What a stage line shows: a fresh fetch is still `<unknown>`, an
    /// occupied stage shows its disassembly, and an empty slot is a stall
    /// bubble while any stall window is open.
    fn stage_status(&self, stage: Stage) -> String {
        match &self.slots[stage.index()] {
            Some(_) if stage == Stage::If => "<unknown>".to_string(),
            Some(fl) => fl.instr.to_string(),
            None if self.stall.any() => "**STALL**".to_string(),
            None => "NOP".to_string(),
        }
    }

    fn stalled_instruction(&self) -> String {
        if self.stall.raw_stalled {
            if let Some(fl) = &self.slots[Stage::Id.index()] {
                return fl.instr.to_string();
            }
        }
        "(none)".to_string()
    }
}
