//! User-program register file.
//!
//! Forty 32-bit words: the general-purpose registers followed by Hi/Lo,
//! the three program counters of the delayed-branch pipeline, the two
//! delayed-load registers and the bad-address register. See
//! [`crate::common::constants`] for the index of each.

use std::fmt::Write as _;

use crate::common::constants::{
    BAD_VADDR_REG, HI_REG, INSTRUCTION_SIZE, LO_REG, LOAD_REG, LOAD_VALUE_REG, NEXT_PC_REG,
    NUM_GP_REGS, NUM_TOTAL_REGS, PC_REG, PREV_PC_REG, RET_ADDR_REG, STACK_REG,
};

pub struct RegisterFile {
    regs: [u32; NUM_TOTAL_REGS],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            regs: [0; NUM_TOTAL_REGS],
        }
    }

    /// Reads register `idx`.
    ///
    /// # Panics
    ///
    /// If `idx` is not a register index. An out-of-range index is an
    /// executor bug, not a user-program condition.
    pub fn read(&self, idx: usize) -> u32 {
        assert!(idx < NUM_TOTAL_REGS, "register index {} out of range", idx);
        self.regs[idx]
    }

    /// Writes register `idx`.
    ///
    /// # Panics
    ///
    /// If `idx` is not a register index.
    pub fn write(&mut self, idx: usize, val: u32) {
        assert!(idx < NUM_TOTAL_REGS, "register index {} out of range", idx);
        self.regs[idx] = val;
    }

    /// Retires one instruction: PrevPC takes PC, PC takes NextPC, and
    /// NextPC moves one instruction further.
    pub fn advance_pc(&mut self) {
        let pc = self.regs[PC_REG];
        let next = self.regs[NEXT_PC_REG];
        self.regs[PREV_PC_REG] = pc;
        self.regs[PC_REG] = next;
        self.regs[NEXT_PC_REG] = next.wrapping_add(INSTRUCTION_SIZE);
    }

    /// Completes the load in flight and schedules `next_reg <- next_value`.
    ///
    /// Register 0 is forced back to zero afterwards, since a load may
    /// target it.
    pub fn delayed_load(&mut self, next_reg: usize, next_value: u32) {
        let target = self.regs[LOAD_REG] as usize;
        assert!(target < NUM_TOTAL_REGS, "delayed load into register {}", target);
        self.regs[target] = self.regs[LOAD_VALUE_REG];
        self.regs[LOAD_REG] = next_reg as u32;
        self.regs[LOAD_VALUE_REG] = next_value;
        self.regs[0] = 0;
    }

    /// Formats the register dump shown by the debugger.
    pub fn dump(&self) -> String {
        let mut out = String::from("Machine registers:\n");
        for i in 0..NUM_GP_REGS {
            let label = match i {
                STACK_REG => format!("SP({})", i),
                RET_ADDR_REG => format!("RA({})", i),
                _ => i.to_string(),
            };
            let _ = write!(out, "\t{}:\t{:#x}", label, self.regs[i]);
            if i % 4 == 3 {
                out.push('\n');
            }
        }
        let _ = writeln!(
            out,
            "\tHi:\t{:#x}\tLo:\t{:#x}",
            self.regs[HI_REG], self.regs[LO_REG]
        );
        let _ = writeln!(
            out,
            "\tPC:\t{:#x}\tNextPC:\t{:#x}\tPrevPC:\t{:#x}",
            self.regs[PC_REG], self.regs[NEXT_PC_REG], self.regs[PREV_PC_REG]
        );
        let _ = writeln!(
            out,
            "\tLoad:\t{:#x}\tLoadV:\t{:#x}\tBadVAddr:\t{:#x}",
            self.regs[LOAD_REG], self.regs[LOAD_VALUE_REG], self.regs[BAD_VADDR_REG]
        );
        out
    }
}
