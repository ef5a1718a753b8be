//! Synthetic user programs and the stand-in kernel.
//!
//! Each program is a small state machine driven one memory step at a time so
//! the scheduler in `main` can preempt it between steps.

use log::{debug, warn};

use vmachine::common::constants::BAD_VADDR_REG;
use vmachine::{ExceptionHandler, ExceptionType, Machine, MachineError};

/// Kernel trap entry for the workloads.
///
/// Page faults never reach it, so any exception here is a user program bug
/// and ends the run.
#[derive(Default)]
pub struct Kernel {
    pub traps: u64,
}

impl ExceptionHandler for Kernel {
    fn handle(&mut self, machine: &mut Machine, which: ExceptionType) -> Result<(), MachineError> {
        self.traps += 1;
        let bad = machine.read_register(BAD_VADDR_REG);
        warn!("[!] {} at {:#010x} in thread {:?}", which, bad, machine.current_thread());
        Err(MachineError::Handler(format!("{} at {:#010x}", which, bad)))
    }
}

pub trait Program {
    /// Writes the program's initial data into its address space.
    fn load(&mut self, machine: &mut Machine, kernel: &mut Kernel) -> Result<(), MachineError>;

    /// Runs one step. Returns `true` once the program has finished.
    fn step(&mut self, machine: &mut Machine, kernel: &mut Kernel) -> Result<bool, MachineError>;

    fn finished(&self) -> bool;

    /// Checks the final contents of the address space.
    fn verify(&mut self, machine: &mut Machine, kernel: &mut Kernel) -> Result<(), MachineError>;
}

fn load_word(machine: &mut Machine, addr: u32, kernel: &mut Kernel) -> Result<u32, MachineError> {
    machine
        .read_mem(addr, 4, kernel)?
        .ok_or_else(|| MachineError::Handler(format!("read of {:#x} abandoned", addr)))
}

fn store_word(
    machine: &mut Machine,
    addr: u32,
    value: u32,
    kernel: &mut Kernel,
) -> Result<(), MachineError> {
    if machine.write_mem(addr, 4, value, kernel)? {
        Ok(())
    } else {
        Err(MachineError::Handler(format!("write of {:#x} abandoned", addr)))
    }
}

/// Bubble sort over a reverse-ordered array at virtual address 0.
pub struct SortProgram {
    len: u32,
    pass: u32,
    index: u32,
    done: bool,
}

impl SortProgram {
    pub fn new(len: u32, space_bytes: u32) -> Result<Self, MachineError> {
        if len == 0 || u64::from(len) * 4 > u64::from(space_bytes) {
            return Err(MachineError::InvalidConfig(format!(
                "{} elements do not fit a {} byte address space",
                len, space_bytes
            )));
        }
        Ok(Self { len, pass: 0, index: 0, done: len < 2 })
    }
}

impl Program for SortProgram {
    fn load(&mut self, machine: &mut Machine, kernel: &mut Kernel) -> Result<(), MachineError> {
        for i in 0..self.len {
            store_word(machine, i * 4, self.len - i, kernel)?;
        }
        Ok(())
    }

    fn step(&mut self, machine: &mut Machine, kernel: &mut Kernel) -> Result<bool, MachineError> {
        if self.done {
            return Ok(true);
        }
        let a = self.index * 4;
        let lo = load_word(machine, a, kernel)?;
        let hi = load_word(machine, a + 4, kernel)?;
        if lo > hi {
            store_word(machine, a, hi, kernel)?;
            store_word(machine, a + 4, lo, kernel)?;
        }

        self.index += 1;
        if self.index + 1 >= self.len - self.pass {
            self.pass += 1;
            self.index = 0;
            if self.pass + 1 >= self.len {
                self.done = true;
                debug!("sort of {} elements finished", self.len);
            }
        }
        Ok(self.done)
    }

    fn finished(&self) -> bool {
        self.done
    }

    fn verify(&mut self, machine: &mut Machine, kernel: &mut Kernel) -> Result<(), MachineError> {
        for i in 0..self.len {
            let got = load_word(machine, i * 4, kernel)?;
            if got != i + 1 {
                return Err(MachineError::Handler(format!(
                    "element {} is {} after sorting, expected {}",
                    i,
                    got,
                    i + 1
                )));
            }
        }
        Ok(())
    }
}

/// Random word reads and writes, checked against a shadow of every write.
pub struct RandomProgram {
    state: u64,
    remaining: u32,
    words: u32,
    shadow: Vec<Option<u32>>,
}

impl RandomProgram {
    pub fn new(seed: u64, accesses: u32, space_bytes: u32) -> Self {
        let words = space_bytes / 4;
        Self {
            state: if seed == 0 { 0x2545_F491_4F6C_DD1D } else { seed },
            remaining: accesses,
            words,
            shadow: vec![None; words as usize],
        }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

impl Program for RandomProgram {
    fn load(&mut self, _machine: &mut Machine, _kernel: &mut Kernel) -> Result<(), MachineError> {
        Ok(())
    }

    fn step(&mut self, machine: &mut Machine, kernel: &mut Kernel) -> Result<bool, MachineError> {
        if self.remaining == 0 || self.words == 0 {
            return Ok(true);
        }
        self.remaining -= 1;

        let r = self.next();
        let word = (r % u64::from(self.words)) as u32;
        let addr = word * 4;
        if r & (1 << 40) != 0 {
            let value = (r >> 32) as u32;
            store_word(machine, addr, value, kernel)?;
            self.shadow[word as usize] = Some(value);
        } else {
            let got = load_word(machine, addr, kernel)?;
            let expected = self.shadow[word as usize].unwrap_or(0);
            if got != expected {
                return Err(MachineError::Handler(format!(
                    "read {:#x} from {:#010x}, last wrote {:#x}",
                    got, addr, expected
                )));
            }
        }
        Ok(self.remaining == 0)
    }

    fn finished(&self) -> bool {
        self.remaining == 0 || self.words == 0
    }

    fn verify(&mut self, machine: &mut Machine, kernel: &mut Kernel) -> Result<(), MachineError> {
        for word in 0..self.words {
            if let Some(expected) = self.shadow[word as usize] {
                let got = load_word(machine, word * 4, kernel)?;
                if got != expected {
                    return Err(MachineError::Handler(format!(
                        "word {:#010x} holds {:#x}, expected {:#x}",
                        word * 4,
                        got,
                        expected
                    )));
                }
            }
        }
        Ok(())
    }
}
