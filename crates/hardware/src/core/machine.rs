//! The simulated user-mode machine.
//!
//! [`Machine`] is the aggregate root: it owns the register file, main
//! memory, the address translation unit and the thread → backing store
//! registry. The external executor and the kernel's exception handler
//! reach all of it through a `&mut Machine`, never through globals.
//!
//! Exactly one simulated thread runs at a time. A caller that executes
//! threads in parallel must serialise access to the whole machine (for
//! example behind one `Mutex<Machine>`), since any page-in can evict a
//! frame another thread is using.

use log::{debug, info};

use super::arch::{PrivilegeMode, RegisterFile};
use super::exception::ExceptionHandler;
use super::mmu::Mmu;
use super::mmu::inverted::InvertedPageTable;
use super::mmu::tlb::Tlb;
use crate::common::constants::BAD_VADDR_REG;
use crate::common::{AccessType, ExceptionType, MachineError, TranslationResult, VirtAddr};
use crate::config::{Config, TranslationMode};
use crate::stats::TranslationStats;
use crate::system::{BackingStore, MainMemory, SpaceTable, ThreadId};

pub struct Machine {
    pub regs: RegisterFile,
    pub memory: MainMemory,
    /// Drop into the debugger after each user instruction.
    pub single_step: bool,
    mmu: Mmu,
    spaces: SpaceTable,
    mode: PrivilegeMode,
    current: Option<ThreadId>,
    backing_size: usize,
}

impl Machine {
    /// Builds a zeroed machine from a validated configuration.
    pub fn new(config: &Config) -> Result<Self, MachineError> {
        config.validate()?;
        Ok(Self::with_mmu(config, Mmu::new(config)))
    }

    /// Builds a machine around a caller-assembled MMU.
    ///
    /// The configuration is assumed valid.
    pub fn with_mmu(config: &Config, mmu: Mmu) -> Self {
        debug!(
            "machine: {} frames of {} bytes, {:?} translation",
            config.memory.num_phys_pages,
            config.memory.page_size,
            mmu.mode()
        );
        Self {
            regs: RegisterFile::new(),
            memory: MainMemory::new(config.memory.page_size, config.memory.num_phys_pages),
            single_step: config.general.single_step,
            mmu,
            spaces: SpaceTable::new(),
            mode: PrivilegeMode::User,
            current: None,
            backing_size: config.memory.backing_size(),
        }
    }

    pub fn read_register(&self, num: usize) -> u32 {
        self.regs.read(num)
    }

    pub fn write_register(&mut self, num: usize, value: u32) {
        self.regs.write(num, value);
    }

    pub fn advance_pc(&mut self) {
        self.regs.advance_pc();
    }

    pub fn delayed_load(&mut self, next_reg: usize, next_value: u32) {
        self.regs.delayed_load(next_reg, next_value);
    }

    /// Traps into the kernel.
    ///
    /// Records `bad_vaddr`, retires any load in flight, runs `handler` in
    /// system mode and returns to user mode. The mode is restored even when
    /// the handler fails.
    ///
    /// # Panics
    ///
    /// If `which` is [`ExceptionType::NoException`].
    pub fn raise_exception(
        &mut self,
        which: ExceptionType,
        bad_vaddr: u32,
        handler: &mut dyn ExceptionHandler,
    ) -> Result<(), MachineError> {
        assert_ne!(which, ExceptionType::NoException, "raised the no-exception sentinel");
        debug!("Exception: {} (bad vaddr {:#x})", which, bad_vaddr);

        self.mmu.stats_mut().exceptions += 1;
        self.regs.write(BAD_VADDR_REG, bad_vaddr);
        self.regs.delayed_load(0, 0);
        self.mode = PrivilegeMode::System;
        let result = handler.handle(self, which);
        self.mode = PrivilegeMode::User;
        result
    }

    /// Translates `vaddr` for the running thread.
    pub fn translate(
        &mut self,
        vaddr: VirtAddr,
        size: usize,
        access: AccessType,
    ) -> Result<TranslationResult, MachineError> {
        let tid = self.current.ok_or(MachineError::NoCurrentThread)?;
        self.mmu.translate(
            vaddr,
            size,
            access,
            tid,
            &mut self.memory,
            &mut self.spaces,
        )
    }

    /// Reads `size` bytes (1, 2 or 4) at virtual `addr`.
    ///
    /// On a translation exception the exception is raised through
    /// `handler` and `None` is returned; the executor retries or abandons
    /// the instruction.
    pub fn read_mem(
        &mut self,
        addr: u32,
        size: usize,
        handler: &mut dyn ExceptionHandler,
    ) -> Result<Option<u32>, MachineError> {
        let result = self.translate(VirtAddr::new(addr), size, AccessType::Read)?;
        if let Some(exc) = result.exception {
            self.raise_exception(exc, addr, handler)?;
            return Ok(None);
        }
        self.memory.read(result.paddr, size).map(Some)
    }

    /// Writes the low `size` bytes of `value` at virtual `addr`.
    ///
    /// Returns `false` when the reference raised an exception instead.
    pub fn write_mem(
        &mut self,
        addr: u32,
        size: usize,
        value: u32,
        handler: &mut dyn ExceptionHandler,
    ) -> Result<bool, MachineError> {
        let result = self.translate(VirtAddr::new(addr), size, AccessType::Write)?;
        if let Some(exc) = result.exception {
            self.raise_exception(exc, addr, handler)?;
            return Ok(false);
        }
        self.memory.write(result.paddr, size, value)?;
        Ok(true)
    }

    /// Registers `store` as the backing store of thread `tid`.
    pub fn register_thread(
        &mut self,
        tid: ThreadId,
        store: Box<dyn BackingStore>,
    ) -> Result<(), MachineError> {
        if store.len() < self.backing_size {
            return Err(MachineError::InvalidConfig(format!(
                "backing store for thread {} holds {} bytes, need {}",
                tid,
                store.len(),
                self.backing_size
            )));
        }
        if self.spaces.insert(tid, store).is_some() {
            // A re-registered thread starts from its new store.
            self.mmu.release_thread(tid);
        }
        Ok(())
    }

    /// Installs `tid` as the running thread.
    pub fn switch_to(&mut self, tid: ThreadId) -> Result<(), MachineError> {
        if !self.spaces.contains(tid) {
            return Err(MachineError::UnknownThread(tid));
        }
        self.current = Some(tid);
        Ok(())
    }

    pub fn current_thread(&self) -> Option<ThreadId> {
        self.current
    }

    /// Tears down thread `tid`: its frames and TLB slots are invalidated
    /// without write-back and its store is handed back.
    pub fn release_thread(&mut self, tid: ThreadId) -> Option<Box<dyn BackingStore>> {
        let frames = self.mmu.release_thread(tid);
        debug!("machine: released thread {} ({} frames)", tid, frames.len());
        if self.current == Some(tid) {
            self.current = None;
        }
        self.spaces.remove(tid)
    }

    pub fn spaces(&self) -> &SpaceTable {
        &self.spaces
    }

    /// Backing store of thread `tid`.
    ///
    /// Stores leave the machine only through
    /// [`release_thread`](Self::release_thread), which drops their frames
    /// first.
    pub fn store_mut(
        &mut self,
        tid: ThreadId,
    ) -> Result<&mut (dyn BackingStore + 'static), MachineError> {
        self.spaces.get_mut(tid)
    }

    pub fn mode(&self) -> PrivilegeMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PrivilegeMode) {
        self.mode = mode;
    }

    pub fn translation_mode(&self) -> TranslationMode {
        self.mmu.mode()
    }

    pub fn flush_tlb(&mut self) {
        self.mmu.flush_tlb();
    }

    pub fn tlb(&self) -> Option<&Tlb> {
        self.mmu.tlb()
    }

    pub fn page_table(&self) -> &InvertedPageTable {
        self.mmu.page_table()
    }

    pub fn stats(&self) -> &TranslationStats {
        self.mmu.stats()
    }

    pub fn page_size(&self) -> u32 {
        self.mmu.page_size()
    }

    /// Register dump for the debugger.
    pub fn dump_state(&self) -> String {
        format!("{}\tMode:\t{}\n", self.regs.dump(), self.mode)
    }
}

impl Drop for Machine {
    fn drop(&mut self) {
        if self.mmu.tlb().is_some() {
            info!("{}", self.mmu.stats().hit_rate_line());
        }
    }
}
