//! Address translation unit.
//!
//! The [`Mmu`] owns the inverted page table, the translation strategy the
//! machine was configured with and the translation statistics. It is built
//! once per run and reached only through the [`Machine`](crate::Machine)
//! that owns it.

use log::trace;

use self::inverted::InvertedPageTable;
use self::tlb::Tlb;
use self::translation::{CachedTranslation, DirectTranslation, Pager, Translation};
use crate::common::{AccessType, ExceptionType, MachineError, TranslationResult, VirtAddr};
use crate::config::{Config, TranslationMode};
use crate::stats::TranslationStats;
use crate::system::{MainMemory, SpaceTable, ThreadId};

pub mod entry;
pub mod inverted;
pub mod policies;
pub mod tlb;
pub mod translation;

pub struct Mmu {
    table: InvertedPageTable,
    strategy: Box<dyn Translation>,
    stats: TranslationStats,
    page_size: u32,
    num_virtual_pages: u32,
    trace: bool,
}

impl Mmu {
    pub fn new(config: &Config) -> Self {
        let strategy: Box<dyn Translation> = match config.translation.mode {
            TranslationMode::Cached => {
                Box::new(CachedTranslation::new(config.translation.tlb_size))
            }
            TranslationMode::Direct => Box::new(DirectTranslation::new()),
        };
        let table = InvertedPageTable::new(
            config.memory.num_phys_pages,
            config.memory.page_size,
            config.translation.random_seed,
        );
        Self::with_parts(config, table, strategy)
    }

    /// Builds an MMU around a caller-supplied table and strategy.
    pub fn with_parts(
        config: &Config,
        table: InvertedPageTable,
        strategy: Box<dyn Translation>,
    ) -> Self {
        Self {
            table,
            strategy,
            stats: TranslationStats::default(),
            page_size: config.memory.page_size,
            num_virtual_pages: config.memory.num_virtual_pages as u32,
            trace: config.general.trace,
        }
    }

    /// Translates `vaddr` for a `size`-byte access by thread `tid`.
    ///
    /// Widths other than 1, 2 or 4 bytes, misaligned references and pages
    /// beyond the address space come back as `AddressError`; the rest is up
    /// to the strategy.
    pub fn translate(
        &mut self,
        vaddr: VirtAddr,
        size: usize,
        access: AccessType,
        tid: ThreadId,
        memory: &mut MainMemory,
        spaces: &mut SpaceTable,
    ) -> Result<TranslationResult, MachineError> {
        let addr = vaddr.val();
        let misaligned = match size {
            1 => false,
            2 => addr & 0x1 != 0,
            4 => addr & 0x3 != 0,
            _ => {
                trace!("translate {}: unsupported width {}", vaddr, size);
                return Ok(TranslationResult::fault(ExceptionType::AddressError));
            }
        };
        if misaligned {
            trace!("translate {} ({} bytes): misaligned", vaddr, size);
            return Ok(TranslationResult::fault(ExceptionType::AddressError));
        }

        let vpn = vaddr.vpn(self.page_size);
        if vpn >= self.num_virtual_pages {
            trace!(
                "translate {}: vpn {} beyond {} pages",
                vaddr, vpn, self.num_virtual_pages
            );
            return Ok(TranslationResult::fault(ExceptionType::AddressError));
        }

        let mut pager = Pager {
            table: &mut self.table,
            memory,
            spaces,
            stats: &mut self.stats,
            page_size: self.page_size,
        };
        let result = self.strategy.translate(
            &mut pager,
            tid,
            vpn,
            vaddr.page_offset(self.page_size),
            access,
        )?;

        if self.trace {
            match result.exception {
                None => trace!(
                    "translate tid {} {:?} {} -> {}",
                    tid, access, vaddr, result.paddr
                ),
                Some(exc) => trace!("translate tid {} {:?} {} -> {}", tid, access, vaddr, exc),
            }
        }
        Ok(result)
    }

    /// Drops every frame and cached mapping owned by `tid`.
    pub fn release_thread(&mut self, tid: ThreadId) -> Vec<u32> {
        self.strategy.invalidate_thread(tid);
        self.table.release_thread(tid)
    }

    pub fn flush_tlb(&mut self) {
        self.strategy.flush();
    }

    pub fn mode(&self) -> TranslationMode {
        self.strategy.mode()
    }

    pub fn page_table(&self) -> &InvertedPageTable {
        &self.table
    }

    pub fn tlb(&self) -> Option<&Tlb> {
        self.strategy.tlb()
    }

    pub fn stats(&self) -> &TranslationStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut TranslationStats {
        &mut self.stats
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}
