//! Translation statistics.
//!
//! Debug-only counters, not part of the translation contract. The TLB hit
//! rate is reported once when the machine shuts down.

use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TranslationStats {
    /// Translations that consulted the TLB.
    pub tlb_attempts: u64,
    pub tlb_hits: u64,
    /// TLB misses served from the inverted table without a page-in.
    pub tlb_refills: u64,
    /// References whose page was not resident.
    pub page_faults: u64,
    /// Page-ins that displaced a valid mapping.
    pub evictions: u64,
    pub write_backs: u64,
    /// Exceptions dispatched to the kernel.
    pub exceptions: u64,
}

impl TranslationStats {
    /// Fraction of TLB attempts that hit, `None` before the first attempt.
    pub fn hit_rate(&self) -> Option<f64> {
        if self.tlb_attempts == 0 {
            None
        } else {
            Some(self.tlb_hits as f64 / self.tlb_attempts as f64)
        }
    }

    /// The shutdown hit-rate line.
    pub fn hit_rate_line(&self) -> String {
        format!(
            "TLB Hit Rate: {} / {} = {:.6}",
            self.tlb_hits,
            self.tlb_attempts,
            self.hit_rate().unwrap_or(0.0)
        )
    }

    pub fn print(&self) {
        println!("\n==========================================================");
        println!("TRANSLATION STATISTICS");
        println!("==========================================================");
        println!("TLB");
        println!("  attempts             : {}", self.tlb_attempts);
        println!("  hits                 : {}", self.tlb_hits);
        match self.hit_rate() {
            Some(rate) => println!("  hit rate             : {:.2}%", rate * 100.0),
            None => println!("  hit rate             : n/a"),
        }
        println!("  refills              : {}", self.tlb_refills);
        println!("----------------------------------------------------------");
        println!("PAGING");
        println!("  page faults          : {}", self.page_faults);
        println!("  evictions            : {}", self.evictions);
        println!("  write-backs          : {}", self.write_backs);
        println!("----------------------------------------------------------");
        println!("  exceptions raised    : {}", self.exceptions);
        println!("==========================================================");
    }
}
