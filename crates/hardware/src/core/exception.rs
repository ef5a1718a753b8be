//! Kernel exception handler seam.

use super::machine::Machine;
use crate::common::{ExceptionType, MachineError};

/// The kernel's trap entry point.
///
/// Runs in system mode with the faulting address already in BadVAddr. It
/// may read and write registers and memory, request more translations, or
/// return an error to end the run.
pub trait ExceptionHandler {
    fn handle(&mut self, machine: &mut Machine, which: ExceptionType) -> Result<(), MachineError>;
}

impl<F> ExceptionHandler for F
where
    F: FnMut(&mut Machine, ExceptionType) -> Result<(), MachineError>,
{
    fn handle(&mut self, machine: &mut Machine, which: ExceptionType) -> Result<(), MachineError> {
        self(machine, which)
    }
}
