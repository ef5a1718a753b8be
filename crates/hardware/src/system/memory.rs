use crate::common::{MachineError, PhysAddr};

/// Simulated main memory: `num_frames` frames of `page_size` bytes.
///
/// Multi-byte accesses are little-endian regardless of the host.
pub struct MainMemory {
    bytes: Vec<u8>,
    page_size: usize,
    num_frames: usize,
}

impl MainMemory {
    pub fn new(page_size: u32, num_frames: usize) -> Self {
        let page_size = page_size as usize;
        Self {
            bytes: vec![0; page_size * num_frames],
            page_size,
            num_frames,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Bytes of frame `ppn`.
    pub fn frame(&self, ppn: usize) -> &[u8] {
        let start = ppn * self.page_size;
        &self.bytes[start..start + self.page_size]
    }

    pub fn frame_mut(&mut self, ppn: usize) -> &mut [u8] {
        let start = ppn * self.page_size;
        &mut self.bytes[start..start + self.page_size]
    }

    /// Copies `data` into memory at byte `offset`.
    pub fn load(&mut self, data: &[u8], offset: usize) -> Result<(), MachineError> {
        let range = self.check_bounds(PhysAddr::new(offset as u32), data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    /// Reads a 1, 2 or 4 byte little-endian value.
    pub fn read(&self, paddr: PhysAddr, size: usize) -> Result<u32, MachineError> {
        assert!(matches!(size, 1 | 2 | 4), "unsupported access width {}", size);
        let range = self.check_bounds(paddr, size)?;
        let b = &self.bytes[range];
        Ok(match size {
            1 => b[0] as u32,
            2 => u16::from_le_bytes([b[0], b[1]]) as u32,
            4 => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            _ => unreachable!(),
        })
    }

    /// Writes the low `size` bytes of `val`, little-endian.
    pub fn write(&mut self, paddr: PhysAddr, size: usize, val: u32) -> Result<(), MachineError> {
        assert!(matches!(size, 1 | 2 | 4), "unsupported access width {}", size);
        let range = self.check_bounds(paddr, size)?;
        let bytes = val.to_le_bytes();
        self.bytes[range].copy_from_slice(&bytes[..size]);
        Ok(())
    }

    fn check_bounds(
        &self,
        paddr: PhysAddr,
        size: usize,
    ) -> Result<std::ops::Range<usize>, MachineError> {
        let start = paddr.val() as usize;
        match start.checked_add(size) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => Err(MachineError::PhysicalBounds { paddr, size }),
        }
    }
}
