//! Backing stores ("virtual disks").
//!
//! Each address space owns a flat store at least `num_virtual_pages *
//! page_size` bytes long. Page `vpn` lives at byte offset `vpn *
//! page_size`; the MMU only ever moves whole pages in and out.

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Byte-addressable storage behind one address space.
pub trait BackingStore: Send {
    /// Size of the store in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fills `buf` from byte `offset`.
    fn read_at(&mut self, offset: usize, buf: &mut [u8]) -> io::Result<()>;

    /// Stores `data` at byte `offset`.
    fn write_at(&mut self, offset: usize, data: &[u8]) -> io::Result<()>;

    /// Whether page `vpn` must be mapped write-protected.
    fn is_read_only(&self, _vpn: u32) -> bool {
        false
    }
}

fn out_of_range(offset: usize, len: usize, size: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!(
            "range {}..{} beyond end of {}-byte store",
            offset,
            offset + len,
            size
        ),
    )
}

/// In-memory backing store.
#[derive(Clone, Debug, Default)]
pub struct VirtualDisk {
    bytes: Vec<u8>,
    read_only: BTreeSet<u32>,
}

impl VirtualDisk {
    /// A zero-filled store of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self::from_bytes(vec![0; size])
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            read_only: BTreeSet::new(),
        }
    }

    /// Marks page `vpn` read-only for subsequent page-ins.
    pub fn protect(&mut self, vpn: u32) {
        self.read_only.insert(vpn);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl BackingStore for VirtualDisk {
    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn read_at(&mut self, offset: usize, buf: &mut [u8]) -> io::Result<()> {
        let src = offset
            .checked_add(buf.len())
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or_else(|| out_of_range(offset, buf.len(), self.bytes.len()))?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write_at(&mut self, offset: usize, data: &[u8]) -> io::Result<()> {
        let size = self.bytes.len();
        let dst = offset
            .checked_add(data.len())
            .and_then(|end| self.bytes.get_mut(offset..end))
            .ok_or_else(|| out_of_range(offset, data.len(), size))?;
        dst.copy_from_slice(data);
        Ok(())
    }

    fn is_read_only(&self, vpn: u32) -> bool {
        self.read_only.contains(&vpn)
    }
}

/// Backing store kept in a host file.
#[derive(Debug)]
pub struct FileDisk {
    file: File,
    len: usize,
}

impl FileDisk {
    /// Creates (or truncates) `path` as a zero-filled store of `size` bytes.
    pub fn create(path: impl AsRef<Path>, size: usize) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(size as u64)?;
        Ok(Self { file, len: size })
    }

    /// Opens an existing store; its size is the file's length.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len() as usize;
        Ok(Self { file, len })
    }
}

impl BackingStore for FileDisk {
    fn len(&self) -> usize {
        self.len
    }

    fn read_at(&mut self, offset: usize, buf: &mut [u8]) -> io::Result<()> {
        if offset + buf.len() > self.len {
            return Err(out_of_range(offset, buf.len(), self.len));
        }
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.read_exact(buf)
    }

    fn write_at(&mut self, offset: usize, data: &[u8]) -> io::Result<()> {
        if offset + data.len() > self.len {
            return Err(out_of_range(offset, data.len(), self.len));
        }
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.write_all(data)?;
        self.file.flush()
    }
}
