/// Read-only view of a firmware dump: base address, borrowed byte buffer
/// and the caller's search alignment. Never mutated by the engine, so one
/// view can back any number of concurrent searches.
#[derive(Debug, Clone, Copy)]
pub struct MemoryView<'a> {
    base: u32,
    data: &'a [u8],
    align: usize,
}

impl<'a> MemoryView<'a> {
    pub fn new(base: u32, data: &'a [u8]) -> Self {
        Self {
            base,
            data,
            align: 1,
        }
    }

    pub fn with_align(mut self, align: usize) -> Self {
        self.align = align.max(1);
        self
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn align(&self) -> usize {
        self.align
    }

    /// Whether `[addr, addr + size)` lies inside the view.
    pub fn contains(&self, addr: u32, size: usize) -> bool {
        let base = self.base as u64;
        let addr = addr as u64;
        addr >= base && addr + size as u64 <= base + self.data.len() as u64
    }

    /// Buffer offset of an absolute address, if it is inside the view.
    pub fn offset_of(&self, addr: u32) -> Option<usize> {
        if self.contains(addr, 1) {
            Some((addr - self.base) as usize)
        } else {
            None
        }
    }

    pub fn address_of(&self, offset: usize) -> u32 {
        self.base.wrapping_add(offset as u32)
    }

    pub fn window(&self, offset: usize, len: usize) -> Option<&'a [u8]> {
        self.data.get(offset..offset.checked_add(len)?)
    }

    /// Little-endian word at a buffer offset.
    pub fn read_u32(&self, offset: usize) -> Option<u32> {
        let w = self.window(offset, 4)?;
        Some(u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
    }

    /// Dereference a 4-byte pointer at an absolute address.
    pub fn deref(&self, addr: u32) -> Option<u32> {
        if !self.contains(addr, 4) {
            return None;
        }
        self.read_u32((addr - self.base) as usize)
    }
}
