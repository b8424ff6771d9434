use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use thiserror::Error;

use crate::engine::MemoryView;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("failed to open firmware image: {0}")]
    Io(#[from] std::io::Error),
}

/// Memory-mapped firmware dump together with its load address. The map is
/// kept alive by this struct; views borrow from it.
pub struct FirmwareImage {
    mmap: Mmap,
    base: u32,
    align: usize,
}

impl FirmwareImage {
    pub fn load(path: impl AsRef<Path>, base: u32, align: usize) -> Result<Self, ImageError> {
        let file = File::open(path)?;
        // Safety: the map is read-only and private to this process.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap, base, align })
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    pub fn view(&self) -> MemoryView<'_> {
        MemoryView::new(self.base, &self.mmap).with_align(self.align)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_and_view() {
        let mut path = std::env::temp_dir();
        path.push(format!("fof-image-{}.bin", std::process::id()));
        {
            let mut file = File::create(&path).unwrap();
            file.write_all(&[0x11, 0x22, 0x33, 0x44]).unwrap();
        }
        let image = FirmwareImage::load(&path, 0xA0000000, 2).unwrap();
        assert_eq!(image.len(), 4);
        let view = image.view();
        assert_eq!(view.base(), 0xA0000000);
        assert_eq!(view.align(), 2);
        assert_eq!(view.read_u32(0), Some(0x44332211));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(FirmwareImage::load("/nonexistent/firmware.bin", 0, 1).is_err());
    }
}
