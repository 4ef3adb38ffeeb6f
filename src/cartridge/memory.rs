//! Backing store for a cartridge: PRG ROM followed by CHR ROM in one allocation.

use crate::error::LoadError;

pub struct CartridgeMemory {
    data: Vec<u8>,
    prg_size: usize,
    chr_size: usize,
}

impl CartridgeMemory {
    /// Copy `prg` and `chr` into a single buffer, surfacing allocation refusal as an error.
    pub fn new(prg: &[u8], chr: &[u8]) -> Result<Self, LoadError> {
        let total = prg.len() + chr.len();
        let mut data = Vec::new();
        data.try_reserve_exact(total)
            .map_err(|_| LoadError::Allocation(total))?;
        data.extend_from_slice(prg);
        data.extend_from_slice(chr);

        Ok(Self {
            data,
            prg_size: prg.len(),
            chr_size: chr.len(),
        })
    }

    pub fn prg_size(&self) -> usize {
        self.prg_size
    }

    pub fn chr_size(&self) -> usize {
        self.chr_size
    }

    /// PRG byte at `offset`, wrapped to the PRG size.
    pub fn prg(&self, offset: usize) -> u8 {
        if self.prg_size == 0 {
            return 0;
        }
        self.data[offset % self.prg_size]
    }

    /// CHR byte at `offset`, wrapped to the CHR size.
    pub fn chr(&self, offset: usize) -> u8 {
        if self.chr_size == 0 {
            return 0;
        }
        self.data[self.prg_size + offset % self.chr_size]
    }
}
