//! NES cartridge loading from iNES format (.nes files).
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte header, optional 512-byte
//! trainer, then PRG ROM, then CHR ROM. A zero CHR count means the board carries CHR RAM, which the
//! bus provides. [Mapper](https://www.nesdev.org/wiki/Mapper) implements CPU ($4020–$FFFF) and PPU
//! ($0000–$1FFF) first-refusal decoding and bank switching.

use std::fs;
use std::path::Path;

use crate::cartridge::ines::INesHeader;
use crate::cartridge::mapper::{self, Mirroring, mapper::Mapper};
use crate::cartridge::memory::CartridgeMemory;
use crate::error::LoadError;

/// Cartridge: header plus the mapper that owns PRG/CHR and decides mirroring.
pub struct Cartridge {
    pub header: INesHeader,
    pub mapper: Box<dyn Mapper>,
}

impl Cartridge {
    /// Load a cartridge from an iNES file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&data)
    }

    /// Parse an in-memory iNES image. Trailing bytes past CHR ROM are ignored.
    pub fn from_bytes(data: &[u8]) -> Result<Self, LoadError> {
        let header = INesHeader::parse(data)?;

        let prg_start = header.prg_offset();
        let chr_start = prg_start + header.prg_rom_size();
        let chr_end = chr_start + header.chr_rom_size();
        if data.len() < chr_end {
            return Err(LoadError::Truncated {
                expected: chr_end,
                found: data.len(),
            });
        }

        let memory = CartridgeMemory::new(&data[prg_start..chr_start], &data[chr_start..chr_end])?;
        let mapper = mapper::create(&header, memory)?;

        log::info!(
            "cartridge: mapper {:03}, {} KiB PRG, {} KiB CHR, {:?} mirroring{}",
            header.mapper_id(),
            header.prg_rom_size() / 1024,
            header.chr_rom_size() / 1024,
            mapper.mirroring(),
            if header.has_battery() { ", battery" } else { "" }
        );

        Ok(Self { header, mapper })
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring()
    }
}
