//! NES mappers for PRG/CHR memory mapping.
//!
//! Mapper0 (NROM), Mapper1 (MMC1), the [`Mapper`](mapper::Mapper) trait and nametable mirroring.

use crate::cartridge::ines::INesHeader;
use crate::cartridge::memory::CartridgeMemory;
use crate::error::LoadError;

pub mod mapper;

pub mod mapper0;
pub mod mapper1;

use mapper::Mapper;
use mapper0::Mapper0;
use mapper1::Mapper1;

/// How the four logical nametables alias onto physical VRAM pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    OneScreenLower,
    OneScreenUpper,
    FourScreen,
}

impl Mirroring {
    /// Physical 1 KiB page backing logical nametable `table` (0–3).
    pub fn page(self, table: u16) -> u16 {
        match self {
            Mirroring::Horizontal => table >> 1,
            Mirroring::Vertical => table & 1,
            Mirroring::OneScreenLower => 0,
            Mirroring::OneScreenUpper => 1,
            Mirroring::FourScreen => table & 3,
        }
    }
}

/// Build the mapper named by the header around the cartridge memory.
pub fn create(header: &INesHeader, memory: CartridgeMemory) -> Result<Box<dyn Mapper>, LoadError> {
    match header.mapper_id() {
        0 => Ok(Box::new(Mapper0::new(memory, header.mirroring()))),
        1 => Ok(Box::new(Mapper1::new(memory))),
        id => Err(LoadError::UnsupportedMapper(id)),
    }
}
