//! Mapper trait: first refusal on CPU and PPU cartridge-space accesses.

use crate::cartridge::mapper::Mirroring;

/// Every hook sees the access before the bus's default decoding. Reads return `Some` when
/// the mapper claims the address; writes return `true` when claimed.
pub trait Mapper {
    fn id(&self) -> u8;

    fn read_from_cpu(&self, addr: u16) -> Option<u8>;
    fn write_from_cpu(&mut self, addr: u16, data: u8) -> bool;

    /// `addr` is already masked to 14 bits.
    fn read_from_ppu(&self, addr: u16) -> Option<u8>;
    fn write_from_ppu(&mut self, addr: u16, data: u8) -> bool;

    /// Current nametable mirroring for the bus's default resolver.
    fn mirroring(&self) -> Mirroring;
}
