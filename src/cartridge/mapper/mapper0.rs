//! Mapper 0 (NROM): no bank switching, 16/32 KiB PRG, 8 KiB CHR, 8 KiB PRG RAM.

use crate::cartridge::mapper::{Mirroring, mapper::Mapper};
use crate::cartridge::memory::CartridgeMemory;

const PRG_RAM_SIZE: usize = 8 * 1024;

/// NROM mapper: fixed PRG and CHR. A single 16 KiB PRG bank shows up in both halves of $8000–$FFFF.
pub struct Mapper0 {
    memory: CartridgeMemory,
    prg_ram: Vec<u8>,
    mirroring: Mirroring,
}

impl Mapper0 {
    pub fn new(memory: CartridgeMemory, mirroring: Mirroring) -> Self {
        Self {
            memory,
            prg_ram: vec![0; PRG_RAM_SIZE],
            mirroring,
        }
    }
}

impl Mapper for Mapper0 {
    fn id(&self) -> u8 {
        0
    }

    fn read_from_cpu(&self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF => Some(self.prg_ram[(addr - 0x6000) as usize]),
            // PRG ROM wraps at its own size, which mirrors a lone 16 KiB bank
            0x8000..=0xFFFF => Some(self.memory.prg((addr - 0x8000) as usize)),
            _ => None,
        }
    }

    fn write_from_cpu(&mut self, addr: u16, data: u8) -> bool {
        match addr {
            0x6000..=0x7FFF => {
                self.prg_ram[(addr - 0x6000) as usize] = data;
                true
            }
            0x8000..=0xFFFF => true, // ROM
            _ => false,
        }
    }

    fn read_from_ppu(&self, addr: u16) -> Option<u8> {
        match addr {
            0x0000..=0x1FFF if self.memory.chr_size() > 0 => Some(self.memory.chr(addr as usize)),
            _ => None,
        }
    }

    fn write_from_ppu(&mut self, addr: u16, _data: u8) -> bool {
        // CHR ROM swallows writes; CHR-less boards fall through to the bus pattern store
        addr < 0x2000 && self.memory.chr_size() > 0
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
