//! Mapper 1 (MMC1): bank switching via a 5-bit serial shift register.
//!
//! [MMC1](https://www.nesdev.org/wiki/MMC1): writes to $8000–$9FFF (control), $A000–$BFFF (CHR0),
//! $C000–$DFFF (CHR1), $E000–$FFFF (PRG bank). Any write with bit 7 set resets the shift register.
//! Otherwise bit 0 is shifted in from the top; the write that finds the marker bit in bit 0 commits
//! the five collected bits to the register picked by address bits 13–14. Control bits 0–1 select
//! mirroring, bits 2–3 the PRG mode and bit 4 the CHR mode.

use crate::cartridge::mapper::{Mirroring, mapper::Mapper};
use crate::cartridge::memory::CartridgeMemory;

const SHIFT_RESET: u8 = 0x10;
const CONTROL_POWER_ON: u8 = 0x0C;
const PRG_RAM_SIZE: usize = 8 * 1024;
const PRG_BANK: usize = 16 * 1024;
const CHR_BANK: usize = 4 * 1024;

/// MMC1 state: shift register, control byte (mirroring + PRG/CHR mode), two CHR banks and a PRG bank.
pub struct Mapper1 {
    memory: CartridgeMemory,
    prg_ram: Vec<u8>,
    shift_reg: u8,
    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,
}

impl Mapper1 {
    /// Control starts at $0C (PRG mode 3: $8000 switchable, $C000 fixed to the last bank).
    pub fn new(memory: CartridgeMemory) -> Self {
        Self {
            memory,
            prg_ram: vec![0; PRG_RAM_SIZE],
            shift_reg: SHIFT_RESET,
            control: CONTROL_POWER_ON,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
        }
    }

    /// PRG bank mode from control bits 2–3: 0/1 = 32 KiB; 2 = first bank fixed at $8000; 3 = last bank fixed at $C000.
    fn prg_bank_mode(&self) -> u8 {
        (self.control >> 2) & 0b11
    }

    fn chr_4k_mode(&self) -> bool {
        self.control & 0x10 != 0
    }

    fn prg_offset(&self, addr: u16) -> usize {
        let bank = (self.prg_bank & 0x0F) as usize;
        let addr = addr as usize;

        match self.prg_bank_mode() {
            0 | 1 => (bank & !1) * PRG_BANK + (addr - 0x8000),
            2 => {
                if addr < 0xC000 {
                    addr - 0x8000
                } else {
                    bank * PRG_BANK + (addr - 0xC000)
                }
            }
            _ => {
                if addr < 0xC000 {
                    bank * PRG_BANK + (addr - 0x8000)
                } else {
                    let last = self.memory.prg_size().saturating_sub(PRG_BANK);
                    last + (addr - 0xC000)
                }
            }
        }
    }

    fn chr_offset(&self, addr: u16) -> usize {
        let addr = addr as usize;
        if self.chr_4k_mode() {
            if addr < 0x1000 {
                self.chr_bank0 as usize * CHR_BANK + addr
            } else {
                self.chr_bank1 as usize * CHR_BANK + (addr - 0x1000)
            }
        } else {
            (self.chr_bank0 & 0x1E) as usize * CHR_BANK + addr
        }
    }

    fn write_register(&mut self, addr: u16, data: u8) {
        if data & 0x80 != 0 {
            self.shift_reg = SHIFT_RESET;
            self.control |= CONTROL_POWER_ON;
            return;
        }

        let complete = self.shift_reg & 1 != 0;
        self.shift_reg = (self.shift_reg >> 1) | ((data & 1) << 4);
        if !complete {
            return;
        }

        let value = self.shift_reg & 0x1F;
        match (addr >> 13) & 0b11 {
            0 => self.control = value,
            1 => self.chr_bank0 = value,
            2 => self.chr_bank1 = value,
            _ => self.prg_bank = value,
        }
        log::debug!(
            "MMC1 ${:04X} <- {:05b} (control {:05b}, chr {:02X}/{:02X}, prg {:02X})",
            addr,
            value,
            self.control,
            self.chr_bank0,
            self.chr_bank1,
            self.prg_bank
        );
        self.shift_reg = SHIFT_RESET;
    }
}

impl Mapper for Mapper1 {
    fn id(&self) -> u8 {
        1
    }

    fn read_from_cpu(&self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF => Some(self.prg_ram[(addr - 0x6000) as usize]),
            0x8000..=0xFFFF => Some(self.memory.prg(self.prg_offset(addr))),
            _ => None,
        }
    }

    fn write_from_cpu(&mut self, addr: u16, data: u8) -> bool {
        match addr {
            0x6000..=0x7FFF => {
                self.prg_ram[(addr - 0x6000) as usize] = data;
                true
            }
            0x8000..=0xFFFF => {
                self.write_register(addr, data);
                true
            }
            _ => false,
        }
    }

    fn read_from_ppu(&self, addr: u16) -> Option<u8> {
        match addr {
            0x0000..=0x1FFF if self.memory.chr_size() > 0 => {
                Some(self.memory.chr(self.chr_offset(addr)))
            }
            _ => None,
        }
    }

    fn write_from_ppu(&mut self, addr: u16, _data: u8) -> bool {
        addr < 0x2000 && self.memory.chr_size() > 0
    }

    /// Mirroring from control bits 0–1: 0 = one-screen lower, 1 = one-screen upper, 2 = vertical, 3 = horizontal.
    fn mirroring(&self) -> Mirroring {
        match self.control & 0b11 {
            0 => Mirroring::OneScreenLower,
            1 => Mirroring::OneScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }
}
