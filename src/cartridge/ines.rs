//! iNES header parsing.
//!
//! [iNES](https://www.nesdev.org/wiki/INES): magic "NES\x1A", PRG size in 16 KiB units, CHR size in
//! 8 KiB units, Flags 6 (mirroring, battery, trainer, four-screen, mapper low nibble), Flags 7
//! (mapper high nibble), Flags 8–10 and five bytes of padding.

use crate::cartridge::mapper::Mirroring;
use crate::error::LoadError;

pub const HEADER_SIZE: usize = 16;
pub const TRAINER_SIZE: usize = 512;
pub const PRG_BANK_SIZE: usize = 16 * 1024;
pub const CHR_BANK_SIZE: usize = 8 * 1024;

const MAGIC: [u8; 4] = *b"NES\x1A";

const FLAGS6_VERTICAL: u8 = 0x01;
const FLAGS6_BATTERY: u8 = 0x02;
const FLAGS6_TRAINER: u8 = 0x04;
const FLAGS6_FOUR_SCREEN: u8 = 0x08;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct INesHeader {
    pub prg_banks: u8,
    pub chr_banks: u8,
    pub flags6: u8,
    pub flags7: u8,
    pub flags8: u8,
    pub flags9: u8,
    pub flags10: u8,
}

impl INesHeader {
    pub fn parse(data: &[u8]) -> Result<Self, LoadError> {
        if data.len() < HEADER_SIZE {
            return Err(LoadError::Truncated {
                expected: HEADER_SIZE,
                found: data.len(),
            });
        }
        if data[0..4] != MAGIC {
            return Err(LoadError::BadMagic);
        }

        Ok(Self {
            prg_banks: data[4],
            chr_banks: data[5],
            flags6: data[6],
            flags7: data[7],
            flags8: data[8],
            flags9: data[9],
            flags10: data[10],
        })
    }

    pub fn mapper_id(&self) -> u8 {
        ((self.flags6 >> 4) & 0x0F) | (self.flags7 & 0xF0)
    }

    /// Solder-pad mirroring, overridden by the four-screen bit.
    pub fn mirroring(&self) -> Mirroring {
        if self.flags6 & FLAGS6_FOUR_SCREEN != 0 {
            Mirroring::FourScreen
        } else if self.flags6 & FLAGS6_VERTICAL != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        }
    }

    pub fn has_battery(&self) -> bool {
        self.flags6 & FLAGS6_BATTERY != 0
    }

    pub fn has_trainer(&self) -> bool {
        self.flags6 & FLAGS6_TRAINER != 0
    }

    pub fn prg_rom_size(&self) -> usize {
        self.prg_banks as usize * PRG_BANK_SIZE
    }

    pub fn chr_rom_size(&self) -> usize {
        self.chr_banks as usize * CHR_BANK_SIZE
    }

    /// Offset of the first PRG byte in the file.
    pub fn prg_offset(&self) -> usize {
        HEADER_SIZE + if self.has_trainer() { TRAINER_SIZE } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(flags6: u8, flags7: u8) -> [u8; 16] {
        let mut h = [0u8; 16];
        h[0..4].copy_from_slice(b"NES\x1A");
        h[4] = 2;
        h[5] = 1;
        h[6] = flags6;
        h[7] = flags7;
        h
    }

    #[test]
    fn mapper_id_combines_both_nibbles() {
        let h = INesHeader::parse(&header(0x10, 0x20)).unwrap();
        assert_eq!(h.mapper_id(), 0x21);
    }

    #[test]
    fn four_screen_overrides_solder_pads() {
        let h = INesHeader::parse(&header(0x09, 0)).unwrap();
        assert_eq!(h.mirroring(), Mirroring::FourScreen);
        let h = INesHeader::parse(&header(0x01, 0)).unwrap();
        assert_eq!(h.mirroring(), Mirroring::Vertical);
        let h = INesHeader::parse(&header(0x00, 0)).unwrap();
        assert_eq!(h.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn trainer_moves_prg_start() {
        let h = INesHeader::parse(&header(0x04, 0)).unwrap();
        assert_eq!(h.prg_offset(), 16 + 512);
        assert_eq!(h.prg_rom_size(), 32 * 1024);
        assert_eq!(h.chr_rom_size(), 8 * 1024);
    }

    #[test]
    fn rejects_bad_magic_and_short_header() {
        let mut h = header(0, 0);
        h[3] = 0;
        assert!(matches!(INesHeader::parse(&h), Err(LoadError::BadMagic)));
        assert!(matches!(
            INesHeader::parse(&h[..8]),
            Err(LoadError::Truncated { expected: 16, found: 8 })
        ));
    }
}
