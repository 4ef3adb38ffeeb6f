//! Synthetic cartridges for unit tests.

use crate::cartridge::cartridge::Cartridge;
use crate::cartridge::mapper::Mirroring;

/// iNES image of a one-bank NROM board. `prg` lands at $8000; the reset and IRQ vectors point
/// there and the NMI vector at `nmi`. An empty `chr` gives a CHR RAM board.
pub fn nrom_image(prg: &[u8], chr: &[u8], mirroring: Mirroring, nmi: u16) -> Vec<u8> {
    let flags6 = match mirroring {
        Mirroring::Vertical => 0x01,
        Mirroring::FourScreen => 0x08,
        _ => 0x00,
    };
    let chr_banks = if chr.is_empty() { 0 } else { 1 };

    let mut image = vec![b'N', b'E', b'S', 0x1A, 1, chr_banks, flags6, 0];
    image.resize(16, 0);

    let mut bank = vec![0u8; 0x4000];
    bank[..prg.len()].copy_from_slice(prg);
    bank[0x3FFA..0x3FFC].copy_from_slice(&nmi.to_le_bytes());
    bank[0x3FFC..0x3FFE].copy_from_slice(&0x8000u16.to_le_bytes());
    bank[0x3FFE..0x4000].copy_from_slice(&0x8000u16.to_le_bytes());
    image.extend_from_slice(&bank);

    if !chr.is_empty() {
        let mut pattern = vec![0u8; 0x2000];
        pattern[..chr.len()].copy_from_slice(chr);
        image.extend_from_slice(&pattern);
    }
    image
}

pub fn nrom_with_vectors(prg: &[u8], chr: &[u8], mirroring: Mirroring, nmi: u16) -> Cartridge {
    Cartridge::from_bytes(&nrom_image(prg, chr, mirroring, nmi)).expect("valid NROM image")
}

pub fn nrom(prg: &[u8], chr: &[u8], mirroring: Mirroring) -> Cartridge {
    nrom_with_vectors(prg, chr, mirroring, 0x8000)
}
