//! NES master palette: 64 colours indexed by the 6-bit values stored in palette RAM.
//!
//! The built-in table is a 2C02 approximation; `.pal` files (64 × R, G, B) can replace it.
//! Every lookup masks the index with `& 0x3F`.

use std::fs;
use std::path::Path;

use crate::error::LoadError;

pub const PALETTE_ENTRIES: usize = 64;

/// Default colours as 0xRRGGBB.
const DEFAULT_RGB: [u32; PALETTE_ENTRIES] = [
    0x545454, 0x001E74, 0x081090, 0x300088, 0x440064, 0x5C0030, 0x540400, 0x3C1800, 0x202A00,
    0x083A00, 0x004000, 0x003C00, 0x00302C, 0x000000, 0x000000, 0x000000, 0x989698, 0x084CC4,
    0x3032EC, 0x5C1EE4, 0x8814B0, 0xA01464, 0x982220, 0x783C00, 0x545A00, 0x287200, 0x087C00,
    0x007628, 0x006678, 0x000000, 0x000000, 0x000000, 0xECEEEC, 0x3C7EEC, 0x5C5CEC, 0x8844EC,
    0xB02CEC, 0xE028B0, 0xD83C50, 0xC45400, 0xAC7000, 0x808800, 0x409C30, 0x20A458, 0x209A88,
    0x404040, 0x000000, 0x000000, 0xECEEEC, 0xA8BCEC, 0xBCACEC, 0xD4A0EC, 0xEC94EC, 0xEC90D4,
    0xEC9CB4, 0xE4B090, 0xDCC878, 0xD4DC78, 0xB8EC98, 0xA8ECBC, 0xA0E4E4, 0xA0A0A0, 0x000000,
    0x000000,
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: [u32; PALETTE_ENTRIES],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_RGB,
        }
    }
}

impl Palette {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&data)
    }

    /// Build from raw R, G, B triples. Extra bytes (emphasis variants) are ignored.
    pub fn from_bytes(data: &[u8]) -> Result<Self, LoadError> {
        if data.len() < PALETTE_ENTRIES * 3 {
            return Err(LoadError::PaletteTooShort(data.len()));
        }

        let mut colors = [0u32; PALETTE_ENTRIES];
        for (color, rgb) in colors.iter_mut().zip(data.chunks_exact(3)) {
            *color = (rgb[0] as u32) << 16 | (rgb[1] as u32) << 8 | rgb[2] as u32;
        }
        Ok(Self { colors })
    }

    /// 0x00RRGGBB, the pixel format minifb expects.
    pub fn color(&self, index: u8) -> u32 {
        self.colors[(index & 0x3F) as usize]
    }

    pub fn rgb(&self, index: u8) -> (u8, u8, u8) {
        let c = self.color(index);
        ((c >> 16) as u8, (c >> 8) as u8, c as u8)
    }

    /// Convert a frame of palette indices into 0x00RRGGBB pixels.
    pub fn render(&self, indices: &[u8], out: &mut [u32]) {
        for (px, &index) in out.iter_mut().zip(indices) {
            *px = self.color(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_mask_to_six_bits() {
        let p = Palette::default();
        assert_eq!(p.color(0x40), p.color(0x00));
        assert_eq!(p.rgb(0x20), (0xEC, 0xEE, 0xEC));
    }

    #[test]
    fn parses_rgb_triples() {
        let mut data = vec![0u8; 192];
        data[3..6].copy_from_slice(&[0x12, 0x34, 0x56]);
        let p = Palette::from_bytes(&data).unwrap();
        assert_eq!(p.color(1), 0x123456);
    }

    #[test]
    fn short_file_is_rejected() {
        assert!(matches!(
            Palette::from_bytes(&[0; 100]),
            Err(LoadError::PaletteTooShort(100))
        ));
    }
}
