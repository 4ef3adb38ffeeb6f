//! Sprite evaluation, fetch and per-dot output.
//!
//! See [PPU sprite evaluation](https://www.nesdev.org/wiki/PPU_sprite_evaluation). On each visible
//! line, dots 1–64 clear secondary OAM, dots 65–256 copy up to eight sprites covering the current
//! line into it, and dots 257–320 fetch their patterns for display on the next line.

use crate::bus::PpuBus;
use crate::ppu::ppu::{
    CTRL_SPRITE_16, CTRL_SPRITE_TABLE, PPU, PRE_RENDER_LINE, STATUS_OVERFLOW,
};

pub const SPRITES_PER_LINE: usize = 8;

const ATTR_PALETTE: u8 = 0x03;
const ATTR_BEHIND_BACKGROUND: u8 = 0x20;
const ATTR_FLIP_HORIZONTAL: u8 = 0x40;
const ATTR_FLIP_VERTICAL: u8 = 0x80;

/// One OAM entry: top Y minus one, tile, attributes, left X.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OamEntry {
    pub y: u8,
    pub tile: u8,
    pub attributes: u8,
    pub x: u8,
}

impl OamEntry {
    pub fn byte(&self, index: u8) -> u8 {
        match index & 3 {
            0 => self.y,
            1 => self.tile,
            2 => self.attributes,
            _ => self.x,
        }
    }

    pub fn set_byte(&mut self, index: u8, value: u8) {
        match index & 3 {
            0 => self.y = value,
            1 => self.tile = value,
            2 => self.attributes = value,
            _ => self.x = value,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EvaluationState {
    #[default]
    NewSprite,
    CopySprite,
    Overflow,
    End,
}

/// Output shifters for one sprite on the line being drawn.
#[derive(Clone, Copy, Debug, Default)]
struct SpriteSlot {
    x_counter: u8,
    pattern_lo: u8,
    pattern_hi: u8,
    attributes: u8,
}

/// Opaque sprite pixel at the current dot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpritePixel {
    pub pixel: u8,
    /// Palette 4–7.
    pub palette: u8,
    pub behind_background: bool,
    pub slot: usize,
}

#[derive(Debug, Default)]
pub struct SpriteUnit {
    secondary: [OamEntry; SPRITES_PER_LINE],
    state: EvaluationState,
    /// Primary OAM sprite being examined (n).
    oam_index: u8,
    /// Byte within that sprite (m).
    byte_index: u8,
    found: usize,
    sprite_zero_found: bool,

    slots: [SpriteSlot; SPRITES_PER_LINE],
    slot_count: usize,
    sprite_zero_on_line: bool,
}

impl SpriteUnit {
    /// Whether slot 0 of the line being drawn holds OAM sprite 0.
    pub fn sprite_zero_on_line(&self) -> bool {
        self.sprite_zero_on_line
    }

    /// Number of sprites loaded for the line being drawn.
    pub fn count(&self) -> usize {
        self.slot_count
    }

    /// Highest-priority opaque sprite pixel at this dot.
    pub fn pixel(&self) -> Option<SpritePixel> {
        self.slots[..self.slot_count]
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.x_counter == 0)
            .find_map(|(i, slot)| {
                let pixel = (slot.pattern_hi >> 7) << 1 | (slot.pattern_lo >> 7);
                (pixel != 0).then_some(SpritePixel {
                    pixel,
                    palette: 4 + (slot.attributes & ATTR_PALETTE),
                    behind_background: slot.attributes & ATTR_BEHIND_BACKGROUND != 0,
                    slot: i,
                })
            })
    }

    /// After each drawn dot: count down to each sprite's X, then shift its pattern out.
    pub fn shift(&mut self) {
        for slot in &mut self.slots[..self.slot_count] {
            if slot.x_counter > 0 {
                slot.x_counter -= 1;
            } else {
                slot.pattern_lo <<= 1;
                slot.pattern_hi <<= 1;
            }
        }
    }

    fn secondary_byte_mut(&mut self, index: usize) -> (&mut OamEntry, u8) {
        (&mut self.secondary[index / 4], (index % 4) as u8)
    }
}

impl PPU {
    fn sprite_height(&self) -> i16 {
        if self.ctrl.is_bit_set(CTRL_SPRITE_16) { 16 } else { 8 }
    }

    fn sprite_covers_line(&self, y: u8) -> bool {
        let row = self.vcount - y as i16;
        (0..self.sprite_height()).contains(&row)
    }

    /// Dots 1–256 of a visible line while rendering.
    pub(crate) fn evaluate_sprites_dot(&mut self) {
        match self.hcount {
            // Clear secondary OAM, one byte every other dot
            1..=64 => {
                if self.hcount % 2 == 0 {
                    let (entry, byte) = self.sprites.secondary_byte_mut((self.hcount / 2 - 1) as usize);
                    entry.set_byte(byte, 0xFF);
                }
            }
            65..=256 => {
                if self.hcount == 65 {
                    let sprites = &mut self.sprites;
                    sprites.state = EvaluationState::NewSprite;
                    sprites.oam_index = 0;
                    sprites.byte_index = 0;
                    sprites.found = 0;
                    sprites.sprite_zero_found = false;
                }
                if self.hcount % 2 == 1 {
                    self.evaluation_step();
                }
            }
            _ => {}
        }
    }

    fn evaluation_step(&mut self) {
        let n = self.sprites.oam_index as usize;

        match self.sprites.state {
            EvaluationState::NewSprite => {
                let y = self.oam[n].y;
                let found = self.sprites.found;
                self.sprites.secondary[found].y = y;
                if self.sprite_covers_line(y) {
                    if n == 0 {
                        self.sprites.sprite_zero_found = true;
                    }
                    self.sprites.byte_index = 1;
                    self.sprites.state = EvaluationState::CopySprite;
                } else {
                    self.next_sprite();
                }
            }
            EvaluationState::CopySprite => {
                let m = self.sprites.byte_index;
                let found = self.sprites.found;
                self.sprites.secondary[found].set_byte(m, self.oam[n].byte(m));
                self.sprites.byte_index += 1;
                if self.sprites.byte_index == 4 {
                    self.sprites.found += 1;
                    self.next_sprite();
                }
            }
            // Eight found: the hardware keeps reading, but advances m together with n,
            // so it compares tile, attribute and X bytes as if they were Y
            EvaluationState::Overflow => {
                let m = self.sprites.byte_index;
                let value = self.oam[n].byte(m);
                if self.sprite_covers_line(value) {
                    self.status.set_bits(STATUS_OVERFLOW);
                    self.sprites.state = EvaluationState::End;
                } else {
                    self.sprites.oam_index += 1;
                    self.sprites.byte_index = (m + 1) & 3;
                    if self.sprites.oam_index == 64 {
                        self.sprites.state = EvaluationState::End;
                    }
                }
            }
            EvaluationState::End => {}
        }
    }

    fn next_sprite(&mut self) {
        let sprites = &mut self.sprites;
        sprites.oam_index += 1;
        sprites.byte_index = 0;
        sprites.state = if sprites.oam_index == 64 {
            EvaluationState::End
        } else if sprites.found == SPRITES_PER_LINE {
            EvaluationState::Overflow
        } else {
            EvaluationState::NewSprite
        };
    }

    /// Dots 257–320 of the pre-render and visible lines while rendering.
    pub(crate) fn fetch_sprites_dot<B: PpuBus>(&mut self, bus: &mut B) {
        if !(257..=320).contains(&self.hcount) {
            return;
        }
        self.oam_address.write(0);

        let offset = self.hcount - 257;
        let slot = (offset / 8) as usize;

        if offset == 0 {
            if self.vcount == PRE_RENDER_LINE {
                self.sprites.found = 0;
                self.sprites.sprite_zero_found = false;
            }
            self.sprites.slot_count = self.sprites.found;
            self.sprites.sprite_zero_on_line = self.sprites.sprite_zero_found;
        }

        let entry = self.sprites.secondary[slot];
        let in_use = slot < self.sprites.slot_count;

        match offset % 8 {
            3 => {
                let target = &mut self.sprites.slots[slot];
                target.attributes = entry.attributes;
                target.x_counter = entry.x;
            }
            5 => {
                let lo = if in_use {
                    bus.read(self.sprite_row_address(&entry))
                } else {
                    0
                };
                self.sprites.slots[slot].pattern_lo = lo;
            }
            7 => {
                let hi = if in_use {
                    bus.read(self.sprite_row_address(&entry) + 8)
                } else {
                    0
                };
                let target = &mut self.sprites.slots[slot];
                target.pattern_hi = hi;
                if entry.attributes & ATTR_FLIP_HORIZONTAL != 0 {
                    target.pattern_lo = target.pattern_lo.reverse_bits();
                    target.pattern_hi = target.pattern_hi.reverse_bits();
                }
            }
            _ => {}
        }
    }

    /// Low-plane pattern address of the sprite row that falls on the current line.
    fn sprite_row_address(&self, entry: &OamEntry) -> u16 {
        let height = self.sprite_height();
        let mut row = (self.vcount - entry.y as i16).clamp(0, height - 1) as u16;
        if entry.attributes & ATTR_FLIP_VERTICAL != 0 {
            row = height as u16 - 1 - row;
        }

        if height == 16 {
            let table = (entry.tile as u16 & 1) << 12;
            let tile = (entry.tile & 0xFE) as u16 + (row >> 3);
            table | tile << 4 | (row & 7)
        } else {
            let table = if self.ctrl.is_bit_set(CTRL_SPRITE_TABLE) { 0x1000 } else { 0 };
            table | (entry.tile as u16) << 4 | row
        }
    }
}
