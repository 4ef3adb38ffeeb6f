//! NES PPU (Picture Processing Unit), dot by dot.
//!
//! Implements the 2C02 [PPU rendering](https://www.nesdev.org/wiki/PPU_rendering) pipeline: 341 dots
//! per scanline, 262 scanlines per frame (pre-render line -1, visible 0–239, vblank from 241), the
//! background shift registers, sprite evaluation into secondary OAM, and pixel compositing. Registers
//! are [`ClockedRegister`]s committed once per dot by [`PPU::clock_registers`].
//!
//! Timing: [`PPU::tick`] is called once per master tick and runs a dot every fourth call, giving three
//! dots per CPU cycle against the CPU's twelve-tick divider.

use crate::bus::PpuBus;
use crate::clocked_register::ClockedRegister;
use crate::ppu::sprites::{OamEntry, SpriteUnit};

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 240;

pub const DOTS_PER_LINE: u16 = 341;
pub const PRE_RENDER_LINE: i16 = -1;
pub const VBLANK_LINE: i16 = 241;
/// VCount runs -1..=260; reaching this wraps to the pre-render line.
const LINE_WRAP: i16 = 261;

/// Master ticks per dot.
const PHASES: u8 = 4;
/// Phase on which staged register values are committed.
pub const REGISTER_PHASE: u8 = 1;

// PPUCTRL ($2000)
pub const CTRL_NAMETABLE: u8 = 0x03;
pub const CTRL_INCREMENT_32: u8 = 0x04;
pub const CTRL_SPRITE_TABLE: u8 = 0x08;
pub const CTRL_BACKGROUND_TABLE: u8 = 0x10;
pub const CTRL_SPRITE_16: u8 = 0x20;
pub const CTRL_NMI: u8 = 0x80;

// PPUMASK ($2001)
pub const MASK_GREYSCALE: u8 = 0x01;
pub const MASK_BACKGROUND_LEFT: u8 = 0x02;
pub const MASK_SPRITES_LEFT: u8 = 0x04;
pub const MASK_BACKGROUND: u8 = 0x08;
pub const MASK_SPRITES: u8 = 0x10;

// PPUSTATUS ($2002)
pub const STATUS_OVERFLOW: u8 = 0x20;
pub const STATUS_SPRITE_ZERO: u8 = 0x40;
pub const STATUS_VBLANK: u8 = 0x80;

/// Background shift registers and the latches that feed them every eight dots.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Background {
    pattern_lo: u16,
    pattern_hi: u16,
    attribute_lo: u16,
    attribute_hi: u16,
    next_tile: u8,
    next_attribute: u8,
    next_lo: u8,
    next_hi: u8,
}

impl Background {
    fn load(&mut self) {
        self.pattern_lo = (self.pattern_lo & 0xFF00) | self.next_lo as u16;
        self.pattern_hi = (self.pattern_hi & 0xFF00) | self.next_hi as u16;
        self.attribute_lo =
            (self.attribute_lo & 0xFF00) | if self.next_attribute & 1 != 0 { 0xFF } else { 0 };
        self.attribute_hi =
            (self.attribute_hi & 0xFF00) | if self.next_attribute & 2 != 0 { 0xFF } else { 0 };
    }

    fn shift(&mut self) {
        self.pattern_lo <<= 1;
        self.pattern_hi <<= 1;
        self.attribute_lo <<= 1;
        self.attribute_hi <<= 1;
    }

    /// (pixel, palette) under fine X.
    fn pixel(&self, fine_x: u8) -> (u8, u8) {
        let mux = 0x8000u16 >> fine_x;
        let bit = |reg: u16| (reg & mux != 0) as u8;
        (
            bit(self.pattern_hi) << 1 | bit(self.pattern_lo),
            bit(self.attribute_hi) << 1 | bit(self.attribute_lo),
        )
    }
}

/// PPU state: timing, registers, scroll (v/t/x), pipelines, OAM, and the frame of palette indices.
pub struct PPU {
    phase: u8,
    registers_clocked: bool,
    pub frame_count: u64,
    /// Scanline, -1 (pre-render) through 260.
    pub vcount: i16,
    /// Dot within the scanline, 0 through 340.
    pub hcount: u16,
    pub(crate) even_frame: bool,
    /// Set when entering vblank; the frontend clears it after presenting.
    pub frame_ready: bool,

    pub(crate) ctrl: ClockedRegister<u8>,
    pub(crate) mask: ClockedRegister<u8>,
    pub(crate) status: ClockedRegister<u8>,
    pub(crate) oam_address: ClockedRegister<u8>,
    pub(crate) oam_data: ClockedRegister<u8>,
    pub(crate) scroll: ClockedRegister<u8>,
    pub(crate) data: ClockedRegister<u8>,

    /// Shared first/second write toggle for $2005/$2006.
    pub(crate) address_latch: bool,
    /// Delayed $2007 read value.
    pub(crate) data_buffer: u8,
    /// Last value on the PPU's CPU data lines; what write-only registers read back as.
    pub(crate) latched_data: u8,

    //  14 13 12 11 10 9 8 7 6 5 4 3 2 1 0
    //   y  y  y  N  N Y Y Y Y Y X X X X X
    pub(crate) v: u16,
    pub(crate) t: u16,
    pub(crate) fine_x: u8,

    pub(crate) background: Background,
    pub(crate) oam: [OamEntry; 64],
    pub(crate) sprites: SpriteUnit,

    /// 256×240 palette indices (0–63), row-major.
    pub frame: Vec<u8>,
}

impl Default for PPU {
    fn default() -> Self {
        Self::new()
    }
}

impl PPU {
    /// Power-on state: pre-render line, dot 0, vblank and overflow bits up as on real hardware.
    pub fn new() -> Self {
        let mut status = ClockedRegister::new();
        status.write_immediate(0xA0);

        Self {
            phase: 0,
            registers_clocked: false,
            frame_count: 0,
            vcount: PRE_RENDER_LINE,
            hcount: 0,
            even_frame: false,
            frame_ready: false,
            ctrl: ClockedRegister::new(),
            mask: ClockedRegister::new(),
            status,
            oam_address: ClockedRegister::new(),
            oam_data: ClockedRegister::new(),
            scroll: ClockedRegister::new(),
            data: ClockedRegister::new(),
            address_latch: false,
            data_buffer: 0,
            latched_data: 0,
            v: 0,
            t: 0,
            fine_x: 0,
            background: Background::default(),
            oam: [OamEntry::default(); 64],
            sprites: SpriteUnit::default(),
            frame: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    /// Reset button: clears the write registers, keeps the vblank bit.
    pub fn reset(&mut self) {
        self.ctrl.reset();
        self.mask.reset();
        let vblank = self.status.read() & STATUS_VBLANK;
        self.status.write_immediate(vblank);
        self.scroll.reset();
        self.data.reset();
        self.address_latch = false;
        self.data_buffer = 0;
    }

    pub fn phase(&self) -> u8 {
        self.phase
    }

    pub fn is_rendering(&self) -> bool {
        self.mask.is_bit_set(MASK_BACKGROUND | MASK_SPRITES)
    }

    /// NMI output, re-derived every dot: vblank AND the NMI enable bit.
    pub fn nmi_output(&self) -> bool {
        self.status.is_bit_set(STATUS_VBLANK) && self.ctrl.is_bit_set(CTRL_NMI)
    }

    pub fn status(&self) -> u8 {
        self.status.read()
    }

    pub fn ctrl(&self) -> u8 {
        self.ctrl.read()
    }

    pub fn mask(&self) -> u8 {
        self.mask.read()
    }

    /// Current VRAM address (v).
    pub fn vram_address(&self) -> u16 {
        self.v
    }

    /// Temporary VRAM address (t).
    pub fn temp_address(&self) -> u16 {
        self.t
    }

    pub fn fine_x(&self) -> u8 {
        self.fine_x
    }

    /// Advance one master tick. A dot is processed on phase 0.
    pub fn tick<B: PpuBus>(&mut self, bus: &mut B) {
        if self.phase == 0 {
            self.dot(bus);
            self.registers_clocked = false;
        }
        self.phase = (self.phase + 1) % PHASES;
    }

    /// Commit staged register values. Only acts once, on [`REGISTER_PHASE`].
    pub fn clock_registers(&mut self) {
        if self.phase != REGISTER_PHASE || self.registers_clocked {
            return;
        }
        self.ctrl.clock();
        self.mask.clock();
        self.status.clock();
        self.oam_address.clock();
        self.oam_data.clock();
        self.scroll.clock();
        self.data.clock();
        self.registers_clocked = true;
    }

    fn dot<B: PpuBus>(&mut self, bus: &mut B) {
        let rendering = self.is_rendering();
        let line = self.vcount;
        let dot = self.hcount;

        if (PRE_RENDER_LINE..SCREEN_HEIGHT as i16).contains(&line) {
            if line == PRE_RENDER_LINE && dot == 1 {
                self.status
                    .clear_bits(STATUS_VBLANK | STATUS_SPRITE_ZERO | STATUS_OVERFLOW);
            }

            if rendering {
                self.background_dot(bus);
            }
            if line >= 0 {
                if rendering {
                    self.evaluate_sprites_dot();
                }
                if (1..=SCREEN_WIDTH as u16).contains(&dot) {
                    self.render_pixel(bus);
                }
            }
            if rendering {
                self.fetch_sprites_dot(bus);
            }
        }

        if line == VBLANK_LINE && dot == 1 {
            self.status.set_bits(STATUS_VBLANK);
            self.frame_ready = true;
        }

        self.advance(rendering);
    }

    fn advance(&mut self, rendering: bool) {
        self.hcount += 1;
        let skip_dot = !self.even_frame
            && rendering
            && self.hcount == DOTS_PER_LINE - 1
            && self.vcount == PRE_RENDER_LINE;

        if self.hcount == DOTS_PER_LINE || skip_dot {
            self.hcount = 0;
            self.vcount += 1;
            if self.vcount == LINE_WRAP {
                self.vcount = PRE_RENDER_LINE;
                self.even_frame = !self.even_frame;
                self.frame_count += 1;
            }
        }
    }

    fn background_table(&self) -> u16 {
        if self.ctrl.is_bit_set(CTRL_BACKGROUND_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Background fetches and scroll updates for one rendering dot.
    fn background_dot<B: PpuBus>(&mut self, bus: &mut B) {
        let dot = self.hcount;

        if (2..=257).contains(&dot) || (321..=337).contains(&dot) {
            self.background.shift();

            match (dot - 1) % 8 {
                0 => {
                    self.background.load();
                    self.background.next_tile = bus.read(0x2000 | (self.v & 0x0FFF));
                }
                2 => {
                    let addr = 0x23C0
                        | (self.v & 0x0C00)
                        | ((self.v >> 4) & 0x38)
                        | ((self.v >> 2) & 0x07);
                    let mut attribute = bus.read(addr);
                    if self.v & 0x0040 != 0 {
                        attribute >>= 4;
                    }
                    if self.v & 0x0002 != 0 {
                        attribute >>= 2;
                    }
                    self.background.next_attribute = attribute & 0x03;
                }
                4 => {
                    let addr = self.background_tile_row();
                    self.background.next_lo = bus.read(addr);
                }
                6 => {
                    let addr = self.background_tile_row() + 8;
                    self.background.next_hi = bus.read(addr);
                }
                7 => self.increment_coarse_x(),
                _ => {}
            }
        }

        if dot == 256 {
            self.increment_y();
        }
        if dot == 257 {
            self.copy_horizontal();
        }
        // Unused nametable fetches at the end of the line
        if dot == 338 || dot == 340 {
            self.background.next_tile = bus.read(0x2000 | (self.v & 0x0FFF));
        }
        if self.vcount == PRE_RENDER_LINE && (280..=304).contains(&dot) {
            self.copy_vertical();
        }
    }

    fn background_tile_row(&self) -> u16 {
        let fine_y = (self.v >> 12) & 0x07;
        self.background_table() | (self.background.next_tile as u16) << 4 | fine_y
    }

    /// Composite the pixel for the current dot and write its palette index into the frame.
    fn render_pixel<B: PpuBus>(&mut self, bus: &mut B) {
        let x = (self.hcount - 1) as usize;
        let y = self.vcount as usize;
        let mask = self.mask.read();

        let (bg_pixel, bg_palette) =
            if mask & MASK_BACKGROUND != 0 && (x >= 8 || mask & MASK_BACKGROUND_LEFT != 0) {
                self.background.pixel(self.fine_x)
            } else {
                (0, 0)
            };
        let sprite = if mask & MASK_SPRITES != 0 && (x >= 8 || mask & MASK_SPRITES_LEFT != 0) {
            self.sprites.pixel()
        } else {
            None
        };

        let (pixel, palette) = match sprite {
            None => (bg_pixel, bg_palette),
            Some(sprite) if bg_pixel == 0 => (sprite.pixel, sprite.palette),
            Some(sprite) => {
                if sprite.slot == 0 && self.sprite_zero_hit_possible() {
                    self.status.set_bits(STATUS_SPRITE_ZERO);
                }
                if sprite.behind_background {
                    (bg_pixel, bg_palette)
                } else {
                    (sprite.pixel, sprite.palette)
                }
            }
        };

        // Pixel 0 of every palette is the universal background colour
        let addr = if pixel == 0 {
            0x3F00
        } else {
            0x3F00 | (palette as u16) << 2 | pixel as u16
        };
        let mut color = bus.read(addr) & 0x3F;
        if mask & MASK_GREYSCALE != 0 {
            color &= 0x30;
        }
        self.frame[y * SCREEN_WIDTH + x] = color;

        self.sprites.shift();
    }

    fn sprite_zero_hit_possible(&self) -> bool {
        self.sprites.sprite_zero_on_line()
            && self.mask.is_bit_set(MASK_BACKGROUND)
            && self.mask.is_bit_set(MASK_SPRITES)
            && (2..257).contains(&self.hcount)
            && self.hcount != 255
    }
}
