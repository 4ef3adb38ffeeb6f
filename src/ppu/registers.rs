//! CPU-facing PPU registers and the v/t scroll arithmetic.
//!
//! See [PPU registers](https://www.nesdev.org/wiki/PPU_registers) and
//! [PPU scrolling](https://www.nesdev.org/wiki/PPU_scrolling). $2005 and $2006 share one write
//! toggle; reading $2002 resets it.

use crate::bus::PpuBus;
use crate::ppu::ppu::{CTRL_INCREMENT_32, CTRL_NAMETABLE, PPU, STATUS_VBLANK};

impl PPU {
    /// Read a PPU register. `addr` is the CPU address; only the low three bits select the register.
    pub fn read_register<B: PpuBus>(&mut self, addr: u16, bus: &mut B) -> u8 {
        let value = match addr & 0x0007 {
            // PPUSTATUS: low five bits are stale bus contents
            2 => {
                let value = (self.status.read() & 0xE0) | (self.latched_data & 0x1F);
                self.status.clear_bits(STATUS_VBLANK);
                self.address_latch = false;
                value
            }
            4 => {
                let value = self.oam_byte(self.oam_address.read());
                self.oam_data.write(value);
                value
            }
            7 => self.read_data(bus),
            _ => self.latched_data,
        };
        self.latched_data = value;
        value
    }

    /// Write a PPU register. Every write refreshes the latched data lines.
    pub fn write_register<B: PpuBus>(&mut self, addr: u16, data: u8, bus: &mut B) {
        self.latched_data = data;

        match addr & 0x0007 {
            0 => {
                self.ctrl.write(data);
                self.t = (self.t & !0x0C00) | ((data & CTRL_NAMETABLE) as u16) << 10;
            }
            1 => self.mask.write(data),
            2 => {}
            3 => self.oam_address.write(data),
            4 => {
                let address = self.oam_address.read();
                self.set_oam_byte(address, data);
                self.oam_data.write(data);
                self.oam_address.write(address.wrapping_add(1));
            }
            5 => {
                self.scroll.write(data);
                if !self.address_latch {
                    self.fine_x = data & 0x07;
                    self.t = (self.t & !0x001F) | (data >> 3) as u16;
                } else {
                    self.t = (self.t & !0x73E0)
                        | ((data & 0x07) as u16) << 12
                        | ((data >> 3) as u16) << 5;
                }
                self.address_latch = !self.address_latch;
            }
            6 => {
                if !self.address_latch {
                    self.t = (self.t & 0x00FF) | ((data & 0x3F) as u16) << 8;
                } else {
                    self.t = (self.t & 0xFF00) | data as u16;
                    self.v = self.t;
                }
                self.address_latch = !self.address_latch;
            }
            _ => {
                self.data.write(data);
                bus.write(self.v & 0x3FFF, data);
                self.increment_vram_address();
            }
        }
    }

    /// PPUDATA read. Palette reads bypass the buffer, which is refilled from the nametable beneath.
    fn read_data<B: PpuBus>(&mut self, bus: &mut B) -> u8 {
        let addr = self.v & 0x3FFF;
        let value = if addr >= 0x3F00 {
            self.data_buffer = bus.read(addr - 0x1000);
            bus.read(addr)
        } else {
            let buffered = self.data_buffer;
            self.data_buffer = bus.read(addr);
            buffered
        };
        self.data.write(value);
        self.increment_vram_address();
        value
    }

    fn increment_vram_address(&mut self) {
        let step = if self.ctrl.is_bit_set(CTRL_INCREMENT_32) { 32 } else { 1 };
        self.v = (self.v + step) & 0x7FFF;
    }

    /// Byte `address` of primary OAM (64 entries × Y, tile, attributes, X).
    pub fn oam_byte(&self, address: u8) -> u8 {
        self.oam[(address >> 2) as usize].byte(address & 3)
    }

    pub fn set_oam_byte(&mut self, address: u8, data: u8) {
        self.oam[(address >> 2) as usize].set_byte(address & 3, data);
    }

    /// Coarse X step; wraps at 31 into the horizontally adjacent nametable.
    pub(crate) fn increment_coarse_x(&mut self) {
        if self.v & 0x001F == 31 {
            self.v &= !0x001F;
            self.v ^= 0x0400;
        } else {
            self.v += 1;
        }
    }

    /// Fine Y step with carry into coarse Y. Row 29 wraps into the vertically adjacent
    /// nametable; rows 30–31 (attribute memory) wrap without switching.
    pub(crate) fn increment_y(&mut self) {
        if self.v & 0x7000 != 0x7000 {
            self.v += 0x1000;
            return;
        }

        self.v &= !0x7000;
        let mut coarse_y = (self.v & 0x03E0) >> 5;
        if coarse_y == 29 {
            coarse_y = 0;
            self.v ^= 0x0800;
        } else if coarse_y == 31 {
            coarse_y = 0;
        } else {
            coarse_y += 1;
        }
        self.v = (self.v & !0x03E0) | (coarse_y << 5);
    }

    /// Dot 257: coarse X and the horizontal nametable bit from t.
    pub(crate) fn copy_horizontal(&mut self) {
        self.v = (self.v & !0x041F) | (self.t & 0x041F);
    }

    /// Pre-render dots 280–304: fine Y, coarse Y and the vertical nametable bit from t.
    pub(crate) fn copy_vertical(&mut self) {
        self.v = (self.v & !0x7BE0) | (self.t & 0x7BE0);
    }
}
