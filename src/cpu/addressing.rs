//! Addressing modes and effective-address resolution.
//!
//! See [CPU addressing modes](https://www.nesdev.org/wiki/CPU_addressing_modes). Resolution reads
//! the operand bytes, advances PC past them and leaves the effective address in `CPU::address`.

use crate::bus::Bus;
use crate::cpu::cpu::CPU;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressingMode {
    /// No operand, or the accumulator for shifts and rotates.
    Implied,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    /// Signed 8-bit branch offset from the next instruction.
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// JMP only.
    Indirect,
    /// ($zp,X)
    IndirectX,
    /// ($zp),Y
    IndirectY,
}

impl AddressingMode {
    /// Operand bytes following the opcode.
    pub fn operand_len(self) -> u16 {
        match self {
            AddressingMode::Implied => 0,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => 2,
            _ => 1,
        }
    }
}

fn crosses_page(base: u16, addr: u16) -> bool {
    base & 0xFF00 != addr & 0xFF00
}

impl<B: Bus> CPU<B> {
    fn next_byte(&mut self) -> u8 {
        let byte = self.bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    fn next_word(&mut self) -> u16 {
        let lo = self.next_byte() as u16;
        let hi = self.next_byte() as u16;
        (hi << 8) | lo
    }

    /// Pointer read from the zero page; the high byte wraps to $00 rather than $0100.
    fn zero_page_pointer(&mut self, zp: u8) -> u16 {
        let lo = self.bus.read(zp as u16) as u16;
        let hi = self.bus.read(zp.wrapping_add(1) as u16) as u16;
        (hi << 8) | lo
    }

    /// Resolve `mode` into `self.address`. Returns true when indexing crossed a page.
    pub(crate) fn resolve(&mut self, mode: AddressingMode) -> bool {
        match mode {
            AddressingMode::Implied => {
                self.address = 0;
                false
            }
            AddressingMode::Immediate => {
                self.address = self.pc;
                self.pc = self.pc.wrapping_add(1);
                false
            }
            AddressingMode::ZeroPage => {
                self.address = self.next_byte() as u16;
                false
            }
            AddressingMode::ZeroPageX => {
                self.address = self.next_byte().wrapping_add(self.x) as u16;
                false
            }
            AddressingMode::ZeroPageY => {
                self.address = self.next_byte().wrapping_add(self.y) as u16;
                false
            }
            AddressingMode::Relative => {
                let offset = self.next_byte() as i8;
                self.address = self.pc.wrapping_add(offset as u16);
                false
            }
            AddressingMode::Absolute => {
                self.address = self.next_word();
                false
            }
            AddressingMode::AbsoluteX => {
                let base = self.next_word();
                self.address = base.wrapping_add(self.x as u16);
                crosses_page(base, self.address)
            }
            AddressingMode::AbsoluteY => {
                let base = self.next_word();
                self.address = base.wrapping_add(self.y as u16);
                crosses_page(base, self.address)
            }
            AddressingMode::Indirect => {
                // The high byte comes from the same page: JMP ($12FF) reads $12FF and $1200
                let pointer = self.next_word();
                let lo = self.bus.read(pointer) as u16;
                let hi = self.bus.read((pointer & 0xFF00) | (pointer.wrapping_add(1) & 0x00FF)) as u16;
                self.address = (hi << 8) | lo;
                false
            }
            AddressingMode::IndirectX => {
                let zp = self.next_byte().wrapping_add(self.x);
                self.address = self.zero_page_pointer(zp);
                false
            }
            AddressingMode::IndirectY => {
                let zp = self.next_byte();
                let base = self.zero_page_pointer(zp);
                self.address = base.wrapping_add(self.y as u16);
                crosses_page(base, self.address)
            }
        }
    }
}
