//! 6502 processor status register (P) flag bits.
//!
//! B0 and B1 are not storage: they only exist in the byte pushed to the stack. B1 always reads
//! back as 1; B0 distinguishes BRK/PHP pushes (1) from NMI/IRQ pushes (0).

pub const FLAG_CARRY: u8 = 1 << 0;
pub const FLAG_ZERO: u8 = 1 << 1;
pub const FLAG_INTERRUPT_DISABLE: u8 = 1 << 2;
pub const FLAG_DECIMAL: u8 = 1 << 3; // 2A03 has no decimal mode; the bit is still stored
pub const FLAG_B0: u8 = 1 << 4;
pub const FLAG_B1: u8 = 1 << 5;
pub const FLAG_OVERFLOW: u8 = 1 << 6;
pub const FLAG_NEGATIVE: u8 = 1 << 7;

/// P after power-on and reset.
pub const RESET_STATUS: u8 = FLAG_INTERRUPT_DISABLE | FLAG_B1;

/// `status` with `flag` set or cleared.
#[inline]
pub fn with_flag(status: u8, flag: u8, on: bool) -> u8 {
    if on { status | flag } else { status & !flag }
}
