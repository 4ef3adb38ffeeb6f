//! 6502 CPU emulation for the NES.
//!
//! Cycle-stepped 2A03 core with the full documented set and the stable undocumented opcodes;
//! nestest-compatible. Memory, interrupt lines and DMA stalls come from the [`Bus`](crate::bus::Bus)
//! trait.

pub mod addressing;
pub mod alu;
pub mod cpu;
pub mod flags;
mod instructions;
pub mod table;
mod trace;

#[cfg(test)]
mod tests;
