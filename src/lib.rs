//! latchnes: a cycle-accurate NES core.
//!
//! Implements the NES chipset as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/NES_reference_guide): Ricoh 2A03 CPU, 2C02 PPU, the
//! buses between them, OAM DMA, cartridge mappers and controller I/O. Every register that hardware
//! latches on a clock edge is a [`ClockedRegister`](clocked_register::ClockedRegister), and a single
//! master clock ([`nes::Nes::tick_clock`]) steps everything in a fixed order.
//!
//! ## Modules (NESdev references)
//!
//! - **apu** – [APU Frame Counter](https://www.nesdev.org/wiki/APU_Frame_Counter) and
//!   [length counters](https://www.nesdev.org/wiki/APU_Length_Counter); no synthesis
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map) and
//!   [PPU memory map](https://www.nesdev.org/wiki/PPU_memory_map); mapper first refusal
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) loading; [Mapper](https://www.nesdev.org/wiki/Mapper) NROM (0), MMC1 (1)
//! - **clocked_register** – staged/visible register pairs
//! - **controller** – [Controller reading](https://www.nesdev.org/wiki/Controller_reading): $4016 latch, shift-out
//! - **cpu** – [6502](https://www.nesdev.org/wiki/CPU) / 2A03: documented + undocumented opcodes, [NMI](https://www.nesdev.org/wiki/NMI) and IRQ
//! - **dma** – [OAM DMA](https://www.nesdev.org/wiki/DMA)
//! - **nes** – master clock driver
//! - **palette** – [Palette](https://www.nesdev.org/wiki/PPU_palettes) to RGB
//! - **ppu** – [PPU](https://www.nesdev.org/wiki/PPU), [PPU registers](https://www.nesdev.org/wiki/PPU_registers), OAM, nametables, 256×240

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod clocked_register;
pub mod controller;
pub mod cpu;
pub mod dma;
pub mod error;
pub mod logger;
pub mod nes;
pub mod palette;
pub mod ppu;

#[cfg(test)]
mod test_support;
