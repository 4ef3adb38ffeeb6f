//! NES cartridge loading and mapper support.
//!
//! - **ines**: iNES header fields.
//! - **memory**: the PRG+CHR backing blob owned by the mapper.
//! - **cartridge**: loads .nes images and holds the mapper.
//! - **mapper**: NROM (0), MMC1 (1); PRG/CHR bank switching and nametable mirroring.

pub mod cartridge;
pub mod ines;
pub mod mapper;
pub mod memory;
