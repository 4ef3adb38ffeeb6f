//! Errors raised while loading cartridges and palettes.
//!
//! Emulation itself never fails: unmapped accesses are logged and a KIL opcode latches
//! the CPU. Only loading can be rejected.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not an iNES image (missing \"NES\\x1A\" magic)")]
    BadMagic,

    #[error("image truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("unsupported mapper {0:03}")]
    UnsupportedMapper(u8),

    #[error("could not allocate {0} bytes of cartridge memory")]
    Allocation(usize),

    #[error("palette needs at least 192 bytes, found {0}")]
    PaletteTooShort(usize),
}
