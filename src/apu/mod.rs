//! NES APU (Audio Processing Unit), control side only.
//!
//! - **Frame counter**: 4-step or 5-step sequence; quarter/half-frame clocks and the frame IRQ.
//! - **Length counters**: pulse ×2, triangle, noise; visible through $4015.
//! - **Status**: $4015 reads and writes, frame IRQ acknowledge.
//!
//! Waveform synthesis and mixing are not modelled; nothing here produces samples.

pub mod apu;
