//! Latched register primitive.
//!
//! Models a bank of flip-flops: writes land in a staged value that only becomes visible
//! after the owning component's clock edge. PPU, APU and CPU interrupt latches are built
//! on top of this so that flags observed by the CPU lag the logic that produced them by
//! the same fraction of a cycle as on the real chips.

use std::ops::{BitAnd, BitOr, Not};

/// Register with a `current` value visible to readers and a `next` value staged by writers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClockedRegister<T> {
    current: T,
    next: T,
}

impl<T: Copy + Default> ClockedRegister<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value latched at the last clock edge.
    pub fn read(&self) -> T {
        self.current
    }

    /// Stage `value`; it becomes visible on the next [`clock`](Self::clock).
    pub fn write(&mut self, value: T) {
        self.next = value;
    }

    /// The staged value, as the next-state logic sees it.
    pub fn staged(&self) -> T {
        self.next
    }

    /// Clock edge: copy the staged value into the visible one.
    pub fn clock(&mut self) {
        self.current = self.next;
    }

    pub fn reset(&mut self) {
        self.current = T::default();
        self.next = T::default();
    }

    /// Stage and commit at once. Only for power-on and reset paths.
    pub fn write_immediate(&mut self, value: T) {
        self.write(value);
        self.clock();
    }
}

impl<T> ClockedRegister<T>
where
    T: Copy + Default + PartialEq + BitAnd<Output = T> + BitOr<Output = T> + Not<Output = T>,
{
    /// Tests against the visible value.
    pub fn is_bit_set(&self, mask: T) -> bool {
        self.current & mask != T::default()
    }

    /// Sets bits in the staged value.
    pub fn set_bits(&mut self, mask: T) {
        self.next = self.next | mask;
    }

    /// Clears bits in the staged value.
    pub fn clear_bits(&mut self, mask: T) {
        self.next = self.next & !mask;
    }
}
