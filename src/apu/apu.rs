//! NES APU frame counter, length counters and status register.
//!
//! Implements the timing half of the [APU](https://www.nesdev.org/wiki/APU): the
//! [frame counter](https://www.nesdev.org/wiki/APU_Frame_Counter) (4-step or 5-step), the
//! [length counters](https://www.nesdev.org/wiki/APU_Length_Counter) and $4015/$4017. The frame
//! IRQ flag lives in a clocked status register, so the IRQ line the CPU sees trails the
//! sequencer by one CPU cycle.

use crate::clocked_register::ClockedRegister;

/// Length counter lookup table: 5-bit index from register → count. APU_Length_Counter.
const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, 12, 16, 24, 18, 48, 20, 96, 22,
    192, 24, 72, 26, 16, 28, 32, 30,
];

/// 4-step sequence length in CPU cycles.
const FRAME_4STEP_RESET: u32 = 29830;
/// 5-step sequence length in CPU cycles; no IRQ.
const FRAME_5STEP_RESET: u32 = 37282;

pub const STATUS_FRAME_IRQ: u8 = 0x40;
pub const STATUS_DMC_IRQ: u8 = 0x80;

const FRAME_MODE_5STEP: u8 = 0x80;
const FRAME_IRQ_INHIBIT: u8 = 0x40;

const PULSE1: usize = 0;
const PULSE2: usize = 1;
const TRIANGLE: usize = 2;
const NOISE: usize = 3;

#[derive(Clone, Copy, Default)]
struct LengthCounter {
    enabled: bool,
    halt: bool,
    count: u8,
}

impl LengthCounter {
    fn load(&mut self, data: u8) {
        if self.enabled {
            self.count = LENGTH_TABLE[(data >> 3) as usize & 0x1F];
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.count = 0;
        }
    }

    fn clock(&mut self) {
        if !self.halt && self.count > 0 {
            self.count -= 1;
        }
    }
}

/// APU control state, ticked once per CPU cycle.
pub struct APU {
    channels: [LengthCounter; 4],
    status: ClockedRegister<u8>,
    frame_counter: ClockedRegister<u8>,
    frame_cycle: u32,
}

impl Default for APU {
    fn default() -> Self {
        Self::new()
    }
}

impl APU {
    pub fn new() -> Self {
        Self {
            channels: [LengthCounter::default(); 4],
            status: ClockedRegister::new(),
            frame_counter: ClockedRegister::new(),
            frame_cycle: 0,
        }
    }

    pub fn reset(&mut self) {
        self.channels = [LengthCounter::default(); 4];
        self.status.reset();
        self.frame_cycle = 0;
    }

    /// Level of the APU's IRQ output.
    pub fn irq(&self) -> bool {
        self.status.is_bit_set(STATUS_FRAME_IRQ | STATUS_DMC_IRQ)
    }

    /// Write to APU registers. Channel halt flags and length loads, $4015 enables, and
    /// $4017 frame counter mode. Writing $4017 restarts the sequence.
    pub fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x4000 => self.channels[PULSE1].halt = data & 0x20 != 0,
            0x4004 => self.channels[PULSE2].halt = data & 0x20 != 0,
            0x4008 => self.channels[TRIANGLE].halt = data & 0x80 != 0,
            0x400C => self.channels[NOISE].halt = data & 0x20 != 0,
            0x4003 => self.channels[PULSE1].load(data),
            0x4007 => self.channels[PULSE2].load(data),
            0x400B => self.channels[TRIANGLE].load(data),
            0x400F => self.channels[NOISE].load(data),
            0x4001 | 0x4002 | 0x4005 | 0x4006 | 0x400A | 0x400E | 0x4010..=0x4013 => {}
            0x4015 => {
                for (bit, channel) in self.channels.iter_mut().enumerate() {
                    channel.set_enabled(data & (1 << bit) != 0);
                }
                self.status.clear_bits(STATUS_DMC_IRQ);
            }
            0x4017 => {
                self.frame_counter.write(data & (FRAME_MODE_5STEP | FRAME_IRQ_INHIBIT));
                if data & FRAME_IRQ_INHIBIT != 0 {
                    self.status.clear_bits(STATUS_FRAME_IRQ);
                }
                self.frame_cycle = 0;
                // 5-step mode clocks a quarter and half frame right away
                if data & FRAME_MODE_5STEP != 0 {
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                }
            }
            _ => log::warn!("APU write to unknown register ${:04X}", addr),
        }
    }

    /// Read $4015: bits 0–3 = length counter > 0 for pulse1, pulse2, triangle, noise; bit 6 = frame IRQ;
    /// bit 7 = DMC IRQ. Reading acknowledges the frame IRQ.
    pub fn read_status(&mut self) -> u8 {
        let mut r = self.status.read() & (STATUS_FRAME_IRQ | STATUS_DMC_IRQ);
        for (bit, channel) in self.channels.iter().enumerate() {
            if channel.count > 0 {
                r |= 1 << bit;
            }
        }
        self.status.clear_bits(STATUS_FRAME_IRQ);
        r
    }

    /// Quarter-frame: envelopes and the triangle linear counter, none of which are modelled.
    fn clock_quarter_frame(&mut self) {}

    /// Half-frame: clock length counters.
    fn clock_half_frame(&mut self) {
        for channel in &mut self.channels {
            channel.clock();
        }
    }

    fn raise_frame_irq(&mut self) {
        if !self.frame_counter.is_bit_set(FRAME_IRQ_INHIBIT) {
            self.status.set_bits(STATUS_FRAME_IRQ);
        }
    }

    /// Advance one CPU cycle, then commit the clocked registers.
    pub fn tick(&mut self) {
        self.frame_cycle += 1;

        if self.frame_counter.is_bit_set(FRAME_MODE_5STEP) {
            match self.frame_cycle {
                7457 | 22371 => self.clock_quarter_frame(),
                14913 | 37281 => {
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                }
                _ => {}
            }
            if self.frame_cycle >= FRAME_5STEP_RESET {
                self.frame_cycle = 0;
            }
        } else {
            match self.frame_cycle {
                7457 | 22371 => self.clock_quarter_frame(),
                14913 => {
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                }
                29828 | FRAME_4STEP_RESET => self.raise_frame_irq(),
                29829 => {
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                    self.raise_frame_irq();
                }
                _ => {}
            }
            if self.frame_cycle >= FRAME_4STEP_RESET {
                self.frame_cycle = 0;
            }
        }

        self.status.clock();
        self.frame_counter.clock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(apu: &mut APU, cycles: u32) {
        for _ in 0..cycles {
            apu.tick();
        }
    }

    #[test]
    fn four_step_raises_frame_irq() {
        let mut apu = APU::new();
        run(&mut apu, 29827);
        assert!(!apu.irq());
        run(&mut apu, 1);
        assert!(apu.irq());
    }

    #[test]
    fn status_read_acknowledges_frame_irq() {
        let mut apu = APU::new();
        run(&mut apu, 29831);
        assert_eq!(apu.read_status() & STATUS_FRAME_IRQ, STATUS_FRAME_IRQ);
        apu.tick();
        assert!(!apu.irq());
        assert_eq!(apu.read_status() & STATUS_FRAME_IRQ, 0);
    }

    #[test]
    fn inhibit_blocks_and_clears_irq() {
        let mut apu = APU::new();
        run(&mut apu, 29829);
        assert!(apu.irq());
        apu.write(0x4017, FRAME_IRQ_INHIBIT);
        apu.tick();
        assert!(!apu.irq());
        run(&mut apu, 40000);
        assert!(!apu.irq());
    }

    #[test]
    fn five_step_never_raises_irq() {
        let mut apu = APU::new();
        apu.write(0x4017, FRAME_MODE_5STEP);
        run(&mut apu, 100_000);
        assert!(!apu.irq());
    }

    #[test]
    fn length_counters_report_and_count_down() {
        let mut apu = APU::new();
        apu.write(0x4015, 0x01);
        apu.write(0x4003, 0x18); // index 3 → 2
        assert_eq!(apu.read_status() & 0x0F, 0x01);

        apu.write(0x4017, 0x40);
        run(&mut apu, 14913);
        assert_eq!(apu.read_status() & 0x01, 0x01);
        run(&mut apu, 29829 - 14913);
        assert_eq!(apu.read_status() & 0x01, 0);
    }

    #[test]
    fn disabled_channel_ignores_length_load() {
        let mut apu = APU::new();
        apu.write(0x400F, 0xF8);
        assert_eq!(apu.read_status() & 0x08, 0);
    }
}
