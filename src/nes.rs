//! Master-clock driver tying the CPU, bus, PPU, APU and DMA together.
//!
//! One call to [`Nes::tick_clock`] is one master tick. The CPU acts every 12 ticks and the PPU
//! every 4, so a CPU cycle spans three dots. Within a tick the order is fixed: CPU, then (on CPU
//! cycle edges) DMA and APU, then the PPU dot, then the PPU register clock edge.

use crate::bus::{Bus, NesBus};
use crate::cartridge::cartridge::Cartridge;
use crate::cpu::cpu::{CLOCK_DIVIDER, CPU};

/// Result block written by blargg-style test ROMs at $6000.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestStatus {
    /// $80 while running, $81 when the ROM asks for a reset, otherwise the result code.
    pub code: u8,
    pub message: String,
}

impl TestStatus {
    pub const RUNNING: u8 = 0x80;
    pub const NEEDS_RESET: u8 = 0x81;

    pub fn is_finished(&self) -> bool {
        self.code < Self::RUNNING
    }
}

const TEST_STATUS_ADDR: u16 = 0x6000;
const TEST_SIGNATURE: [u8; 3] = [0xDE, 0xB0, 0x61];
const TEST_TEXT_ADDR: u16 = 0x6004;

pub struct Nes {
    pub cpu: CPU<NesBus>,
    master_clock: u64,
}

impl Nes {
    /// Power on with `cart` inserted and run the reset sequence.
    pub fn new(cart: Cartridge) -> Self {
        let mut nes = Self {
            cpu: CPU::new(NesBus::new(cart)),
            master_clock: 0,
        };
        nes.cpu.reset();
        nes
    }

    /// Reset button: CPU reset sequence and PPU register reset. RAM and VRAM survive.
    pub fn reset(&mut self) {
        self.cpu.bus.ppu.reset();
        self.cpu.bus.apu.reset();
        self.cpu.reset();
        self.master_clock = 0;
    }

    pub fn master_clock(&self) -> u64 {
        self.master_clock
    }

    pub fn bus(&self) -> &NesBus {
        &self.cpu.bus
    }

    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.cpu.bus
    }

    /// The last completed frame as 256×240 palette indices.
    pub fn frame(&self) -> &[u8] {
        &self.cpu.bus.ppu.frame
    }

    /// One master tick.
    pub fn tick_clock(&mut self) {
        self.cpu.tick();
        if self.master_clock % CLOCK_DIVIDER as u64 == 0 {
            self.cpu.bus.tick_cpu_cycle();
        }
        self.cpu.bus.tick_ppu();
        self.master_clock += 1;
    }

    /// Tick until the CPU has nothing in flight and the next tick starts a CPU cycle.
    pub fn tick_until_cpu_complete(&mut self) {
        while !self.cpu.killed && (self.cpu.cycles_left() != 0 || self.cpu.clock_phase() != 0) {
            self.tick_clock();
        }
    }

    /// Run the next instruction to completion, including any interrupt sequence that precedes it.
    pub fn step_instruction(&mut self) {
        let count = self.cpu.instruction_count;
        while !self.cpu.killed && self.cpu.instruction_count == count {
            self.tick_clock();
        }
        self.tick_until_cpu_complete();
    }

    /// Run until the PPU enters vblank, then acknowledge the frame.
    pub fn run_frame(&mut self) {
        while !self.cpu.bus.frame_ready() {
            self.tick_clock();
        }
        self.cpu.bus.clear_frame_ready();
    }

    /// Status block at $6000, if the cartridge carries the test signature.
    pub fn test_status(&mut self) -> Option<TestStatus> {
        let bus = &mut self.cpu.bus;
        let signature = [bus.peek(0x6001), bus.peek(0x6002), bus.peek(0x6003)];
        if signature != TEST_SIGNATURE {
            return None;
        }

        let code = bus.peek(TEST_STATUS_ADDR);
        let text: Vec<u8> = (TEST_TEXT_ADDR..=0x7FFF)
            .map(|addr| bus.peek(addr))
            .take_while(|&byte| byte != 0)
            .collect();

        Some(TestStatus {
            code,
            message: String::from_utf8_lossy(&text).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::mapper::Mirroring;
    use crate::test_support::nrom;

    /// NROM whose reset vector points at `program` placed at $8000.
    fn nes_with(program: &[u8]) -> Nes {
        Nes::new(nrom(program, &[], Mirroring::Horizontal))
    }

    #[test]
    fn first_instruction_dispatches_after_reset_sequence() {
        let mut nes = nes_with(&[0xA9, 0x42]);
        nes.tick_until_cpu_complete();
        assert_eq!(nes.cpu.cycles, 7);
        assert_eq!(nes.master_clock(), 7 * 12);

        nes.step_instruction();
        assert_eq!(nes.cpu.a, 0x42);
        assert_eq!(nes.cpu.cycles, 9);
    }

    #[test]
    fn three_dots_per_cpu_cycle() {
        let mut nes = nes_with(&[0x4C, 0x00, 0x80]);
        for _ in 0..12 * 100 {
            nes.tick_clock();
        }
        let ppu = &nes.bus().ppu;
        let dots = (ppu.vcount + 1) as u64 * 341 + ppu.hcount as u64;
        assert_eq!(dots, 300);
        assert_eq!(nes.cpu.cycles, 100);
    }

    #[test]
    fn frames_complete_and_nmi_fires() {
        // LDA #$80; STA $2000; loop: JMP loop. NMI handler: INX; RTI
        let mut program = vec![0xA9, 0x80, 0x8D, 0x00, 0x20, 0x4C, 0x05, 0x80];
        program.resize(0x100, 0xEA);
        program[0x80..0x82].copy_from_slice(&[0xE8, 0x40]);
        let mut nes = Nes::new(crate::test_support::nrom_with_vectors(
            &program,
            &[],
            Mirroring::Horizontal,
            0x8080,
        ));

        nes.run_frame();
        nes.run_frame();
        nes.run_frame();
        assert!(nes.cpu.x >= 2, "x = {}", nes.cpu.x);
    }

    #[test]
    fn oam_dma_stalls_the_cpu() {
        // LDA #$02; STA $4014; INX
        let mut nes = nes_with(&[0xA9, 0x02, 0x8D, 0x14, 0x40, 0xE8]);
        for i in 0..=255u8 {
            nes.bus_mut().ram[0x0200 + i as usize] = i;
        }
        nes.step_instruction();
        let before = nes.cpu.cycles;
        nes.step_instruction();
        nes.step_instruction();
        assert_eq!(nes.cpu.x, 1);
        let spent = nes.cpu.cycles - before;
        assert!((4 + 2 + 512..=4 + 2 + 514).contains(&spent), "took {}", spent);
        assert_eq!(nes.bus().ppu.oam_byte(0x7F), 0x7F);
    }

    #[test]
    fn reads_blargg_status_block() {
        let mut nes = nes_with(&[0xEA]);
        assert_eq!(nes.test_status(), None);

        for (offset, byte) in [0x00, 0xDE, 0xB0, 0x61, b'o', b'k', 0].into_iter().enumerate() {
            nes.bus_mut().write(0x6000 + offset as u16, byte);
        }
        let status = nes.test_status();
        assert_eq!(
            status,
            Some(TestStatus {
                code: 0,
                message: "ok".to_string()
            })
        );
        assert!(status.is_some_and(|s| s.is_finished()));
    }
}
