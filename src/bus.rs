//! Memory buses and address decoding for the NES.
//!
//! [`Bus`] is the CPU's view of the world; [`PpuBus`] is the PPU's. [`NesBus`] owns every backing
//! store (RAM, nametable VRAM, palette RAM, the pattern fallback store), the PPU, APU, controllers,
//! cartridge and OAM DMA unit, and routes both address spaces. The cartridge mapper gets first
//! refusal on every access in either space.
//!
//! See [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map) and
//! [PPU memory map](https://www.nesdev.org/wiki/PPU_memory_map).

use crate::apu::apu::APU;
use crate::cartridge::cartridge::Cartridge;
use crate::cartridge::mapper::{Mirroring, mapper::Mapper};
use crate::controller::Controller;
use crate::dma::{Dma, DmaCycle};
use crate::ppu::ppu::PPU;

/// CPU-side bus: memory access plus the interrupt and DMA lines the CPU samples.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);

    /// Read without side effects, for tracing and debugging.
    fn peek(&mut self, addr: u16) -> u8 {
        self.read(addr)
    }

    fn nmi_line(&self) -> bool {
        false
    }

    fn irq_line(&self) -> bool {
        false
    }

    /// True while a DMA transfer holds the CPU off the bus.
    fn dma_running(&self) -> bool {
        false
    }
}

/// PPU-side bus over the 14-bit PPU address space.
pub trait PpuBus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
}

pub const RAM_SIZE: usize = 0x800;
pub const NAMETABLE_SIZE: usize = 0x1000;
pub const PALETTE_SIZE: usize = 32;
pub const PATTERN_SIZE: usize = 0x2000;

/// PPU-space backing stores owned by the bus.
pub struct VideoMemory {
    /// Four 1 KiB pages; only the first two are used unless the cartridge asks for four-screen.
    pub nametables: [u8; NAMETABLE_SIZE],
    pub palette: [u8; PALETTE_SIZE],
    /// CHR RAM for boards that do not claim pattern-table accesses.
    pub pattern: [u8; PATTERN_SIZE],
}

impl Default for VideoMemory {
    fn default() -> Self {
        Self {
            nametables: [0; NAMETABLE_SIZE],
            palette: [0; PALETTE_SIZE],
            pattern: [0; PATTERN_SIZE],
        }
    }
}

/// Index into the 4 KiB nametable store for a PPU address in $2000–$3EFF.
pub fn nametable_index(addr: u16, mirroring: Mirroring) -> usize {
    let addr = addr & 0x0FFF;
    let page = mirroring.page(addr >> 10);
    (page * 0x400 + (addr & 0x03FF)) as usize
}

/// Index into palette RAM. $3F10/$3F14/$3F18/$3F1C alias the background entries below them.
pub fn palette_index(addr: u16) -> usize {
    let index = addr & 0x1F;
    if index & 0x13 == 0x10 {
        (index & 0x0F) as usize
    } else {
        index as usize
    }
}

/// PPU bus view over disjoint parts of [`NesBus`], handed to the PPU while it runs.
pub struct PpuMemory<'a> {
    video: &'a mut VideoMemory,
    mapper: &'a mut dyn Mapper,
}

impl<'a> PpuMemory<'a> {
    pub fn new(video: &'a mut VideoMemory, cart: &'a mut Cartridge) -> Self {
        Self {
            video,
            mapper: cart.mapper.as_mut(),
        }
    }
}

impl PpuBus for PpuMemory<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        if let Some(data) = self.mapper.read_from_ppu(addr) {
            return data;
        }
        match addr {
            0x0000..=0x1FFF => self.video.pattern[addr as usize],
            0x2000..=0x3EFF => self.video.nametables[nametable_index(addr, self.mapper.mirroring())],
            _ => self.video.palette[palette_index(addr)],
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        let addr = addr & 0x3FFF;
        if self.mapper.write_from_ppu(addr, data) {
            return;
        }
        match addr {
            0x0000..=0x1FFF => self.video.pattern[addr as usize] = data,
            0x2000..=0x3EFF => {
                let index = nametable_index(addr, self.mapper.mirroring());
                self.video.nametables[index] = data;
            }
            _ => self.video.palette[palette_index(addr)] = data,
        }
    }
}

/// Main NES bus: RAM, PPU, APU, cartridge, controllers, and OAM DMA.
pub struct NesBus {
    pub ram: [u8; RAM_SIZE],
    pub video: VideoMemory,
    pub cart: Cartridge,
    pub ppu: PPU,
    pub apu: APU,
    pub controllers: [Controller; 2],
    pub dma: Dma,
    nmi: bool,
    irq: bool,
    cpu_cycle: u64,
}

impl NesBus {
    /// Create a new bus with the given cartridge.
    pub fn new(cart: Cartridge) -> Self {
        Self {
            ram: [0; RAM_SIZE],
            video: VideoMemory::default(),
            cart,
            ppu: PPU::new(),
            apu: APU::new(),
            controllers: [Controller::new(), Controller::new()],
            dma: Dma::default(),
            nmi: false,
            irq: false,
            cpu_cycle: 0,
        }
    }

    /// Drive the NMI line. The CPU edge-detects it.
    pub fn set_nmi(&mut self, level: bool) {
        self.nmi = level;
    }

    /// Drive the IRQ line. The CPU level-detects it.
    pub fn set_irq(&mut self, level: bool) {
        self.irq = level;
    }

    pub fn trigger_dma(&mut self, page: u8) {
        self.dma.trigger(page);
    }

    pub fn read_from_ppu(&mut self, addr: u16) -> u8 {
        PpuMemory::new(&mut self.video, &mut self.cart).read(addr)
    }

    pub fn write_from_ppu(&mut self, addr: u16, data: u8) {
        PpuMemory::new(&mut self.video, &mut self.cart).write(addr, data);
    }

    /// One CPU cycle of bus-side work: a DMA step, then the APU.
    pub fn tick_cpu_cycle(&mut self) {
        match self.dma.step(self.cpu_cycle) {
            Some(DmaCycle::Read(addr)) => {
                let data = self.read(addr);
                self.dma.latch(data);
            }
            Some(DmaCycle::Write(data)) => self.write(0x2004, data),
            None => {}
        }

        self.apu.tick();
        self.set_irq(self.apu.irq());
        self.cpu_cycle += 1;
    }

    /// One master tick of the PPU, then its NMI output and register clock edge.
    pub fn tick_ppu(&mut self) {
        let mut memory = PpuMemory::new(&mut self.video, &mut self.cart);
        self.ppu.tick(&mut memory);
        self.set_nmi(self.ppu.nmi_output());
        self.ppu.clock_registers();
    }

    /// True when the PPU has entered vblank since the last [`clear_frame_ready`](Self::clear_frame_ready).
    pub fn frame_ready(&self) -> bool {
        self.ppu.frame_ready
    }

    /// Clear frame_ready after presenting (so the next frame can set it at vblank).
    pub fn clear_frame_ready(&mut self) {
        self.ppu.frame_ready = false;
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        if let Some(data) = self.cart.mapper.read_from_cpu(addr) {
            return data;
        }
        match addr {
            // Internal RAM (mirrored 4x in 0x0000-0x1FFF)
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            // PPU registers $2000-$3FFF (mirrored every 8 bytes)
            0x2000..=0x3FFF => {
                let mut memory = PpuMemory::new(&mut self.video, &mut self.cart);
                self.ppu.read_register(addr & 0x2007, &mut memory)
            }
            0x4015 => self.apu.read_status(),
            0x4016 => self.controllers[0].read(),
            0x4017 => self.controllers[1].read(),
            // Write-only APU registers
            0x4000..=0x4014 => 0,
            // Disabled test-mode registers
            0x4018..=0x401F => 0,
            _ => {
                log::warn!("unmapped CPU read ${:04X}", addr);
                0
            }
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        if self.cart.mapper.write_from_cpu(addr, data) {
            return;
        }
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,
            0x2000..=0x3FFF => {
                let mut memory = PpuMemory::new(&mut self.video, &mut self.cart);
                self.ppu.write_register(addr & 0x2007, data, &mut memory);
            }
            0x4014 => self.trigger_dma(data),
            // The strobe line is shared by both ports
            0x4016 => {
                for pad in &mut self.controllers {
                    pad.write(data);
                }
            }
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write(addr, data),
            0x4018..=0x401F => {}
            _ => log::warn!("unmapped CPU write ${:04X} <- ${:02X}", addr, data),
        }
    }

    fn peek(&mut self, addr: u16) -> u8 {
        if let Some(data) = self.cart.mapper.read_from_cpu(addr) {
            return data;
        }
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            _ => 0,
        }
    }

    fn nmi_line(&self) -> bool {
        self.nmi
    }

    fn irq_line(&self) -> bool {
        self.irq
    }

    fn dma_running(&self) -> bool {
        self.dma.is_running()
    }
}
