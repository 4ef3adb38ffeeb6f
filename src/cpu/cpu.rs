//! Cycle-stepped 2A03 CPU core.
//!
//! The CPU divides the master clock by 12. [`CPU::tick`] is called once per master tick and acts
//! on two of the twelve phases: phase 0 runs one CPU cycle (dispatch, interrupt lookahead, cycle
//! accounting) and phase 6 samples the NMI and IRQ lines. Instructions execute in full on their
//! first cycle; the remaining cycles are spent counting down so that interrupts and DMA land on
//! the same cycle boundaries as on hardware.
//!
//! See [CPU interrupts](https://www.nesdev.org/wiki/CPU_interrupts) for the polling rules.

use crate::bus::Bus;
use crate::clocked_register::ClockedRegister;
use crate::cpu::addressing::AddressingMode;
use crate::cpu::flags::{FLAG_B0, FLAG_B1, FLAG_INTERRUPT_DISABLE, RESET_STATUS};
use crate::cpu::table::Opcode;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Master ticks per CPU cycle.
pub const CLOCK_DIVIDER: u8 = 12;
const DISPATCH_PHASE: u8 = 0;
/// Falling edge of φ2, where the interrupt lines are polled.
const SAMPLE_PHASE: u8 = 6;

/// Log target of the per-instruction trace.
pub const TRACE_TARGET: &str = "latchnes::cpu";

const INTERRUPT_CYCLES: u8 = 7;
const RESET_CYCLES: u8 = 7;

pub struct CPU<B: Bus> {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
    pub bus: B,

    /// CPU cycles since reset.
    pub cycles: u64,
    pub instruction_count: u64,
    /// Set by a jamming opcode. Nothing short of reset brings the CPU back.
    pub killed: bool,

    pub(crate) cycles_left: u8,
    clock_phase: u8,
    pub(crate) opcode: u8,
    pub(crate) instruction_pc: u16,
    pub(crate) address: u16,
    pub(crate) mode: AddressingMode,

    nmi_line_previous: bool,
    nmi_pending: ClockedRegister<bool>,
    irq_pending: ClockedRegister<bool>,
    next_is_nmi: bool,
    next_is_irq: bool,
}

impl<B: Bus> CPU<B> {
    /// CPU wired to `bus`. Registers are cleared; call [`reset`](Self::reset) before ticking.
    pub fn new(bus: B) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0,
            pc: 0,
            status: 0,
            bus,
            cycles: 0,
            instruction_count: 0,
            killed: false,
            cycles_left: 0,
            clock_phase: 0,
            opcode: 0,
            instruction_pc: 0,
            address: 0,
            mode: AddressingMode::Implied,
            nmi_line_previous: false,
            nmi_pending: ClockedRegister::new(),
            irq_pending: ClockedRegister::new(),
            next_is_nmi: false,
            next_is_irq: false,
        }
    }

    /// Load PC from the reset vector and start the 7-cycle reset sequence.
    /// The first opcode fetch happens on cycle 7.
    pub fn reset(&mut self) {
        self.pc = self.read_word(RESET_VECTOR);
        self.sp = 0xFD;
        self.status = RESET_STATUS;
        self.a = 0;
        self.x = 0;
        self.y = 0;

        self.cycles = 0;
        self.instruction_count = 0;
        self.killed = false;
        self.cycles_left = RESET_CYCLES;
        self.clock_phase = 0;

        self.nmi_line_previous = false;
        self.nmi_pending.reset();
        self.irq_pending.reset();
        self.next_is_nmi = false;
        self.next_is_irq = false;
    }

    /// Cycles still owed by the instruction or interrupt sequence in flight.
    pub fn cycles_left(&self) -> u8 {
        self.cycles_left
    }

    /// Position within the 12-tick CPU cycle; 0 means the next tick starts a cycle.
    pub fn clock_phase(&self) -> u8 {
        self.clock_phase
    }

    /// Advance one master tick.
    pub fn tick(&mut self) {
        if self.killed {
            return;
        }

        match self.clock_phase {
            DISPATCH_PHASE => self.clock_cycle(),
            SAMPLE_PHASE => self.sample_interrupt_lines(),
            _ => {}
        }
        self.clock_phase = (self.clock_phase + 1) % CLOCK_DIVIDER;
    }

    /// Tick until the next instruction has been dispatched and all its cycles spent.
    pub fn step(&mut self) {
        let count = self.instruction_count;
        while !self.killed
            && !(self.instruction_count != count
                && self.cycles_left == 0
                && self.clock_phase == DISPATCH_PHASE)
        {
            self.tick();
        }
    }

    /// NMI is edge-triggered, IRQ level-triggered and masked by I. Both are latched and only
    /// become visible to the dispatcher at the start of the next cycle.
    fn sample_interrupt_lines(&mut self) {
        let nmi = self.bus.nmi_line();
        if nmi && !self.nmi_line_previous {
            self.nmi_pending.write(true);
        }
        self.nmi_line_previous = nmi;

        let irq = self.bus.irq_line() && self.status & FLAG_INTERRUPT_DISABLE == 0;
        self.irq_pending.write(irq);
    }

    fn clock_cycle(&mut self) {
        // Lines sampled during the previous cycle become visible here
        self.nmi_pending.clock();
        self.irq_pending.clock();

        // The DMA unit owns the bus; the CPU is halted mid-instruction
        if self.bus.dma_running() {
            self.cycles += 1;
            return;
        }

        if self.cycles_left == 0 {
            if self.next_is_nmi {
                self.next_is_nmi = false;
                self.nmi_pending.write(false);
                self.interrupt(NMI_VECTOR);
            } else if self.next_is_irq {
                self.next_is_irq = false;
                self.interrupt(IRQ_VECTOR);
            } else {
                self.dispatch();
            }
        }

        // Last cycle of the current instruction: decide what the next dispatch will be
        if self.cycles_left == 1 {
            self.next_is_nmi = self.nmi_pending.read();
            self.next_is_irq = self.irq_pending.read();
        }

        self.cycles_left = self.cycles_left.saturating_sub(1);
        self.cycles += 1;
    }

    fn dispatch(&mut self) {
        if log::log_enabled!(target: TRACE_TARGET, log::Level::Trace) {
            let line = self.trace_line();
            log::trace!(target: TRACE_TARGET, "{}", line);
        }

        self.instruction_pc = self.pc;
        self.opcode = self.bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);

        let decoded = Opcode::decode(self.opcode);
        self.mode = decoded.mode;
        self.cycles_left = decoded.cycles;

        let crossed = self.resolve(decoded.mode);
        let penalty = self.execute(decoded.operation);
        if crossed && penalty {
            self.cycles_left += 1;
        }
        self.instruction_count += 1;
    }

    /// NMI/IRQ sequence: push PC and P (B0 clear), set I, jump through `vector`.
    fn interrupt(&mut self, vector: u16) {
        self.push_word(self.pc);
        self.push((self.status | FLAG_B1) & !FLAG_B0);
        self.status |= FLAG_INTERRUPT_DISABLE;
        self.pc = self.read_word(vector);
        self.cycles_left = INTERRUPT_CYCLES;
    }

    pub(crate) fn kill(&mut self) {
        log::warn!(
            "CPU jammed by opcode ${:02X} at ${:04X}",
            self.opcode,
            self.instruction_pc
        );
        self.killed = true;
    }

    pub(crate) fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.bus.read(addr) as u16;
        let hi = self.bus.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    pub(crate) fn push(&mut self, value: u8) {
        self.bus.write(0x0100 | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub(crate) fn pop(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.bus.read(0x0100 | self.sp as u16)
    }

    pub(crate) fn push_word(&mut self, value: u16) {
        self.push((value >> 8) as u8);
        self.push(value as u8);
    }

    pub(crate) fn pop_word(&mut self) -> u16 {
        let lo = self.pop() as u16;
        let hi = self.pop() as u16;
        (hi << 8) | lo
    }
}
