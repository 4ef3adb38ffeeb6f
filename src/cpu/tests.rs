use crate::{
    bus::Bus,
    cpu::{
        cpu::{CLOCK_DIVIDER, CPU},
        flags::{
            FLAG_B0, FLAG_B1, FLAG_CARRY, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE, FLAG_OVERFLOW,
            FLAG_ZERO,
        },
    },
};

struct TestBus {
    mem: Vec<u8>,
    nmi: bool,
    irq: bool,
    dma: bool,
}

impl TestBus {
    fn new() -> Self {
        let mut mem = vec![0; 0x10000];
        // Reset vector -> $8000, NMI -> $9000, IRQ/BRK -> $A000
        mem[0xFFFC] = 0x00;
        mem[0xFFFD] = 0x80;
        mem[0xFFFA] = 0x00;
        mem[0xFFFB] = 0x90;
        mem[0xFFFE] = 0x00;
        mem[0xFFFF] = 0xA0;
        Self {
            mem,
            nmi: false,
            irq: false,
            dma: false,
        }
    }

    fn load(&mut self, addr: u16, program: &[u8]) {
        let start = addr as usize;
        self.mem[start..start + program.len()].copy_from_slice(program);
    }
}

impl Bus for TestBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.mem[addr as usize] = data;
    }

    fn nmi_line(&self) -> bool {
        self.nmi
    }

    fn irq_line(&self) -> bool {
        self.irq
    }

    fn dma_running(&self) -> bool {
        self.dma
    }
}

fn cpu_with(program: &[u8]) -> CPU<TestBus> {
    let mut bus = TestBus::new();
    bus.load(0x8000, program);
    let mut cpu = CPU::new(bus);
    cpu.reset();
    cpu
}

fn run_cycles(cpu: &mut CPU<TestBus>, cycles: u64) {
    for _ in 0..cycles * CLOCK_DIVIDER as u64 {
        cpu.tick();
    }
}

/// CPU cycles spent by the next instruction.
fn measure(cpu: &mut CPU<TestBus>) -> u64 {
    let start = cpu.cycles;
    cpu.step();
    cpu.cycles - start
}

#[test]
fn reset_loads_vector_and_takes_seven_cycles() {
    let mut cpu = cpu_with(&[0xEA]);
    assert_eq!(cpu.pc, 0x8000);
    assert_eq!(cpu.sp, 0xFD);
    assert_eq!(cpu.status, 0x24);

    run_cycles(&mut cpu, 7);
    assert_eq!(cpu.cycles, 7);
    assert_eq!(cpu.instruction_count, 0);
    assert_eq!(cpu.pc, 0x8000);

    cpu.tick();
    assert_eq!(cpu.instruction_count, 1);
    assert_eq!(cpu.pc, 0x8001);
}

#[test]
fn lda_immediate_loads_value() {
    let mut cpu = cpu_with(&[0xA9, 0x42]); // LDA #$42
    cpu.step();
    assert_eq!(cpu.a, 0x42);
}

#[test]
fn lda_sets_zero_flag() {
    let mut cpu = cpu_with(&[0xA9, 0x00]); // LDA #$00
    cpu.step();
    assert!(cpu.status & FLAG_ZERO != 0);
}

#[test]
fn lda_sets_negative_flag() {
    let mut cpu = cpu_with(&[0xA9, 0x80]); // LDA #$80
    cpu.step();
    assert!(cpu.status & FLAG_NEGATIVE != 0);
}

#[test]
fn tax_transfers_a_to_x() {
    let mut cpu = cpu_with(&[0xA9, 0x10, 0xAA]); // LDA #$10; TAX
    cpu.step();
    cpu.step();
    assert_eq!(cpu.x, 0x10);
}

#[test]
fn sta_writes_to_memory() {
    let mut cpu = cpu_with(&[0xA9, 0x33, 0x8D, 0x00, 0x02]); // LDA #$33; STA $0200
    cpu.step();
    cpu.step();
    assert_eq!(cpu.bus.mem[0x0200], 0x33);
}

#[test]
fn jmp_changes_program_counter() {
    let mut cpu = cpu_with(&[0x4C, 0x00, 0x90]); // JMP $9000
    cpu.bus.load(0x9000, &[0xA9, 0x55]); // LDA #$55
    cpu.step();
    cpu.step();
    assert_eq!(cpu.a, 0x55);
}

#[test]
fn jmp_indirect_stays_on_the_pointer_page() {
    let mut cpu = cpu_with(&[0x6C, 0xFF, 0x12]); // JMP ($12FF)
    cpu.bus.mem[0x12FF] = 0x34;
    cpu.bus.mem[0x1300] = 0x56;
    cpu.bus.mem[0x1200] = 0x78;
    cpu.step();
    assert_eq!(cpu.pc, 0x7834);
}

#[test]
fn indexed_indirect_wraps_in_zero_page() {
    // LDX #$01; LDA ($FE,X) -> pointer at $FF/$00
    let mut cpu = cpu_with(&[0xA2, 0x01, 0xA1, 0xFE]);
    cpu.bus.mem[0x00FF] = 0x00;
    cpu.bus.mem[0x0000] = 0x03;
    cpu.bus.mem[0x0100] = 0x04;
    cpu.bus.mem[0x0300] = 0x99;
    cpu.step();
    cpu.step();
    assert_eq!(cpu.a, 0x99);
}

#[test]
fn inx_increments_x() {
    let mut cpu = cpu_with(&[0xA2, 0x01, 0xE8]); // LDX #$01; INX
    cpu.step();
    cpu.step();
    assert_eq!(cpu.x, 0x02);
}

#[test]
fn dex_sets_zero_flag() {
    let mut cpu = cpu_with(&[0xA2, 0x01, 0xCA]); // LDX #$01; DEX
    cpu.step();
    cpu.step();
    assert!(cpu.status & FLAG_ZERO != 0);
}

#[test]
fn bne_loops_until_zero() {
    // LDX #3; loop: DEX; BNE loop
    let mut cpu = cpu_with(&[0xA2, 0x03, 0xCA, 0xD0, 0xFD]);
    for _ in 0..7 {
        cpu.step();
    }
    assert_eq!(cpu.x, 0x00);
    assert_eq!(cpu.pc, 0x8005);
}

#[test]
fn jsr_and_rts_work() {
    let mut cpu = cpu_with(&[0x20, 0x00, 0x90, 0xA9, 0x11]); // JSR $9000; LDA #$11
    cpu.bus.load(0x9000, &[0xA9, 0x22, 0x60]); // LDA #$22; RTS

    cpu.step();
    assert_eq!(cpu.bus.mem[0x01FD], 0x80);
    assert_eq!(cpu.bus.mem[0x01FC], 0x02);
    cpu.step();
    cpu.step();
    assert_eq!(cpu.pc, 0x8003);
    cpu.step();
    assert_eq!(cpu.a, 0x11);
}

#[test]
fn brk_pushes_pc_plus_two_and_b0() {
    let mut cpu = cpu_with(&[0x00]); // BRK
    cpu.step();
    assert_eq!(cpu.pc, 0xA000);
    assert_eq!(cpu.bus.mem[0x01FD], 0x80);
    assert_eq!(cpu.bus.mem[0x01FC], 0x02);
    assert_eq!(cpu.bus.mem[0x01FB], 0x24 | FLAG_B0 | FLAG_B1);
    assert!(cpu.status & FLAG_INTERRUPT_DISABLE != 0);
}

#[test]
fn plp_ignores_b0_and_keeps_b1() {
    // LDA #$FF; PHA; PLP
    let mut cpu = cpu_with(&[0xA9, 0xFF, 0x48, 0x28]);
    cpu.step();
    cpu.step();
    cpu.step();
    assert_eq!(cpu.status, 0xFF & !FLAG_B0);
}

#[test]
fn adc_sets_carry_and_overflow() {
    // CLC; LDA #$50; ADC #$50
    let mut cpu = cpu_with(&[0x18, 0xA9, 0x50, 0x69, 0x50]);
    cpu.step();
    cpu.step();
    cpu.step();
    assert_eq!(cpu.a, 0xA0);
    assert!(cpu.status & FLAG_OVERFLOW != 0);
    assert!(cpu.status & FLAG_CARRY == 0);
}

#[test]
fn sbc_matches_adc_of_complement() {
    // SEC; LDA #$10; SBC #$20
    let mut cpu = cpu_with(&[0x38, 0xA9, 0x10, 0xE9, 0x20]);
    cpu.step();
    cpu.step();
    cpu.step();
    assert_eq!(cpu.a, 0xF0);
    assert!(cpu.status & FLAG_CARRY == 0);
    assert!(cpu.status & FLAG_NEGATIVE != 0);
}

#[test]
fn dcp_decrements_then_compares() {
    // LDA #$05; DCP $10
    let mut cpu = cpu_with(&[0xA9, 0x05, 0xC7, 0x10]);
    cpu.bus.mem[0x0010] = 0x06;
    cpu.step();
    cpu.step();
    assert_eq!(cpu.bus.mem[0x0010], 0x05);
    assert!(cpu.status & FLAG_ZERO != 0);
    assert!(cpu.status & FLAG_CARRY != 0);
}

#[test]
fn isc_increments_then_subtracts() {
    // SEC; LDA #$10; ISC $10
    let mut cpu = cpu_with(&[0x38, 0xA9, 0x10, 0xE7, 0x10]);
    cpu.bus.mem[0x0010] = 0x01;
    cpu.step();
    cpu.step();
    cpu.step();
    assert_eq!(cpu.bus.mem[0x0010], 0x02);
    assert_eq!(cpu.a, 0x0E);
}

#[test]
fn alr_ands_then_shifts() {
    // LDA #$FF; ALR #$03
    let mut cpu = cpu_with(&[0xA9, 0xFF, 0x4B, 0x03]);
    cpu.step();
    cpu.step();
    assert_eq!(cpu.a, 0x01);
    assert!(cpu.status & FLAG_CARRY != 0);
}

#[test]
fn arr_sets_carry_and_overflow_from_bits_6_and_5() {
    // SEC; LDA #$FF; ARR #$C0 -> $E0, C = bit 6, V = bit 6 ^ bit 5
    let mut cpu = cpu_with(&[0x38, 0xA9, 0xFF, 0x6B, 0xC0]);
    cpu.step();
    cpu.step();
    cpu.step();
    assert_eq!(cpu.a, 0xE0);
    assert!(cpu.status & FLAG_CARRY != 0);
    assert!(cpu.status & FLAG_OVERFLOW == 0);
    assert!(cpu.status & FLAG_NEGATIVE != 0);
}

#[test]
fn axs_subtracts_from_a_and_x() {
    // LDA #$0F; LDX #$F3; AXS #$02
    let mut cpu = cpu_with(&[0xA9, 0x0F, 0xA2, 0xF3, 0xCB, 0x02]);
    cpu.step();
    cpu.step();
    cpu.step();
    assert_eq!(cpu.x, 0x01);
    assert!(cpu.status & FLAG_CARRY != 0);
}

#[test]
fn kil_halts_the_cpu() {
    let mut cpu = cpu_with(&[0x02, 0xA9, 0x42]);
    cpu.step();
    assert!(cpu.killed);

    let pc = cpu.pc;
    let cycles = cpu.cycles;
    run_cycles(&mut cpu, 20);
    assert_eq!(cpu.pc, pc);
    assert_eq!(cpu.cycles, cycles);
    assert_eq!(cpu.a, 0);
}

#[test]
fn unstable_stores_jam() {
    for opcode in [0x93, 0x9B, 0x9C, 0x9E, 0x9F, 0x8B] {
        let mut cpu = cpu_with(&[opcode, 0x00, 0x02]);
        cpu.step();
        assert!(cpu.killed, "opcode ${:02X}", opcode);
    }
}

#[test]
fn page_cross_adds_a_cycle_to_reads_only() {
    // LDX #$01; LDA $80FF,X; LDA $8000,X; STA $80FF,X
    let mut cpu = cpu_with(&[0xA2, 0x01, 0xBD, 0xFF, 0x80, 0xBD, 0x00, 0x80, 0x9D, 0xFF, 0x80]);
    assert_eq!(measure(&mut cpu), 7 + 2);
    assert_eq!(measure(&mut cpu), 5);
    assert_eq!(measure(&mut cpu), 4);
    assert_eq!(measure(&mut cpu), 5);
}

#[test]
fn branch_costs_depend_on_taken_and_page() {
    // LDA #0; BEQ +0; BNE +0; JMP $80FA
    let mut cpu = cpu_with(&[0xA9, 0x00, 0xF0, 0x00, 0xD0, 0x00, 0x4C, 0xFA, 0x80]);
    cpu.bus.load(0x80FA, &[0xF0, 0x10]); // BEQ $810C
    cpu.step();
    assert_eq!(measure(&mut cpu), 3); // taken, same page
    assert_eq!(measure(&mut cpu), 2); // not taken
    assert_eq!(measure(&mut cpu), 3); // JMP
    assert_eq!(measure(&mut cpu), 4); // taken, next page
    assert_eq!(cpu.pc, 0x810C);
}

#[test]
fn nmi_runs_after_current_instruction() {
    let mut cpu = cpu_with(&[0xEA, 0xEA, 0xEA, 0xEA]);
    cpu.bus.load(0x9000, &[0xEA]);
    cpu.step();

    cpu.bus.nmi = true;
    cpu.step();
    assert_eq!(cpu.pc, 0x8002);

    // Interrupt sequence, then the handler's first instruction
    cpu.step();
    assert_eq!(cpu.pc, 0x9001);
    assert_eq!(cpu.bus.mem[0x01FD], 0x80);
    assert_eq!(cpu.bus.mem[0x01FC], 0x02);
    assert_eq!(cpu.bus.mem[0x01FB] & (FLAG_B0 | FLAG_B1), FLAG_B1);
    assert!(cpu.status & FLAG_INTERRUPT_DISABLE != 0);

    // The line is still high: no second edge, no second NMI
    cpu.bus.load(0x9001, &[0xEA]);
    cpu.step();
    assert_eq!(cpu.pc, 0x9002);
}

#[test]
fn irq_is_masked_by_interrupt_disable() {
    // Reset leaves I set. NOP; NOP; CLI; NOP
    let mut cpu = cpu_with(&[0xEA, 0xEA, 0x58, 0xEA]);
    cpu.bus.load(0xA000, &[0xEA, 0xEA]);
    cpu.bus.irq = true;
    cpu.step();
    cpu.step();
    assert_eq!(cpu.pc, 0x8002);

    cpu.step(); // CLI
    cpu.step(); // IRQ sequence, then the handler's first NOP
    assert_eq!(cpu.pc, 0xA001);
    assert_eq!(cpu.bus.mem[0x01FD], 0x80);
    assert_eq!(cpu.bus.mem[0x01FC], 0x03);
    assert!(cpu.status & FLAG_INTERRUPT_DISABLE != 0);

    // I is set again inside the handler, so the still-high line is ignored
    cpu.step();
    assert_eq!(cpu.pc, 0xA002);
}

#[test]
fn dma_stall_freezes_the_cpu_but_counts_cycles() {
    let mut cpu = cpu_with(&[0xE8, 0xE8]);
    cpu.step();
    assert_eq!(cpu.x, 1);

    cpu.bus.dma = true;
    let cycles = cpu.cycles;
    run_cycles(&mut cpu, 10);
    assert_eq!(cpu.x, 1);
    assert_eq!(cpu.pc, 0x8001);
    assert_eq!(cpu.cycles, cycles + 10);

    cpu.bus.dma = false;
    cpu.step();
    assert_eq!(cpu.x, 2);
}

#[test]
fn trace_line_uses_nestest_layout() {
    let mut cpu = cpu_with(&[0x4C, 0xF5, 0xC5]);
    run_cycles(&mut cpu, 7);
    assert_eq!(
        cpu.trace_line(),
        "8000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD CYC:7"
    );
}

#[test]
fn trace_line_marks_undocumented_opcodes() {
    let mut cpu = cpu_with(&[0x04, 0xA9]);
    assert!(cpu.trace_line().starts_with("8000  04 A9    *NOP $A9"));
}
