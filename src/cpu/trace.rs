//! nestest-style trace lines.
//!
//! `C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD CYC:7`
//!
//! Operand bytes are read with [`Bus::peek`] so tracing never disturbs PPU or controller state.

use crate::bus::Bus;
use crate::cpu::addressing::AddressingMode;
use crate::cpu::cpu::CPU;
use crate::cpu::table::{Opcode, Operation, is_documented};

impl<B: Bus> CPU<B> {
    /// Disassembly and register state for the instruction at PC, before it executes.
    pub fn trace_line(&mut self) -> String {
        let pc = self.pc;
        let opcode = self.bus.peek(pc);
        let decoded = Opcode::decode(opcode);
        let len = decoded.mode.operand_len();

        let lo = self.bus.peek(pc.wrapping_add(1));
        let hi = self.bus.peek(pc.wrapping_add(2));
        let word = (hi as u16) << 8 | lo as u16;

        let bytes = match len {
            0 => format!("{:02X}", opcode),
            1 => format!("{:02X} {:02X}", opcode, lo),
            _ => format!("{:02X} {:02X} {:02X}", opcode, lo, hi),
        };

        let operand = match decoded.mode {
            AddressingMode::Implied => match decoded.operation {
                Operation::Asl | Operation::Lsr | Operation::Rol | Operation::Ror => "A".to_string(),
                _ => String::new(),
            },
            AddressingMode::Immediate => format!("#${:02X}", lo),
            AddressingMode::ZeroPage => format!("${:02X}", lo),
            AddressingMode::ZeroPageX => format!("${:02X},X", lo),
            AddressingMode::ZeroPageY => format!("${:02X},Y", lo),
            AddressingMode::Relative => {
                let target = pc.wrapping_add(2).wrapping_add(lo as i8 as u16);
                format!("${:04X}", target)
            }
            AddressingMode::Absolute => format!("${:04X}", word),
            AddressingMode::AbsoluteX => format!("${:04X},X", word),
            AddressingMode::AbsoluteY => format!("${:04X},Y", word),
            AddressingMode::Indirect => format!("(${:04X})", word),
            AddressingMode::IndirectX => format!("(${:02X},X)", lo),
            AddressingMode::IndirectY => format!("(${:02X}),Y", lo),
        };

        let marker = if is_documented(opcode) { ' ' } else { '*' };

        format!(
            "{:04X}  {:<8} {}{} {:<27} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            pc,
            bytes,
            marker,
            decoded.operation.mnemonic(),
            operand,
            self.a,
            self.x,
            self.y,
            self.status,
            self.sp,
            self.cycles
        )
    }
}
