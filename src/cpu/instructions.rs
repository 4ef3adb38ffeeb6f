//! Instruction semantics, documented and undocumented.
//!
//! Undocumented read-modify-write opcodes are compositions of two documented operations (DCP is
//! DEC then CMP, ISC is INC then SBC, and so on). The unstable stores (AHX, TAS, SHX, SHY) and XAA
//! jam the CPU like KIL instead of emulating their analog behaviour.

use crate::bus::Bus;
use crate::cpu::addressing::AddressingMode;
use crate::cpu::alu::{Sum, add_with_carry, subtract_with_borrow};
use crate::cpu::cpu::{CPU, IRQ_VECTOR};
use crate::cpu::flags::{
    FLAG_B0, FLAG_B1, FLAG_CARRY, FLAG_DECIMAL, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE,
    FLAG_OVERFLOW, FLAG_ZERO, with_flag,
};
use crate::cpu::table::Operation;

impl<B: Bus> CPU<B> {
    /// Execute `operation` against the resolved address. Returns true when the instruction takes
    /// the extra cycle on a page-crossing indexed read.
    pub(crate) fn execute(&mut self, operation: Operation) -> bool {
        use Operation::*;

        match operation {
            // Loads and stores
            Lda => {
                self.a = self.operand();
                self.set_zn(self.a);
                return true;
            }
            Ldx => {
                self.x = self.operand();
                self.set_zn(self.x);
                return true;
            }
            Ldy => {
                self.y = self.operand();
                self.set_zn(self.y);
                return true;
            }
            Lax => {
                self.a = self.operand();
                self.x = self.a;
                self.set_zn(self.a);
                return true;
            }
            Sta => self.bus.write(self.address, self.a),
            Stx => self.bus.write(self.address, self.x),
            Sty => self.bus.write(self.address, self.y),
            Sax => self.bus.write(self.address, self.a & self.x),

            // Transfers
            Tax => {
                self.x = self.a;
                self.set_zn(self.x);
            }
            Tay => {
                self.y = self.a;
                self.set_zn(self.y);
            }
            Txa => {
                self.a = self.x;
                self.set_zn(self.a);
            }
            Tya => {
                self.a = self.y;
                self.set_zn(self.a);
            }
            Tsx => {
                self.x = self.sp;
                self.set_zn(self.x);
            }
            Txs => self.sp = self.x,

            // Arithmetic and logic
            Adc => {
                let value = self.operand();
                self.adc(value);
                return true;
            }
            Sbc => {
                let value = self.operand();
                self.sbc(value);
                return true;
            }
            And => {
                self.a &= self.operand();
                self.set_zn(self.a);
                return true;
            }
            Ora => {
                self.a |= self.operand();
                self.set_zn(self.a);
                return true;
            }
            Eor => {
                self.a ^= self.operand();
                self.set_zn(self.a);
                return true;
            }
            Cmp => {
                let value = self.operand();
                self.compare(self.a, value);
                return true;
            }
            Cpx => {
                let value = self.operand();
                self.compare(self.x, value);
            }
            Cpy => {
                let value = self.operand();
                self.compare(self.y, value);
            }
            Bit => {
                let value = self.operand();
                self.set_flag(FLAG_ZERO, self.a & value == 0);
                self.set_flag(FLAG_OVERFLOW, value & 0x40 != 0);
                self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
            }

            // Increments
            Inc => {
                let value = self.operand().wrapping_add(1);
                self.store(value);
                self.set_zn(value);
            }
            Dec => {
                let value = self.operand().wrapping_sub(1);
                self.store(value);
                self.set_zn(value);
            }
            Inx => {
                self.x = self.x.wrapping_add(1);
                self.set_zn(self.x);
            }
            Iny => {
                self.y = self.y.wrapping_add(1);
                self.set_zn(self.y);
            }
            Dex => {
                self.x = self.x.wrapping_sub(1);
                self.set_zn(self.x);
            }
            Dey => {
                self.y = self.y.wrapping_sub(1);
                self.set_zn(self.y);
            }

            // Shifts: accumulator when implied, memory otherwise
            Asl => {
                let value = self.read_target();
                let result = self.asl(value);
                self.write_target(result);
            }
            Lsr => {
                let value = self.read_target();
                let result = self.lsr(value);
                self.write_target(result);
            }
            Rol => {
                let value = self.read_target();
                let result = self.rol(value);
                self.write_target(result);
            }
            Ror => {
                let value = self.read_target();
                let result = self.ror(value);
                self.write_target(result);
            }

            // Branches
            Bcc => self.branch(self.status & FLAG_CARRY == 0),
            Bcs => self.branch(self.status & FLAG_CARRY != 0),
            Bne => self.branch(self.status & FLAG_ZERO == 0),
            Beq => self.branch(self.status & FLAG_ZERO != 0),
            Bpl => self.branch(self.status & FLAG_NEGATIVE == 0),
            Bmi => self.branch(self.status & FLAG_NEGATIVE != 0),
            Bvc => self.branch(self.status & FLAG_OVERFLOW == 0),
            Bvs => self.branch(self.status & FLAG_OVERFLOW != 0),

            // Jumps and subroutines
            Jmp => self.pc = self.address,
            Jsr => {
                self.push_word(self.pc.wrapping_sub(1));
                self.pc = self.address;
            }
            Rts => self.pc = self.pop_word().wrapping_add(1),
            Rti => {
                let status = self.pop();
                self.status = (status & !FLAG_B0) | FLAG_B1;
                self.pc = self.pop_word();
            }
            Brk => {
                // BRK skips a padding byte
                self.push_word(self.pc.wrapping_add(1));
                self.push(self.status | FLAG_B0 | FLAG_B1);
                self.status |= FLAG_INTERRUPT_DISABLE;
                self.pc = self.read_word(IRQ_VECTOR);
            }

            // Stack
            Pha => self.push(self.a),
            Php => self.push(self.status | FLAG_B0 | FLAG_B1),
            Pla => {
                self.a = self.pop();
                self.set_zn(self.a);
            }
            Plp => {
                let status = self.pop();
                self.status = (status & !FLAG_B0) | FLAG_B1;
            }

            // Flags
            Clc => self.set_flag(FLAG_CARRY, false),
            Sec => self.set_flag(FLAG_CARRY, true),
            Cli => self.set_flag(FLAG_INTERRUPT_DISABLE, false),
            Sei => self.set_flag(FLAG_INTERRUPT_DISABLE, true),
            Cld => self.set_flag(FLAG_DECIMAL, false),
            Sed => self.set_flag(FLAG_DECIMAL, true),
            Clv => self.set_flag(FLAG_OVERFLOW, false),

            // Every NOP addressing form still reads its operand
            Nop => {
                if self.mode != AddressingMode::Implied {
                    self.operand();
                }
                return true;
            }

            // Undocumented composites
            Slo => {
                let value = self.operand();
                let result = self.asl(value);
                self.store(result);
                self.a |= result;
                self.set_zn(self.a);
            }
            Rla => {
                let value = self.operand();
                let result = self.rol(value);
                self.store(result);
                self.a &= result;
                self.set_zn(self.a);
            }
            Sre => {
                let value = self.operand();
                let result = self.lsr(value);
                self.store(result);
                self.a ^= result;
                self.set_zn(self.a);
            }
            Rra => {
                let value = self.operand();
                let result = self.ror(value);
                self.store(result);
                self.adc(result);
            }
            Dcp => {
                let value = self.operand().wrapping_sub(1);
                self.store(value);
                self.compare(self.a, value);
            }
            Isc => {
                let value = self.operand().wrapping_add(1);
                self.store(value);
                self.sbc(value);
            }
            Anc => {
                self.a &= self.operand();
                self.set_zn(self.a);
                self.set_flag(FLAG_CARRY, self.a & 0x80 != 0);
            }
            Alr => {
                self.a &= self.operand();
                self.a = self.lsr(self.a);
            }
            Arr => {
                let value = self.a & self.operand();
                self.a = (value >> 1) | ((self.status & FLAG_CARRY) << 7);
                self.set_zn(self.a);
                self.set_flag(FLAG_CARRY, self.a & 0x40 != 0);
                self.set_flag(FLAG_OVERFLOW, ((self.a >> 6) ^ (self.a >> 5)) & 1 != 0);
            }
            Axs => {
                let value = self.operand();
                let masked = self.a & self.x;
                self.set_flag(FLAG_CARRY, masked >= value);
                self.x = masked.wrapping_sub(value);
                self.set_zn(self.x);
            }
            Las => {
                let value = self.operand() & self.sp;
                self.a = value;
                self.x = value;
                self.sp = value;
                self.set_zn(value);
                return true;
            }

            Kil | Ahx | Tas | Shx | Shy | Xaa => self.kill(),
        }
        false
    }

    fn operand(&mut self) -> u8 {
        self.bus.read(self.address)
    }

    fn store(&mut self, value: u8) {
        self.bus.write(self.address, value);
    }

    fn read_target(&mut self) -> u8 {
        if self.mode == AddressingMode::Implied {
            self.a
        } else {
            self.operand()
        }
    }

    fn write_target(&mut self, value: u8) {
        if self.mode == AddressingMode::Implied {
            self.a = value;
        } else {
            self.store(value);
        }
    }

    fn set_flag(&mut self, flag: u8, on: bool) {
        self.status = with_flag(self.status, flag, on);
    }

    fn set_zn(&mut self, value: u8) {
        self.set_flag(FLAG_ZERO, value == 0);
        self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
    }

    fn apply_sum(&mut self, sum: Sum) {
        self.a = sum.value;
        self.set_flag(FLAG_CARRY, sum.carry);
        self.set_flag(FLAG_OVERFLOW, sum.overflow);
        self.set_zn(self.a);
    }

    fn adc(&mut self, value: u8) {
        let sum = add_with_carry(self.a, value, self.status & FLAG_CARRY != 0);
        self.apply_sum(sum);
    }

    fn sbc(&mut self, value: u8) {
        let sum = subtract_with_borrow(self.a, value, self.status & FLAG_CARRY != 0);
        self.apply_sum(sum);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.set_flag(FLAG_CARRY, register >= value);
        self.set_zn(register.wrapping_sub(value));
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.set_flag(FLAG_CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.set_zn(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.set_flag(FLAG_CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.set_zn(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = self.status & FLAG_CARRY;
        self.set_flag(FLAG_CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.set_zn(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = (self.status & FLAG_CARRY) << 7;
        self.set_flag(FLAG_CARRY, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.set_zn(result);
        result
    }

    /// Taken branches cost one cycle, two when the target is on another page.
    fn branch(&mut self, condition: bool) {
        if !condition {
            return;
        }
        self.cycles_left += 1;
        if self.address & 0xFF00 != self.pc & 0xFF00 {
            self.cycles_left += 1;
        }
        self.pc = self.address;
    }
}
