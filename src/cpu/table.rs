//! Opcode decode table: operation, addressing mode and base cycle count for all 256 opcodes.
//!
//! See [CPU unofficial opcodes](https://www.nesdev.org/wiki/CPU_unofficial_opcodes). Base cycles
//! exclude the page-cross and branch-taken penalties, which are added at dispatch.

use crate::cpu::addressing::AddressingMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    // Undocumented
    Ahx,
    Alr,
    Anc,
    Arr,
    Axs,
    Dcp,
    Isc,
    Kil,
    Las,
    Lax,
    Rla,
    Rra,
    Sax,
    Shx,
    Shy,
    Slo,
    Sre,
    Tas,
    Xaa,
}

impl Operation {
    pub fn mnemonic(self) -> &'static str {
        use Operation::*;
        match self {
            Adc => "ADC",
            And => "AND",
            Asl => "ASL",
            Bcc => "BCC",
            Bcs => "BCS",
            Beq => "BEQ",
            Bit => "BIT",
            Bmi => "BMI",
            Bne => "BNE",
            Bpl => "BPL",
            Brk => "BRK",
            Bvc => "BVC",
            Bvs => "BVS",
            Clc => "CLC",
            Cld => "CLD",
            Cli => "CLI",
            Clv => "CLV",
            Cmp => "CMP",
            Cpx => "CPX",
            Cpy => "CPY",
            Dec => "DEC",
            Dex => "DEX",
            Dey => "DEY",
            Eor => "EOR",
            Inc => "INC",
            Inx => "INX",
            Iny => "INY",
            Jmp => "JMP",
            Jsr => "JSR",
            Lda => "LDA",
            Ldx => "LDX",
            Ldy => "LDY",
            Lsr => "LSR",
            Nop => "NOP",
            Ora => "ORA",
            Pha => "PHA",
            Php => "PHP",
            Pla => "PLA",
            Plp => "PLP",
            Rol => "ROL",
            Ror => "ROR",
            Rti => "RTI",
            Rts => "RTS",
            Sbc => "SBC",
            Sec => "SEC",
            Sed => "SED",
            Sei => "SEI",
            Sta => "STA",
            Stx => "STX",
            Sty => "STY",
            Tax => "TAX",
            Tay => "TAY",
            Tsx => "TSX",
            Txa => "TXA",
            Txs => "TXS",
            Tya => "TYA",
            Ahx => "AHX",
            Alr => "ALR",
            Anc => "ANC",
            Arr => "ARR",
            Axs => "AXS",
            Dcp => "DCP",
            Isc => "ISB",
            Kil => "KIL",
            Las => "LAS",
            Lax => "LAX",
            Rla => "RLA",
            Rra => "RRA",
            Sax => "SAX",
            Shx => "SHX",
            Shy => "SHY",
            Slo => "SLO",
            Sre => "SRE",
            Tas => "TAS",
            Xaa => "XAA",
        }
    }

    fn is_undocumented(self) -> bool {
        use Operation::*;
        matches!(
            self,
            Ahx | Alr
                | Anc
                | Arr
                | Axs
                | Dcp
                | Isc
                | Kil
                | Las
                | Lax
                | Rla
                | Rra
                | Sax
                | Shx
                | Shy
                | Slo
                | Sre
                | Tas
                | Xaa
        )
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Opcode {
    pub operation: Operation,
    pub mode: AddressingMode,
    pub cycles: u8,
}

impl Opcode {
    pub fn decode(opcode: u8) -> Opcode {
        OPCODES[opcode as usize]
    }
}

/// True for the 151 documented opcodes. $EA is the only documented NOP and $EB duplicates SBC #.
pub fn is_documented(opcode: u8) -> bool {
    let decoded = Opcode::decode(opcode);
    match decoded.operation {
        Operation::Nop => opcode == 0xEA,
        Operation::Sbc => opcode != 0xEB,
        operation => !operation.is_undocumented(),
    }
}

const fn op(operation: Operation, mode: AddressingMode, cycles: u8) -> Opcode {
    Opcode {
        operation,
        mode,
        cycles,
    }
}

use AddressingMode::{
    Absolute as Abs, AbsoluteX as Abx, AbsoluteY as Aby, Immediate as Imm, Implied as Imp,
    Indirect as Ind, IndirectX as Izx, IndirectY as Izy, Relative as Rel, ZeroPage as Zp0,
    ZeroPageX as Zpx, ZeroPageY as Zpy,
};
use Operation::*;

#[rustfmt::skip]
static OPCODES: [Opcode; 256] = [
    // 0x00
    op(Brk, Imp, 7), op(Ora, Izx, 6), op(Kil, Imp, 2), op(Slo, Izx, 8),
    op(Nop, Zp0, 3), op(Ora, Zp0, 3), op(Asl, Zp0, 5), op(Slo, Zp0, 5),
    op(Php, Imp, 3), op(Ora, Imm, 2), op(Asl, Imp, 2), op(Anc, Imm, 2),
    op(Nop, Abs, 4), op(Ora, Abs, 4), op(Asl, Abs, 6), op(Slo, Abs, 6),
    // 0x10
    op(Bpl, Rel, 2), op(Ora, Izy, 5), op(Kil, Imp, 2), op(Slo, Izy, 8),
    op(Nop, Zpx, 4), op(Ora, Zpx, 4), op(Asl, Zpx, 6), op(Slo, Zpx, 6),
    op(Clc, Imp, 2), op(Ora, Aby, 4), op(Nop, Imp, 2), op(Slo, Aby, 7),
    op(Nop, Abx, 4), op(Ora, Abx, 4), op(Asl, Abx, 7), op(Slo, Abx, 7),
    // 0x20
    op(Jsr, Abs, 6), op(And, Izx, 6), op(Kil, Imp, 2), op(Rla, Izx, 8),
    op(Bit, Zp0, 3), op(And, Zp0, 3), op(Rol, Zp0, 5), op(Rla, Zp0, 5),
    op(Plp, Imp, 4), op(And, Imm, 2), op(Rol, Imp, 2), op(Anc, Imm, 2),
    op(Bit, Abs, 4), op(And, Abs, 4), op(Rol, Abs, 6), op(Rla, Abs, 6),
    // 0x30
    op(Bmi, Rel, 2), op(And, Izy, 5), op(Kil, Imp, 2), op(Rla, Izy, 8),
    op(Nop, Zpx, 4), op(And, Zpx, 4), op(Rol, Zpx, 6), op(Rla, Zpx, 6),
    op(Sec, Imp, 2), op(And, Aby, 4), op(Nop, Imp, 2), op(Rla, Aby, 7),
    op(Nop, Abx, 4), op(And, Abx, 4), op(Rol, Abx, 7), op(Rla, Abx, 7),
    // 0x40
    op(Rti, Imp, 6), op(Eor, Izx, 6), op(Kil, Imp, 2), op(Sre, Izx, 8),
    op(Nop, Zp0, 3), op(Eor, Zp0, 3), op(Lsr, Zp0, 5), op(Sre, Zp0, 5),
    op(Pha, Imp, 3), op(Eor, Imm, 2), op(Lsr, Imp, 2), op(Alr, Imm, 2),
    op(Jmp, Abs, 3), op(Eor, Abs, 4), op(Lsr, Abs, 6), op(Sre, Abs, 6),
    // 0x50
    op(Bvc, Rel, 2), op(Eor, Izy, 5), op(Kil, Imp, 2), op(Sre, Izy, 8),
    op(Nop, Zpx, 4), op(Eor, Zpx, 4), op(Lsr, Zpx, 6), op(Sre, Zpx, 6),
    op(Cli, Imp, 2), op(Eor, Aby, 4), op(Nop, Imp, 2), op(Sre, Aby, 7),
    op(Nop, Abx, 4), op(Eor, Abx, 4), op(Lsr, Abx, 7), op(Sre, Abx, 7),
    // 0x60
    op(Rts, Imp, 6), op(Adc, Izx, 6), op(Kil, Imp, 2), op(Rra, Izx, 8),
    op(Nop, Zp0, 3), op(Adc, Zp0, 3), op(Ror, Zp0, 5), op(Rra, Zp0, 5),
    op(Pla, Imp, 4), op(Adc, Imm, 2), op(Ror, Imp, 2), op(Arr, Imm, 2),
    op(Jmp, Ind, 5), op(Adc, Abs, 4), op(Ror, Abs, 6), op(Rra, Abs, 6),
    // 0x70
    op(Bvs, Rel, 2), op(Adc, Izy, 5), op(Kil, Imp, 2), op(Rra, Izy, 8),
    op(Nop, Zpx, 4), op(Adc, Zpx, 4), op(Ror, Zpx, 6), op(Rra, Zpx, 6),
    op(Sei, Imp, 2), op(Adc, Aby, 4), op(Nop, Imp, 2), op(Rra, Aby, 7),
    op(Nop, Abx, 4), op(Adc, Abx, 4), op(Ror, Abx, 7), op(Rra, Abx, 7),
    // 0x80
    op(Nop, Imm, 2), op(Sta, Izx, 6), op(Nop, Imm, 2), op(Sax, Izx, 6),
    op(Sty, Zp0, 3), op(Sta, Zp0, 3), op(Stx, Zp0, 3), op(Sax, Zp0, 3),
    op(Dey, Imp, 2), op(Nop, Imm, 2), op(Txa, Imp, 2), op(Xaa, Imm, 2),
    op(Sty, Abs, 4), op(Sta, Abs, 4), op(Stx, Abs, 4), op(Sax, Abs, 4),
    // 0x90
    op(Bcc, Rel, 2), op(Sta, Izy, 6), op(Kil, Imp, 2), op(Ahx, Izy, 6),
    op(Sty, Zpx, 4), op(Sta, Zpx, 4), op(Stx, Zpy, 4), op(Sax, Zpy, 4),
    op(Tya, Imp, 2), op(Sta, Aby, 5), op(Txs, Imp, 2), op(Tas, Aby, 5),
    op(Shy, Abx, 5), op(Sta, Abx, 5), op(Shx, Aby, 5), op(Ahx, Aby, 5),
    // 0xA0
    op(Ldy, Imm, 2), op(Lda, Izx, 6), op(Ldx, Imm, 2), op(Lax, Izx, 6),
    op(Ldy, Zp0, 3), op(Lda, Zp0, 3), op(Ldx, Zp0, 3), op(Lax, Zp0, 3),
    op(Tay, Imp, 2), op(Lda, Imm, 2), op(Tax, Imp, 2), op(Lax, Imm, 2),
    op(Ldy, Abs, 4), op(Lda, Abs, 4), op(Ldx, Abs, 4), op(Lax, Abs, 4),
    // 0xB0
    op(Bcs, Rel, 2), op(Lda, Izy, 5), op(Kil, Imp, 2), op(Lax, Izy, 5),
    op(Ldy, Zpx, 4), op(Lda, Zpx, 4), op(Ldx, Zpy, 4), op(Lax, Zpy, 4),
    op(Clv, Imp, 2), op(Lda, Aby, 4), op(Tsx, Imp, 2), op(Las, Aby, 4),
    op(Ldy, Abx, 4), op(Lda, Abx, 4), op(Ldx, Aby, 4), op(Lax, Aby, 4),
    // 0xC0
    op(Cpy, Imm, 2), op(Cmp, Izx, 6), op(Nop, Imm, 2), op(Dcp, Izx, 8),
    op(Cpy, Zp0, 3), op(Cmp, Zp0, 3), op(Dec, Zp0, 5), op(Dcp, Zp0, 5),
    op(Iny, Imp, 2), op(Cmp, Imm, 2), op(Dex, Imp, 2), op(Axs, Imm, 2),
    op(Cpy, Abs, 4), op(Cmp, Abs, 4), op(Dec, Abs, 6), op(Dcp, Abs, 6),
    // 0xD0
    op(Bne, Rel, 2), op(Cmp, Izy, 5), op(Kil, Imp, 2), op(Dcp, Izy, 8),
    op(Nop, Zpx, 4), op(Cmp, Zpx, 4), op(Dec, Zpx, 6), op(Dcp, Zpx, 6),
    op(Cld, Imp, 2), op(Cmp, Aby, 4), op(Nop, Imp, 2), op(Dcp, Aby, 7),
    op(Nop, Abx, 4), op(Cmp, Abx, 4), op(Dec, Abx, 7), op(Dcp, Abx, 7),
    // 0xE0
    op(Cpx, Imm, 2), op(Sbc, Izx, 6), op(Nop, Imm, 2), op(Isc, Izx, 8),
    op(Cpx, Zp0, 3), op(Sbc, Zp0, 3), op(Inc, Zp0, 5), op(Isc, Zp0, 5),
    op(Inx, Imp, 2), op(Sbc, Imm, 2), op(Nop, Imp, 2), op(Sbc, Imm, 2),
    op(Cpx, Abs, 4), op(Sbc, Abs, 4), op(Inc, Abs, 6), op(Isc, Abs, 6),
    // 0xF0
    op(Beq, Rel, 2), op(Sbc, Izy, 5), op(Kil, Imp, 2), op(Isc, Izy, 8),
    op(Nop, Zpx, 4), op(Sbc, Zpx, 4), op(Inc, Zpx, 6), op(Isc, Zpx, 6),
    op(Sed, Imp, 2), op(Sbc, Aby, 4), op(Nop, Imp, 2), op(Isc, Aby, 7),
    op(Nop, Abx, 4), op(Sbc, Abx, 4), op(Inc, Abx, 7), op(Isc, Abx, 7),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_count() {
        assert_eq!((0..=255u8).filter(|&op| is_documented(op)).count(), 151);
    }

    #[test]
    fn decodes_known_opcodes() {
        let jmp = Opcode::decode(0x6C);
        assert_eq!(jmp.operation, Operation::Jmp);
        assert_eq!(jmp.mode, AddressingMode::Indirect);
        assert_eq!(jmp.cycles, 5);

        let sbc = Opcode::decode(0xEB);
        assert_eq!(sbc.operation, Operation::Sbc);
        assert!(!is_documented(0xEB));
        assert_eq!(Opcode::decode(0x9D).cycles, 5);
    }
}
