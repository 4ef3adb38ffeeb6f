//! Binary adder shared by ADC, SBC and the composite opcodes built on them.

/// Sum, carry out and overflow of `a + m + carry`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sum {
    pub value: u8,
    pub carry: bool,
    pub overflow: bool,
}

/// ADC. Overflow is set when both inputs share a sign and the result's sign differs.
pub fn add_with_carry(a: u8, m: u8, carry: bool) -> Sum {
    let wide = a as u16 + m as u16 + carry as u16;
    let value = wide as u8;
    Sum {
        value,
        carry: wide > 0xFF,
        overflow: (a ^ value) & !(a ^ m) & 0x80 != 0,
    }
}

/// SBC is ADC of the one's complement: borrow is the inverted carry.
pub fn subtract_with_borrow(a: u8, m: u8, carry: bool) -> Sum {
    add_with_carry(a, !m, carry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carry_out_and_wrap() {
        let sum = add_with_carry(0xFF, 0x01, false);
        assert_eq!(sum.value, 0x00);
        assert!(sum.carry);
        assert!(!sum.overflow);
    }

    #[test]
    fn signed_overflow() {
        assert!(add_with_carry(0x50, 0x50, false).overflow);
        assert!(add_with_carry(0x90, 0x90, false).overflow);
        assert!(!add_with_carry(0x50, 0x90, false).overflow);
    }

    #[test]
    fn subtract_borrows_when_carry_clear() {
        let sum = subtract_with_borrow(0x05, 0x03, true);
        assert_eq!(sum.value, 0x02);
        assert!(sum.carry);

        let sum = subtract_with_borrow(0x05, 0x03, false);
        assert_eq!(sum.value, 0x01);

        let sum = subtract_with_borrow(0x03, 0x05, true);
        assert_eq!(sum.value, 0xFE);
        assert!(!sum.carry);
    }

    #[test]
    fn subtract_overflow() {
        // -128 - 1 does not fit
        assert!(subtract_with_borrow(0x80, 0x01, true).overflow);
        assert!(!subtract_with_borrow(0x7F, 0x01, true).overflow);
    }
}
