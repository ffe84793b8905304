//! Z80 flag register bits and precomputed flag tables.
//!
//! The tables are built at compile time and shared read-only by every CPU.

/// Sign flag (bit 7) - set if result is negative.
pub const SF: u8 = 0b1000_0000;

/// Zero flag (bit 6) - set if result is zero.
pub const ZF: u8 = 0b0100_0000;

/// Undocumented flag (bit 5) - usually a copy of bit 5 of the result.
pub const YF: u8 = 0b0010_0000;

/// Half-carry flag (bit 4) - carry from bit 3 to bit 4.
pub const HF: u8 = 0b0001_0000;

/// Undocumented flag (bit 3) - usually a copy of bit 3 of the result.
pub const XF: u8 = 0b0000_1000;

/// Parity/Overflow flag (bit 2) - parity or overflow depending on instruction.
pub const PF: u8 = 0b0000_0100;

/// Add/Subtract flag (bit 1) - set if last operation was subtraction.
pub const NF: u8 = 0b0000_0010;

/// Carry flag (bit 0) - carry out of bit 7.
pub const CF: u8 = 0b0000_0001;

/// Compute parity of a byte (true if even number of 1 bits).
#[must_use]
pub const fn parity(value: u8) -> bool {
    value.count_ones() & 1 == 0
}

/// S, Z, Y and X for a result byte.
#[must_use]
pub const fn sz53(value: u8) -> u8 {
    let mut f = value & (SF | YF | XF);
    if value == 0 {
        f |= ZF;
    }
    f
}

/// S, Z, Y, X and parity for a result byte.
#[must_use]
pub const fn sz53p(value: u8) -> u8 {
    if parity(value) { sz53(value) | PF } else { sz53(value) }
}

/// `sz53p` for every byte.
pub static SZ53P: [u8; 256] = {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = sz53p(i as u8);
        i += 1;
    }
    table
};

/// Flags produced by `INC r`, indexed by the operand before the increment.
///
/// Carry is not included; callers merge the previous carry in.
pub static INC_FLAGS: [u8; 256] = {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        let operand = i as u8;
        let result = operand.wrapping_add(1);
        let mut f = sz53(result);
        if operand & 0x0F == 0x0F {
            f |= HF;
        }
        if operand == 0x7F {
            f |= PF;
        }
        table[i] = f;
        i += 1;
    }
    table
};

/// Flags produced by `DEC r`, indexed by the operand before the decrement.
///
/// Carry is not included; callers merge the previous carry in.
pub static DEC_FLAGS: [u8; 256] = {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        let operand = i as u8;
        let result = operand.wrapping_sub(1);
        let mut f = sz53(result) | NF;
        if operand & 0x0F == 0x00 {
            f |= HF;
        }
        if operand == 0x80 {
            f |= PF;
        }
        table[i] = f;
        i += 1;
    }
    table
};

/// BCD adjustment of `a` given the incoming flags. Returns `(result, flags)`.
#[must_use]
pub const fn daa(a: u8, flags: u8) -> (u8, u8) {
    let subtract = flags & NF != 0;
    let half = flags & HF != 0;
    let mut carry = flags & CF != 0;
    let low = a & 0x0F;

    let mut correction = 0;
    if half || low > 9 {
        correction |= 0x06;
    }
    if carry || a > 0x99 {
        correction |= 0x60;
        carry = true;
    }

    let (result, half_out) = if subtract {
        (a.wrapping_sub(correction), half && low < 6)
    } else {
        (a.wrapping_add(correction), low > 9)
    };

    let mut f = sz53p(result) | (flags & NF);
    if half_out {
        f |= HF;
    }
    if carry {
        f |= CF;
    }
    (result, f)
}

/// DAA results indexed by `a | C << 8 | N << 9 | H << 10`, packed as
/// `result << 8 | flags`.
pub static DAA_TABLE: [u16; 2048] = {
    let mut table = [0; 2048];
    let mut i = 0;
    while i < 2048 {
        let a = (i & 0xFF) as u8;
        let mut flags = 0;
        if i & 0x100 != 0 {
            flags |= CF;
        }
        if i & 0x200 != 0 {
            flags |= NF;
        }
        if i & 0x400 != 0 {
            flags |= HF;
        }
        let (result, f) = daa(a, flags);
        table[i] = (result as u16) << 8 | f as u16;
        i += 1;
    }
    table
};

/// Index into [`DAA_TABLE`] for an accumulator and flag byte.
#[must_use]
pub const fn daa_index(a: u8, flags: u8) -> usize {
    let mut index = a as usize;
    if flags & CF != 0 {
        index |= 0x100;
    }
    if flags & NF != 0 {
        index |= 0x200;
    }
    if flags & HF != 0 {
        index |= 0x400;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sz53p_samples() {
        assert_eq!(SZ53P[0x00], ZF | PF);
        assert_eq!(SZ53P[0x80], SF);
        assert_eq!(SZ53P[0x28], YF | XF | PF);
        assert_eq!(SZ53P[0x01], 0);
    }

    #[test]
    fn inc_dec_boundaries() {
        assert_eq!(INC_FLAGS[0x7F], SF | HF | PF);
        assert_eq!(INC_FLAGS[0xFF], ZF | HF);
        assert_eq!(DEC_FLAGS[0x80], NF | HF | PF | YF | XF);
        assert_eq!(DEC_FLAGS[0x01], NF | ZF);
    }

    #[test]
    fn daa_table_matches_function() {
        let (result, f) = daa(0x15, HF);
        assert_eq!(DAA_TABLE[daa_index(0x15, HF)], u16::from(result) << 8 | u16::from(f));
        assert_eq!(daa(0x9A, 0), (0x00, ZF | PF | HF | CF));
    }
}
