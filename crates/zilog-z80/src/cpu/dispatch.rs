//! Opcode dispatch tables.
//!
//! One 256-entry table of handlers per opcode space, built at compile time.
//! Handlers read `Z80::opcode` to recover the register and condition fields,
//! so one handler serves a whole column of the opcode map.

use emu_core::Bus;

use super::{Z80, arith, bit, block, branch, control, extended, load, stack};

pub(super) type OpFn = fn(&mut Z80, &mut dyn Bus);

macro_rules! table {
    ($entry:ident) => {{
        let mut table = [control::nop as OpFn; 256];
        let mut i = 0;
        while i < 256 {
            table[i] = $entry(i as u8);
            i += 1;
        }
        table
    }};
}

/// Unprefixed opcodes. DD/FD reuse this table with `index` set.
pub(super) static BASE: [OpFn; 256] = table!(base);

/// CB-prefixed opcodes.
pub(super) static CB: [OpFn; 256] = table!(cb);

/// ED-prefixed opcodes.
pub(super) static ED: [OpFn; 256] = table!(ed);

/// DDCB/FDCB opcodes, entered after the displacement and opcode are read.
pub(super) static INDEXED_CB: [OpFn; 256] = table!(indexed_cb);

const fn base(op: u8) -> OpFn {
    let y = (op >> 3) & 7;
    let z = op & 7;
    match op >> 6 {
        0 => match z {
            0 => match y {
                0 => control::nop,
                1 => load::ex_af,
                2 => branch::djnz,
                3 => branch::jr,
                _ => branch::jr_cc,
            },
            1 if y & 1 == 0 => load::ld_rp_nn,
            1 => arith::add_hl_rp,
            2 => load::ld_indirect,
            3 if y & 1 == 0 => arith::inc_rp,
            3 => arith::dec_rp,
            4 => arith::inc_r,
            5 => arith::dec_r,
            6 => load::ld_r_n,
            _ => match y {
                0..=3 => arith::rotate_a,
                4 => arith::daa,
                5 => arith::cpl,
                6 => arith::scf,
                _ => arith::ccf,
            },
        },
        1 if op == 0x76 => control::halt,
        1 => load::ld_r_r,
        2 => arith::alu_r,
        _ => match z {
            0 => branch::ret_cc,
            1 => match y {
                1 => branch::ret,
                3 => load::exx,
                5 => branch::jp_hl,
                7 => stack::ld_sp_hl,
                _ => stack::pop,
            },
            2 => branch::jp_cc,
            3 => match y {
                0 => branch::jp_nn,
                // CB is intercepted before dispatch
                1 => control::nop,
                2 => extended::out_n_a,
                3 => extended::in_a_n,
                4 => stack::ex_sp_hl,
                5 => load::ex_de_hl,
                6 => control::di,
                _ => control::ei,
            },
            4 => branch::call_cc,
            // DD, ED and FD are intercepted before dispatch
            5 if y & 1 == 1 => branch::call,
            5 => stack::push,
            6 => arith::alu_n,
            _ => branch::rst,
        },
    }
}

const fn cb(op: u8) -> OpFn {
    let memory = op & 7 == 6;
    match (op >> 6, memory) {
        (0, false) => bit::shift_r,
        (0, true) => bit::shift_hl,
        (1, false) => bit::bit_r,
        (1, true) => bit::bit_hl,
        (_, false) => bit::res_set_r,
        (_, true) => bit::res_set_hl,
    }
}

const fn indexed_cb(op: u8) -> OpFn {
    match op >> 6 {
        0 => bit::shift_indexed,
        1 => bit::bit_indexed,
        _ => bit::res_set_indexed,
    }
}

const fn ed(op: u8) -> OpFn {
    let y = (op >> 3) & 7;
    let z = op & 7;
    match op >> 6 {
        1 => match z {
            0 => extended::in_r_c,
            1 => extended::out_c_r,
            2 if y & 1 == 0 => arith::sbc_hl,
            2 => arith::adc_hl,
            3 if y & 1 == 0 => load::ld_nn_rp,
            3 => load::ld_rp_mem,
            4 => arith::neg,
            5 => branch::retn,
            6 => control::im,
            _ => match y {
                0 => load::ld_i_a,
                1 => load::ld_r_a,
                2 | 3 => load::ld_a_ir,
                4 => arith::rrd,
                5 => arith::rld,
                _ => control::nop,
            },
        },
        2 if y >= 4 && z <= 3 => match z {
            0 => block::transfer,
            1 => block::compare,
            2 => block::input,
            _ => block::output,
        },
        _ => control::nop,
    }
}
