//! Instruction semantics: loads, arithmetic, prefixes, block operations and
//! the undocumented WZ/Q side effects.

use emu_core::SimpleBus;
use zilog_z80::{CF, HF, NF, PF, RegisterError, Reg8, SF, XF, YF, Z80, Z80Config, ZF};

const CODE: u16 = 0x8000;

fn machine(code: &[u8]) -> (Z80, SimpleBus) {
    let mut bus = SimpleBus::new();
    bus.load(CODE, code);
    let mut cpu = Z80::new();
    cpu.regs_mut().pc = CODE;
    cpu.regs_mut().sp = 0xC000;
    (cpu, bus)
}

fn run(cpu: &mut Z80, bus: &mut SimpleBus, instructions: usize) -> u32 {
    (0..instructions).map(|_| cpu.execute_one(bus)).sum()
}

#[test]
fn border_write_then_halt() {
    // LD A,18h; OUT (FEh),A; HALT
    let (mut cpu, mut bus) = machine(&[0x3E, 0x18, 0xD3, 0xFE, 0x76]);
    let mut steps = 0;
    while !cpu.regs().halted {
        cpu.execute_one(&mut bus);
        steps += 1;
        assert!(steps < 10, "CPU never halted");
    }

    assert_eq!(cpu.regs().a, 0x18);
    assert_eq!(bus.port_writes.len(), 1);
    let (port, value) = bus.port_writes[0];
    assert_eq!(port & 0xFF, 0xFE);
    assert_eq!(value, 0x18);
    assert_eq!(cpu.tacts(), 7 + 11 + 4);
}

#[test]
fn nop_only_advances_pc_and_r() {
    let (mut cpu, mut bus) = machine(&[0x00]);
    let mut expected = *cpu.regs();
    expected.pc += 1;
    expected.r += 1;

    assert_eq!(cpu.execute_one(&mut bus), 4);
    assert_eq!(*cpu.regs(), expected);
}

#[test]
fn refresh_counter_keeps_bit_7() {
    let (mut cpu, mut bus) = machine(&[0x00, 0xDD, 0x00]);
    cpu.regs_mut().r = 0xFF;
    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().r, 0x80);
    // Each prefix is its own M1 cycle
    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().r, 0x82);
}

#[test]
fn loads_and_memory_arithmetic() {
    let (mut cpu, mut bus) = machine(&[
        0x21, 0x00, 0x90, // LD HL,9000h
        0x36, 0x05, // LD (HL),5
        0x3E, 0x10, // LD A,10h
        0x86, // ADD A,(HL)
        0x34, // INC (HL)
        0x46, // LD B,(HL)
    ]);
    run(&mut cpu, &mut bus, 6);
    assert_eq!(cpu.regs().a, 0x15);
    assert_eq!(bus.memory[0x9000], 0x06);
    assert_eq!(cpu.regs().b, 0x06);
}

#[test]
fn index_halves_and_displacements() {
    let (mut cpu, mut bus) = machine(&[
        0xDD, 0x26, 0x90, // LD IXH,90h
        0xDD, 0x2E, 0x10, // LD IXL,10h
        0xDD, 0x66, 0xFF, // LD H,(IX-1)
        0xFD, 0x21, 0x00, 0xA0, // LD IY,A000h
        0xFD, 0x36, 0x02, 0x77, // LD (IY+2),77h
        0xDD, 0x7D, // LD A,IXL
    ]);
    bus.memory[0x900F] = 0x5A;
    cpu.regs_mut().h = 0x00;
    run(&mut cpu, &mut bus, 6);

    assert_eq!(cpu.regs().ix, 0x9010);
    // (IX+d) forms address the real H, not IXH
    assert_eq!(cpu.regs().h, 0x5A);
    assert_eq!(bus.memory[0xA002], 0x77);
    assert_eq!(cpu.regs().a, 0x10);
    assert_eq!(cpu.regs().wz, 0xA002);
}

#[test]
fn indexed_cb_copies_result_to_register() {
    let (mut cpu, mut bus) = machine(&[
        0xDD, 0xCB, 0x05, 0x00, // RLC (IX+5),B
        0xDD, 0xCB, 0x05, 0x06, // RLC (IX+5)
        0xFD, 0xCB, 0xFE, 0xC7, // SET 0,(IY-2),A
    ]);
    cpu.regs_mut().ix = 0x9000;
    cpu.regs_mut().iy = 0x9002;
    cpu.regs_mut().b = 0;
    bus.memory[0x9005] = 0x81;

    cpu.execute_one(&mut bus);
    assert_eq!(bus.memory[0x9005], 0x03);
    assert_eq!(cpu.regs().b, 0x03);
    assert_ne!(cpu.regs().f & CF, 0);

    cpu.execute_one(&mut bus);
    assert_eq!(bus.memory[0x9005], 0x06);
    assert_eq!(cpu.regs().b, 0x03);

    cpu.regs_mut().a = 0xFF;
    cpu.execute_one(&mut bus);
    assert_eq!(bus.memory[0x9000], 0x01);
    assert_eq!(cpu.regs().a, 0x01);
}

#[test]
fn bit_indexed_takes_xy_from_address() {
    let (mut cpu, mut bus) = machine(&[0xDD, 0xCB, 0x00, 0x46]); // BIT 0,(IX+0)
    cpu.regs_mut().ix = 0x2800;
    cpu.execute_one(&mut bus);
    let f = cpu.regs().f;
    assert_eq!(f & (YF | XF), YF | XF);
    assert_ne!(f & ZF, 0);
    assert_ne!(f & HF, 0);
}

#[test]
fn last_index_prefix_wins() {
    let (mut cpu, mut bus) = machine(&[0xDD, 0xFD, 0x21, 0x34, 0x12]); // LD IY,1234h
    let r = cpu.regs().r;
    assert_eq!(cpu.execute_one(&mut bus), 8);
    assert_eq!(cpu.internal_state().index_prefix, Some(0xFD));
    assert_eq!(cpu.execute_one(&mut bus), 10);
    assert_eq!(cpu.internal_state().index_prefix, None);
    assert_eq!(cpu.regs().iy, 0x1234);
    assert_eq!(cpu.regs().ix, 0);
    assert_eq!(cpu.regs().hl(), 0);
    assert_eq!(cpu.regs().r, r + 3);
}

#[test]
fn memory_full_of_prefixes_still_returns() {
    let mut bus = SimpleBus::new();
    bus.memory.fill(0xDD);
    let mut cpu = Z80::new();

    assert_eq!(cpu.execute_one(&mut bus), 8);
    for _ in 0..1000 {
        assert_eq!(cpu.execute_one(&mut bus), 4);
    }
    assert_eq!(cpu.regs().pc, 1002);
    assert_eq!(cpu.internal_state().index_prefix, Some(0xDD));
}

#[test]
fn latched_prefix_survives_state_transfer() {
    let (mut cpu, mut bus) = machine(&[0xFD, 0xDD, 0x21, 0x00, 0x40]); // LD IX,4000h
    cpu.execute_one(&mut bus);
    let state = cpu.internal_state();
    let pc = cpu.regs().pc;

    let mut resumed = Z80::new();
    resumed.regs_mut().pc = pc;
    resumed.set_internal_state(state);
    assert_eq!(resumed.execute_one(&mut bus), 10);
    assert_eq!(resumed.regs().ix, 0x4000);
    assert_eq!(resumed.regs().iy, 0);
}

#[test]
fn ed_after_index_prefix_ignores_it() {
    // DD ED 6A: ADC HL,HL, never ADC IX,IX
    let (mut cpu, mut bus) = machine(&[0xDD, 0xED, 0x6A]);
    cpu.regs_mut().set_hl(0x0101);
    cpu.regs_mut().ix = 0x4000;
    cpu.regs_mut().f = 0;
    assert_eq!(cpu.execute_one(&mut bus), 19);
    assert_eq!(cpu.regs().hl(), 0x0202);
    assert_eq!(cpu.regs().ix, 0x4000);
}

#[test]
fn undefined_ed_opcode_is_a_long_nop() {
    let (mut cpu, mut bus) = machine(&[0xED, 0x00]);
    let mut expected = *cpu.regs();
    expected.pc += 2;
    expected.r += 2;
    assert_eq!(cpu.execute_one(&mut bus), 8);
    assert_eq!(*cpu.regs(), expected);
}

#[test]
fn call_and_return() {
    let (mut cpu, mut bus) = machine(&[0xCD, 0x00, 0x90, 0x76]); // CALL 9000h; HALT
    bus.load(0x9000, &[0x3E, 0x07, 0xC9]); // LD A,7; RET
    run(&mut cpu, &mut bus, 4);
    assert!(cpu.regs().halted);
    assert_eq!(cpu.regs().a, 7);
    assert_eq!(cpu.regs().sp, 0xC000);
    assert_eq!(bus.peek_word(0xBFFE), CODE + 3);
}

#[test]
fn push_pop_round_trip() {
    let (mut cpu, mut bus) = machine(&[0xF5, 0xDD, 0xE1]); // PUSH AF; POP IX
    cpu.regs_mut().set_af(0x12D7);
    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs().ix, 0x12D7);
    assert_eq!(cpu.regs().sp, 0xC000);
}

#[test]
fn exchanges() {
    let (mut cpu, mut bus) = machine(&[0x08, 0xD9, 0xEB, 0xD9, 0x08]); // EX AF; EXX; EX DE,HL; EXX; EX AF
    let regs = cpu.regs_mut();
    regs.set_af(0x1111);
    regs.set_bc(0x2222);
    regs.set_de(0x3333);
    regs.set_hl(0x4444);
    regs.set_af_alt(0xAAAA);
    regs.set_bc_alt(0xBBBB);
    regs.set_de_alt(0xCCCC);
    regs.set_hl_alt(0xDDDD);

    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.regs().af(), 0xAAAA);
    assert_eq!(cpu.regs().de(), 0xDDDD);
    assert_eq!(cpu.regs().hl(), 0xCCCC);
    assert_eq!(cpu.regs().af_alt(), 0x1111);

    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs().af(), 0x1111);
    assert_eq!(cpu.regs().bc(), 0x2222);
    assert_eq!(cpu.regs().de_alt(), 0xDDDD);
    assert_eq!(cpu.regs().hl_alt(), 0xCCCC);
}

#[test]
fn shadow_exchange_is_an_involution() {
    let (mut cpu, _) = machine(&[]);
    let regs = cpu.regs_mut();
    regs.set_bc(0x0102);
    regs.set_hl_alt(0x0304);
    let before = *regs;

    regs.exchange_shadow();
    assert_eq!(regs.bc_alt(), 0x0102);
    assert_eq!(regs.hl(), 0x0304);
    regs.exchange_shadow();
    assert_eq!(*regs, before);
}

#[test]
fn ldir_copies_whole_block_in_one_call() {
    let (mut cpu, mut bus) = machine(&[0xED, 0xB0, 0x00]);
    bus.load(0x9000, b"HELLO");
    let regs = cpu.regs_mut();
    regs.set_hl(0x9000);
    regs.set_de(0xA000);
    regs.set_bc(5);
    let r = regs.r;

    assert_eq!(cpu.execute_one(&mut bus), 21 * 4 + 16);
    assert_eq!(&bus.memory[0xA000..0xA005], b"HELLO");
    assert_eq!(cpu.regs().bc(), 0);
    assert_eq!(cpu.regs().hl(), 0x9005);
    assert_eq!(cpu.regs().de(), 0xA005);
    assert_eq!(cpu.regs().pc, CODE + 2);
    assert_eq!(cpu.regs().f & PF, 0);
    assert_eq!(cpu.regs().r, r + 10);
}

#[test]
fn cpir_stops_on_match() {
    let (mut cpu, mut bus) = machine(&[0xED, 0xB1]);
    bus.load(0x9000, b"ABCDE");
    let regs = cpu.regs_mut();
    regs.a = b'C';
    regs.set_hl(0x9000);
    regs.set_bc(5);

    assert_eq!(cpu.execute_one(&mut bus), 21 + 21 + 16);
    assert_eq!(cpu.regs().hl(), 0x9003);
    assert_eq!(cpu.regs().bc(), 2);
    let f = cpu.regs().f;
    assert_ne!(f & ZF, 0);
    assert_ne!(f & PF, 0);
    assert_ne!(f & NF, 0);
}

#[test]
fn stepwise_ldir_rewinds_pc() {
    let mut bus = SimpleBus::new();
    bus.load(CODE, &[0xED, 0xB0]);
    bus.load(0x9000, &[1, 2]);
    let mut cpu = Z80::with_config(Z80Config {
        stepwise_block_repeat: true,
    });
    assert!(cpu.config().stepwise_block_repeat);
    let regs = cpu.regs_mut();
    regs.pc = CODE;
    regs.set_hl(0x9000);
    regs.set_de(0xA000);
    regs.set_bc(2);

    assert_eq!(cpu.execute_one(&mut bus), 21);
    assert_eq!(cpu.regs().pc, CODE);
    assert_eq!(cpu.regs().wz, CODE + 1);
    assert_eq!(bus.memory[0xA000], 1);
    // PC high byte 80h leaks into the undocumented bits
    assert_eq!(cpu.regs().f & (YF | XF), 0);

    assert_eq!(cpu.execute_one(&mut bus), 16);
    assert_eq!(cpu.regs().pc, CODE + 2);
    assert_eq!(bus.memory[0xA001], 2);
}

#[test]
fn ldi_and_ldd_take_xy_from_a_plus_byte() {
    // A + byte = 0Ah: bit 3 gives X, bit 1 gives Y
    let (mut cpu, mut bus) = machine(&[0xED, 0xA0]); // LDI
    bus.load(0x9000, &[0x08]);
    let regs = cpu.regs_mut();
    regs.a = 0x02;
    regs.f = 0xFF;
    regs.set_hl(0x9000);
    regs.set_de(0xA000);
    regs.set_bc(2);
    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().f, SF | ZF | YF | XF | PF | CF);

    // A + byte = 20h: bit 5 of the result does not leak into Y
    let (mut cpu, mut bus) = machine(&[0xED, 0xA8]); // LDD
    bus.load(0x9000, &[0x20]);
    let regs = cpu.regs_mut();
    regs.a = 0x00;
    regs.f = 0x00;
    regs.set_hl(0x9000);
    regs.set_de(0xA000);
    regs.set_bc(1);
    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().f, 0x00);
    assert_eq!(bus.memory[0xA000], 0x20);
    assert_eq!(cpu.regs().hl(), 0x8FFF);
    assert_eq!(cpu.regs().de(), 0x9FFF);
}

#[test]
fn ini_flags_from_byte_and_incremented_c() {
    let (mut cpu, mut bus) = machine(&[0xED, 0xA2]); // INI
    bus.set_port(0x0210, 0x80);
    let regs = cpu.regs_mut();
    regs.set_bc(0x0210);
    regs.set_hl(0x9000);

    assert_eq!(cpu.execute_one(&mut bus), 16);
    assert_eq!(bus.memory[0x9000], 0x80);
    assert_eq!(cpu.regs().b, 0x01);
    assert_eq!(cpu.regs().hl(), 0x9001);
    // k = 80h + 11h: no carry, parity of (k & 7) ^ B is even
    assert_eq!(cpu.regs().f, NF | PF);
}

#[test]
fn ind_carry_sets_h_and_c() {
    let (mut cpu, mut bus) = machine(&[0xED, 0xAA]); // IND
    bus.set_port(0x0100, 0x01);
    let regs = cpu.regs_mut();
    regs.set_bc(0x0100);
    regs.set_hl(0x9000);

    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().hl(), 0x8FFF);
    // k = 01h + FFh overflows
    assert_eq!(cpu.regs().f, ZF | HF | PF | CF);
}

#[test]
fn outi_flags_use_incremented_l() {
    let (mut cpu, mut bus) = machine(&[0xED, 0xA3]); // OUTI
    bus.load(0x90F0, &[0x20]);
    let regs = cpu.regs_mut();
    regs.set_bc(0x01FE);
    regs.set_hl(0x90F0);

    assert_eq!(cpu.execute_one(&mut bus), 16);
    assert_eq!(bus.port_writes, vec![(0x00FE, 0x20)]);
    // k = 20h + F1h overflows; B reached zero
    assert_eq!(cpu.regs().f, ZF | HF | CF);
}

fn stepwise_at(address: u16, code: &[u8]) -> (Z80, SimpleBus) {
    let mut bus = SimpleBus::new();
    bus.load(address, code);
    let mut cpu = Z80::with_config(Z80Config {
        stepwise_block_repeat: true,
    });
    cpu.regs_mut().pc = address;
    (cpu, bus)
}

#[test]
fn inir_repeat_with_carry_and_negative_byte() {
    let (mut cpu, mut bus) = stepwise_at(0x2800, &[0xED, 0xB2]); // INIR
    bus.set_port(0x1180, 0x90);
    let regs = cpu.regs_mut();
    regs.set_bc(0x1180);
    regs.set_hl(0x9000);

    assert_eq!(cpu.execute_one(&mut bus), 21);
    assert_eq!(cpu.regs().pc, 0x2800);
    assert_eq!(cpu.regs().b, 0x10);
    assert_eq!(bus.memory[0x9000], 0x90);
    // X/Y from PC high byte 28h; H set as B's low nibble is 0; P/V from
    // (k & 7) ^ B ^ ((B - 1) & 7) = 16h, odd
    assert_eq!(cpu.regs().f, YF | HF | XF | NF | CF);
}

#[test]
fn otir_repeat_with_carry_and_positive_byte() {
    let (mut cpu, mut bus) = stepwise_at(CODE, &[0xED, 0xB3]); // OTIR
    bus.load(0x90F0, &[0x7F]);
    let regs = cpu.regs_mut();
    regs.set_bc(0x10FE);
    regs.set_hl(0x90F0);

    assert_eq!(cpu.execute_one(&mut bus), 21);
    assert_eq!(cpu.regs().pc, CODE);
    assert_eq!(cpu.regs().b, 0x0F);
    assert_eq!(bus.port_writes, vec![(0x0FFE, 0x7F)]);
    // H set as B's low nibble is Fh; P/V from (k & 7) ^ B ^ ((B + 1) & 7) = 0Fh,
    // even. X/Y from PC high byte 80h are clear.
    assert_eq!(cpu.regs().f, HF | PF | CF);
}

#[test]
fn scf_undocumented_bits_follow_q() {
    // F left alone by the previous instruction: X/Y = F | A
    let (mut cpu, mut bus) = machine(&[0x00, 0x37]); // NOP; SCF
    cpu.regs_mut().a = 0;
    cpu.regs_mut().f = YF | XF;
    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs().f, YF | XF | CF);

    // F just written: X/Y come from A alone
    let (mut cpu, mut bus) = machine(&[0xAF, 0x37]); // XOR A; SCF
    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs().f, ZF | PF | CF);

    let (mut cpu, mut bus) = machine(&[0xB7, 0x3F]); // OR A; CCF
    cpu.regs_mut().a = 0x28;
    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs().f & (YF | XF | CF), YF | XF | CF);
}

#[test]
fn wz_tracks_memory_and_jump_targets() {
    let (mut cpu, mut bus) = machine(&[
        0x3A, 0x00, 0x28, // LD A,(2800h)
        0xCB, 0x46, // BIT 0,(HL)
        0x09, // ADD HL,BC
        0xC3, 0x00, 0x81, // JP 8100h
    ]);
    cpu.regs_mut().set_hl(0x4000);
    cpu.regs_mut().set_bc(0x0001);

    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().wz, 0x2801);
    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().f & (YF | XF), YF | XF);
    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().wz, 0x4001);
    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().wz, 0x8100);
}

#[test]
fn port_io_uses_full_address() {
    let (mut cpu, mut bus) = machine(&[
        0xDB, 0xFE, // IN A,(FEh)
        0xED, 0x78, // IN A,(C)
        0xED, 0x71, // OUT (C),0
    ]);
    bus.set_port(0x12FE, 0xBF);
    bus.set_port(0x00FE, 0x00);
    cpu.regs_mut().a = 0x12;
    cpu.regs_mut().set_bc(0x00FE);
    cpu.regs_mut().f = CF;

    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().a, 0xBF);
    assert_eq!(cpu.regs().f, CF);
    assert_eq!(cpu.regs().wz, 0x12FF);

    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().a, 0x00);
    assert_eq!(cpu.regs().f, ZF | PF | CF);

    cpu.execute_one(&mut bus);
    assert_eq!(bus.port_writes, vec![(0x00FE, 0x00)]);
}

#[test]
fn nibble_rotates() {
    let (mut cpu, mut bus) = machine(&[0xED, 0x6F, 0xED, 0x67]); // RLD; RRD
    cpu.regs_mut().set_hl(0x9000);
    cpu.regs_mut().a = 0x12;
    bus.memory[0x9000] = 0x34;

    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().a, 0x13);
    assert_eq!(bus.memory[0x9000], 0x42);

    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().a, 0x12);
    assert_eq!(bus.memory[0x9000], 0x34);
}

#[test]
fn neg_overflows_on_minus_128() {
    let (mut cpu, mut bus) = machine(&[0xED, 0x44]);
    cpu.regs_mut().a = 0x80;
    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().a, 0x80);
    assert_eq!(cpu.regs().f & (SF | PF | NF | CF), SF | PF | NF | CF);
}

#[test]
fn sixteen_bit_arithmetic() {
    let (mut cpu, mut bus) = machine(&[
        0xDD, 0x29, // ADD IX,IX
        0xED, 0x52, // SBC HL,DE
    ]);
    cpu.regs_mut().ix = 0x8000;
    cpu.regs_mut().f = 0;

    assert_eq!(cpu.execute_one(&mut bus), 15);
    assert_eq!(cpu.regs().ix, 0);
    assert_ne!(cpu.regs().f & CF, 0);

    cpu.regs_mut().f = 0;
    cpu.regs_mut().set_hl(0x1000);
    cpu.regs_mut().set_de(0x1000);
    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().hl(), 0);
    assert_eq!(cpu.regs().f & (ZF | NF | CF), ZF | NF);
}

#[test]
fn interrupt_mode_instructions() {
    let (mut cpu, mut bus) = machine(&[0xED, 0x5E, 0xED, 0x56, 0xED, 0x4E]); // IM 2; IM 1; IM 0
    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().im, 2);
    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().im, 1);
    cpu.execute_one(&mut bus);
    assert_eq!(cpu.regs().im, 0);
}

#[test]
fn numeric_register_access() {
    let (mut cpu, _) = machine(&[]);
    let regs = cpu.regs_mut();
    regs.set_reg8(7, 0x42).expect("A is index 7");
    assert_eq!(regs.get8(Reg8::A), 0x42);
    assert_eq!(regs.reg16(3), Ok(0xC000));

    let err = regs.reg8(6).expect_err("6 is the (HL) slot");
    assert_eq!(err, RegisterError::InvalidReg8(6));
    assert!(err.to_string().contains("(HL)"));
    assert_eq!(regs.set_reg16(4, 0), Err(RegisterError::InvalidReg16(4)));
}
