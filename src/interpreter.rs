//! # interpreter
//!
//! Decodes and executes one CHIP-8 instruction against a `Machine`. The
//! caller has already fetched the instruction and moved the program counter
//! past it, so jumps and calls overwrite PC and skips add 2 more.
//!
//! Field naming, for instruction `0xABCD`:
//!  * `nnn` -- low 12 bits (`0xBCD`), an address
//!  * `x`   -- bits 8-11 (`0xB`), a register
//!  * `y`   -- bits 4-7 (`0xC`), a register
//!  * `kk`  -- low byte (`0xCD`)
//!  * `n`   -- low nibble (`0xD`)
//!
//! Families `0`, `8`, `E` and `F` dispatch again on the low bits. Anything
//! not in the table is ignored, not treated as an error.
//!
//! Shifts (8xy6/8xyE) act on Vx alone and ignore Vy, as CHIP-48 and later
//! interpreters do.
use crate::machine::Machine;
use crate::memory::{MemoryMap, FONT_GLYPH_HEIGHT};
use crate::registers::Registers;
use rand::Rng;

/// a 16-bit instruction and the fields carved out of it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    pub fn family(self) -> u8 {
        (self.0 >> 12) as u8
    }
    pub fn nnn(self) -> u16 {
        self.0 & 0x0fff
    }
    pub fn x(self) -> usize {
        ((self.0 >> 8) & 0xf) as usize
    }
    pub fn y(self) -> usize {
        ((self.0 >> 4) & 0xf) as usize
    }
    pub fn kk(self) -> u8 {
        (self.0 & 0xff) as u8
    }
    pub fn n(self) -> u8 {
        (self.0 & 0xf) as u8
    }
}

/// execute a single instruction
pub fn execute(machine: &mut Machine, instruction: u16) {
    let op = Opcode(instruction);
    log::trace!(
        "{:04x}: {:04x} v={:02x?} i={:04x}",
        machine.registers.pc.wrapping_sub(2),
        instruction,
        (0..16).map(|r| machine.registers.v(r)).collect::<Vec<_>>(),
        machine.registers.i
    );

    let regs = &mut machine.registers;
    match op.family() {
        0x0 => match op.0 {
            0x00e0 => machine.screen.clear(),
            0x00ee => regs.pc = regs.stack.pop(),
            _ => ignored(op),
        },
        0x1 => regs.pc = op.nnn(),
        0x2 => {
            regs.stack.push(regs.pc);
            regs.pc = op.nnn();
        }
        0x3 => {
            let skip = regs.v(op.x()) == op.kk();
            skip_if(regs, skip);
        }
        0x4 => {
            let skip = regs.v(op.x()) != op.kk();
            skip_if(regs, skip);
        }
        0x5 => {
            let skip = regs.v(op.x()) == regs.v(op.y());
            skip_if(regs, skip);
        }
        0x6 => regs.set_v(op.x(), op.kk()),
        0x7 => {
            let vx = regs.v(op.x());
            regs.set_v(op.x(), vx.wrapping_add(op.kk()));
        }
        0x8 => execute_arithmetic(machine, op),
        0x9 => {
            let skip = regs.v(op.x()) != regs.v(op.y());
            skip_if(regs, skip);
        }
        0xa => regs.i = op.nnn(),
        0xb => regs.pc = op.nnn() + regs.v(0) as u16,
        0xc => {
            let random: u8 = machine.rng.gen();
            machine.registers.set_v(op.x(), random & op.kk());
        }
        0xd => {
            let x = regs.v(op.x()) as usize;
            let y = regs.v(op.y()) as usize;
            let sprite = machine.memory.sprite(regs.i, op.n() as usize);
            let collision = machine.screen.draw_sprite(x, y, sprite);
            machine.registers.set_flag(collision);
        }
        0xe => {
            let down = machine.keyboard.is_down(regs.v(op.x()));
            match op.kk() {
                0x9e => skip_if(regs, down),
                0xa1 => skip_if(regs, !down),
                _ => ignored(op),
            }
        }
        0xf => execute_misc(machine, op),
        _ => unreachable!("instruction family is only four bits"),
    }
}

fn skip_if(regs: &mut Registers, condition: bool) {
    if condition {
        regs.pc = regs.pc.wrapping_add(2);
    }
}

fn ignored(op: Opcode) {
    log::debug!("ignoring unknown instruction {:04x}", op.0);
}

/// 8xy_ -- register to register ALU ops
fn execute_arithmetic(machine: &mut Machine, op: Opcode) {
    let regs = &mut machine.registers;
    let vx = regs.v(op.x());
    let vy = regs.v(op.y());
    match op.n() {
        0x0 => regs.set_v(op.x(), vy),
        0x1 => regs.set_v(op.x(), vx | vy),
        0x2 => regs.set_v(op.x(), vx & vy),
        0x3 => regs.set_v(op.x(), vx ^ vy),
        0x4 => {
            let (sum, carry) = vx.overflowing_add(vy);
            regs.set_flag(carry);
            regs.set_v(op.x(), sum);
        }
        0x5 => {
            regs.set_flag(vx > vy);
            regs.set_v(op.x(), vx.wrapping_sub(vy));
        }
        0x6 => {
            regs.set_flag(vx & 0x01 != 0);
            regs.set_v(op.x(), vx >> 1);
        }
        0x7 => {
            regs.set_flag(vy > vx);
            regs.set_v(op.x(), vy.wrapping_sub(vx));
        }
        0xe => {
            regs.set_flag(vx & 0x80 != 0);
            regs.set_v(op.x(), vx << 1);
        }
        _ => ignored(op),
    }
}

/// Fx__ -- timers, keys, I and memory transfers
fn execute_misc(machine: &mut Machine, op: Opcode) {
    let x = op.x();
    match op.kk() {
        0x07 => {
            let dt = machine.registers.delay_timer;
            machine.registers.set_v(x, dt);
        }
        0x0a => {
            log::debug!("waiting for a key press");
            match machine.keys.wait_for_key(&machine.keyboard) {
                Some(key) => machine.registers.set_v(x, key),
                None => {
                    log::info!("key wait abandoned, halting");
                    machine.registers.pc = machine.registers.pc.wrapping_sub(2);
                    machine.halted = true;
                }
            }
        }
        0x15 => machine.registers.delay_timer = machine.registers.v(x),
        0x18 => machine.registers.sound_timer = machine.registers.v(x),
        0x1e => {
            let regs = &mut machine.registers;
            regs.i = regs.i.wrapping_add(regs.v(x) as u16);
        }
        0x29 => machine.registers.i = machine.registers.v(x) as u16 * FONT_GLYPH_HEIGHT as u16,
        0x33 => {
            let vx = machine.registers.v(x);
            let i = machine.registers.i;
            machine.memory.set_byte(i, vx / 100);
            machine.memory.set_byte(i.wrapping_add(1), vx / 10 % 10);
            machine.memory.set_byte(i.wrapping_add(2), vx % 10);
        }
        0x55 => {
            let i = machine.registers.i;
            for r in 0..=x {
                machine
                    .memory
                    .set_byte(i.wrapping_add(r as u16), machine.registers.v(r));
            }
        }
        0x65 => {
            let i = machine.registers.i;
            for r in 0..=x {
                let b = machine.memory.get_byte(i.wrapping_add(r as u16));
                machine.registers.set_v(r, b);
            }
        }
        _ => ignored(op),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::DummyKeys;

    fn machine() -> Machine {
        Machine::with_seed(Box::new(DummyKeys::new(&[])), 0x5eed)
    }

    fn run(m: &mut Machine, instructions: &[u16]) {
        for i in instructions {
            execute(m, *i);
        }
    }

    #[test]
    fn test_opcode_fields() {
        let op = Opcode(0xd12f);
        assert_eq!(op.family(), 0xd);
        assert_eq!(op.nnn(), 0x12f);
        assert_eq!(op.x(), 1);
        assert_eq!(op.y(), 2);
        assert_eq!(op.kk(), 0x2f);
        assert_eq!(op.n(), 0xf);
    }

    #[test]
    fn test_clear_screen() {
        let mut m = machine();
        m.screen.set_pixel(5, 5);
        run(&mut m, &[0x00e0]);
        assert!(!m.screen.is_set(5, 5));
    }

    #[test]
    fn test_call_and_return() {
        let mut m = machine();
        m.registers.pc = 0x206;
        run(&mut m, &[0x2400]);
        assert_eq!(m.registers.pc, 0x400);
        assert_eq!(m.registers.sp(), 1);
        run(&mut m, &[0x00ee]);
        assert_eq!(m.registers.pc, 0x206);
        assert_eq!(m.registers.sp(), 0);
    }

    #[test]
    #[should_panic]
    fn test_return_with_empty_stack_panics() {
        let mut m = machine();
        run(&mut m, &[0x00ee]);
    }

    #[test]
    #[should_panic]
    fn test_seventeen_calls_panics() {
        let mut m = machine();
        run(&mut m, &[0x2200; 17]);
    }

    #[test]
    fn test_jump() {
        let mut m = machine();
        run(&mut m, &[0x1abc]);
        assert_eq!(m.registers.pc, 0xabc);
    }

    #[test]
    fn test_jump_plus_v0() {
        let mut m = machine();
        run(&mut m, &[0x6010, 0xb300]);
        assert_eq!(m.registers.pc, 0x310);
    }

    #[test]
    fn test_skips() {
        let cases: [(&[u16], u16, bool); 8] = [
            (&[0x6142], 0x3142, true),
            (&[0x6142], 0x3143, false),
            (&[0x6142], 0x4143, true),
            (&[0x6142], 0x4142, false),
            (&[0x6107, 0x6207], 0x5120, true),
            (&[0x6107, 0x6208], 0x5120, false),
            (&[0x6107, 0x6208], 0x9120, true),
            (&[0x6107, 0x6207], 0x9120, false),
        ];
        for (setup, skip, taken) in cases {
            let mut m = machine();
            run(&mut m, setup);
            let pc = m.registers.pc;
            run(&mut m, &[skip]);
            let expected = if taken { pc + 2 } else { pc };
            assert_eq!(m.registers.pc, expected, "{:04x}", skip);
        }
    }

    #[test]
    fn test_add_immediate_wraps() {
        let mut m = machine();
        for x in 0..16u16 {
            for kk in 0..=255u16 {
                // set then added twice
                run(&mut m, &[0x6000 | (x << 8) | kk, 0x7000 | (x << 8) | kk, 0x7000 | (x << 8) | kk]);
                assert_eq!(m.registers.v(x as usize), (kk as u8).wrapping_mul(3));
                run(&mut m, &[0x6000 | (x << 8), 0x7000 | (x << 8) | kk, 0x7000 | (x << 8) | kk]);
                assert_eq!(m.registers.v(x as usize), ((kk + kk) % 256) as u8);
            }
        }
    }

    #[test]
    fn test_add_immediate_leaves_flag_alone() {
        let mut m = machine();
        run(&mut m, &[0x6fff, 0x6001, 0x70ff]);
        assert_eq!(m.registers.v(0), 0);
        assert_eq!(m.registers.v(0xf), 0xff);
    }

    #[test]
    fn test_logic_ops() {
        let mut m = machine();
        run(&mut m, &[0x610c, 0x620a, 0x8120]);
        assert_eq!(m.registers.v(1), 0x0a);
        run(&mut m, &[0x610c, 0x8121]);
        assert_eq!(m.registers.v(1), 0x0e);
        run(&mut m, &[0x610c, 0x8122]);
        assert_eq!(m.registers.v(1), 0x08);
        run(&mut m, &[0x610c, 0x8123]);
        assert_eq!(m.registers.v(1), 0x06);
    }

    #[test]
    fn test_add_registers_all_pairs() {
        let mut m = machine();
        for a in 0..=255u16 {
            for b in 0..=255u16 {
                m.registers.set_v(1, a as u8);
                m.registers.set_v(2, b as u8);
                run(&mut m, &[0x8124]);
                assert_eq!(m.registers.v(1), ((a + b) % 256) as u8);
                assert_eq!(m.registers.v(0xf), (a + b > 255) as u8);
            }
        }
    }

    #[test]
    fn test_sub() {
        let mut m = machine();
        run(&mut m, &[0x6105, 0x6203, 0x8125]);
        assert_eq!(m.registers.v(1), 2);
        assert_eq!(m.registers.v(0xf), 1);
        run(&mut m, &[0x6103, 0x6205, 0x8125]);
        assert_eq!(m.registers.v(1), 0xfe);
        assert_eq!(m.registers.v(0xf), 0);
        // equal operands: no borrow, but Vx > Vy is false
        run(&mut m, &[0x6105, 0x6205, 0x8125]);
        assert_eq!(m.registers.v(1), 0);
        assert_eq!(m.registers.v(0xf), 0);
    }

    #[test]
    fn test_subn() {
        let mut m = machine();
        run(&mut m, &[0x6103, 0x6205, 0x8127]);
        assert_eq!(m.registers.v(1), 2);
        assert_eq!(m.registers.v(0xf), 1);
        run(&mut m, &[0x6105, 0x6203, 0x8127]);
        assert_eq!(m.registers.v(1), 0xfe);
        assert_eq!(m.registers.v(0xf), 0);
    }

    #[test]
    fn test_shifts_ignore_vy() {
        let mut m = machine();
        run(&mut m, &[0x6105, 0x62ff, 0x8126]);
        assert_eq!(m.registers.v(1), 2);
        assert_eq!(m.registers.v(0xf), 1);
        run(&mut m, &[0x6104, 0x8126]);
        assert_eq!(m.registers.v(1), 2);
        assert_eq!(m.registers.v(0xf), 0);
        run(&mut m, &[0x6181, 0x812e]);
        assert_eq!(m.registers.v(1), 2);
        assert_eq!(m.registers.v(0xf), 1);
        run(&mut m, &[0x6141, 0x812e]);
        assert_eq!(m.registers.v(1), 0x82);
        assert_eq!(m.registers.v(0xf), 0);
    }

    #[test]
    fn test_flag_register_as_operand() {
        // the result is written after the flag, so VF ends up holding the sum
        let mut m = machine();
        run(&mut m, &[0x6fff, 0x6103, 0x8f14]);
        assert_eq!(m.registers.v(0xf), 0x02);
    }

    #[test]
    fn test_unknown_sub_opcodes_ignored() {
        let mut m = machine();
        run(&mut m, &[0x6105, 0x6203]);
        let pc = m.registers.pc;
        run(&mut m, &[0x8128, 0x812f, 0xe1ff, 0xf1ff, 0x0123]);
        assert_eq!(m.registers.v(1), 5);
        assert_eq!(m.registers.v(2), 3);
        assert_eq!(m.registers.pc, pc);
    }

    #[test]
    fn test_set_index() {
        let mut m = machine();
        run(&mut m, &[0xa123]);
        assert_eq!(m.registers.i, 0x123);
    }

    #[test]
    fn test_random_is_masked_and_seeded() {
        let mut a = machine();
        let mut b = machine();
        for _ in 0..32 {
            run(&mut a, &[0xc50f]);
            run(&mut b, &[0xc50f]);
            assert_eq!(a.registers.v(5) & 0xf0, 0);
            assert_eq!(a.registers.v(5), b.registers.v(5));
        }
        run(&mut a, &[0xc500]);
        assert_eq!(a.registers.v(5), 0);
    }

    #[test]
    fn test_draw_twice_restores_screen() {
        let mut m = machine();
        // glyph "8" at (10, 3)
        run(&mut m, &[0x6a08, 0xfa29, 0x610a, 0x6203, 0xd125]);
        assert_eq!(m.registers.v(0xf), 0);
        let lit = m.screen.lit_count();
        assert!(lit > 0);
        run(&mut m, &[0xd125]);
        assert_eq!(m.registers.v(0xf), 1);
        assert_eq!(m.screen.lit_count(), 0);
    }

    #[test]
    fn test_draw_wraps_at_right_edge() {
        let mut m = machine();
        m.memory.set_byte(0x300, 0xff);
        run(&mut m, &[0x603c, 0x6100, 0xa300, 0xd011]);
        for x in (60..64).chain(0..4) {
            assert!(m.screen.is_set(x, 0));
        }
        assert_eq!(m.screen.lit_count(), 8);
    }

    #[test]
    #[should_panic]
    fn test_draw_past_end_of_memory_panics() {
        let mut m = machine();
        run(&mut m, &[0xaffe, 0xd005]);
    }

    #[test]
    fn test_key_skips() {
        let mut m = machine();
        run(&mut m, &[0x6407]);
        let pc = m.registers.pc;
        run(&mut m, &[0xe49e]);
        assert_eq!(m.registers.pc, pc);
        run(&mut m, &[0xe4a1]);
        assert_eq!(m.registers.pc, pc + 2);
        m.keyboard.key_down(7);
        run(&mut m, &[0xe49e]);
        assert_eq!(m.registers.pc, pc + 4);
        run(&mut m, &[0xe4a1]);
        assert_eq!(m.registers.pc, pc + 4);
    }

    #[test]
    #[should_panic]
    fn test_key_skip_with_bad_key_panics() {
        let mut m = machine();
        run(&mut m, &[0x6410, 0xe49e]);
    }

    #[test]
    fn test_wait_for_key() {
        let mut m = Machine::with_seed(Box::new(DummyKeys::new(&[0xb, 0x2])), 1);
        run(&mut m, &[0xf30a]);
        assert_eq!(m.registers.v(3), 0xb);
        run(&mut m, &[0xf40a]);
        assert_eq!(m.registers.v(4), 0x2);
        assert!(!m.is_halted());
    }

    #[test]
    fn test_abandoned_key_wait_halts_on_instruction() {
        let mut m = Machine::with_seed(Box::new(DummyKeys::new(&[])), 1);
        m.load(&[0x63, 0x2a, 0xf3, 0x0a]);
        m.step();
        m.step();
        assert!(m.is_halted());
        assert_eq!(m.registers.pc, 0x202);
        assert_eq!(m.registers.v(3), 0x2a);
    }

    #[test]
    fn test_timers() {
        let mut m = machine();
        run(&mut m, &[0x6a3c, 0xfa15, 0xfa18]);
        assert_eq!(m.registers.delay_timer, 0x3c);
        assert_eq!(m.registers.sound_timer, 0x3c);
        m.registers.delay_timer = 0x11;
        run(&mut m, &[0xfb07]);
        assert_eq!(m.registers.v(0xb), 0x11);
    }

    #[test]
    fn test_add_to_index() {
        let mut m = machine();
        run(&mut m, &[0xa0ff, 0x6102, 0xf11e]);
        assert_eq!(m.registers.i, 0x101);
    }

    #[test]
    fn test_font_location() {
        let mut m = machine();
        run(&mut m, &[0x650a, 0xf529]);
        assert_eq!(m.registers.i, 50);
        assert_eq!(m.memory.get_byte(m.registers.i), 0xf0);
    }

    #[test]
    fn test_bcd() {
        let mut m = machine();
        run(&mut m, &[0x619d, 0xa400, 0xf133]);
        assert_eq!(m.memory.get_ro_slice(0x400, 3), &[1, 5, 7]);
        run(&mut m, &[0x6109, 0xf133]);
        assert_eq!(m.memory.get_ro_slice(0x400, 3), &[0, 0, 9]);
    }

    #[test]
    fn test_store_and_load_registers() {
        let mut m = machine();
        for r in 0..16u16 {
            run(&mut m, &[0x6000 | (r << 8) | (0x10 + r)]);
        }
        run(&mut m, &[0xa500, 0xf355]);
        assert_eq!(m.memory.get_ro_slice(0x500, 5), &[0x10, 0x11, 0x12, 0x13, 0]);
        assert_eq!(m.registers.i, 0x500);

        m.memory.write(&[0xaa, 0xbb, 0xcc], 0x600);
        run(&mut m, &[0xa600, 0xf165]);
        assert_eq!(m.registers.v(0), 0xaa);
        assert_eq!(m.registers.v(1), 0xbb);
        assert_eq!(m.registers.v(2), 0x12);
    }

    #[test]
    #[should_panic]
    fn test_store_past_end_of_memory_panics() {
        let mut m = machine();
        run(&mut m, &[0xafff, 0xf155]);
    }
}
