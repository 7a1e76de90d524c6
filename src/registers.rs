use crate::memory::PROGRAM_ADDR;

/// number of general purpose registers, V0-VF
pub const REGISTER_COUNT: usize = 16;

/// return addresses the stack can hold
pub const STACK_DEPTH: usize = 16;

/// Fixed-depth return address stack. Running off either end is fatal;
/// there's nothing a CHIP-8 program could do to recover.
pub struct Stack {
    entries: [u16; STACK_DEPTH],
    sp: u8,
}

impl Stack {
    pub fn new() -> Self {
        Stack {
            entries: [0; STACK_DEPTH],
            sp: 0,
        }
    }

    pub fn push(&mut self, value: u16) {
        assert!(
            (self.sp as usize) < STACK_DEPTH,
            "stack overflow: {} return addresses already pushed",
            STACK_DEPTH
        );
        self.entries[self.sp as usize] = value;
        self.sp += 1;
    }

    pub fn pop(&mut self) -> u16 {
        assert!(self.sp > 0, "stack underflow: return with nothing on the stack");
        self.sp -= 1;
        self.entries[self.sp as usize]
    }

    pub fn sp(&self) -> u8 {
        self.sp
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

/// CHIP-8 register file. Arithmetic on these wraps at the register width.
pub struct Registers {
    v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: Stack,
}

impl Registers {
    pub fn new() -> Self {
        Registers {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_ADDR,
            delay_timer: 0,
            sound_timer: 0,
            stack: Stack::new(),
        }
    }

    /// read Vx
    pub fn v(&self, x: usize) -> u8 {
        check_register(x);
        self.v[x]
    }

    /// write Vx
    pub fn set_v(&mut self, x: usize, value: u8) {
        check_register(x);
        self.v[x] = value;
    }

    /// VF doubles as the carry/borrow/collision flag
    pub fn set_flag(&mut self, set: bool) {
        self.v[0xf] = set as u8;
    }

    pub fn sp(&self) -> u8 {
        self.stack.sp()
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

fn check_register(x: usize) {
    assert!(x < REGISTER_COUNT, "no such register V{:X}", x);
}
