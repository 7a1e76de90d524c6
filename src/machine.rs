use crate::interpreter;
use crate::keyboard::{KeySource, Keyboard};
use crate::memory::{Memory, MemoryMap, PROGRAM_ADDR};
use crate::registers::Registers;
use crate::screen::Screen;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Everything the interpreter can see or touch. The parts are created
/// together here and live exactly as long as the machine.
pub struct Machine {
    pub memory: Memory,
    pub registers: Registers,
    pub screen: Screen,
    pub keyboard: Keyboard,
    pub(crate) rng: StdRng,
    pub(crate) keys: Box<dyn KeySource>,
    pub(crate) halted: bool,
}

impl Machine {
    /// fresh machine with its random source seeded once from the OS
    pub fn new(keys: Box<dyn KeySource>) -> Self {
        Self::with_rng(keys, StdRng::from_entropy())
    }

    /// fresh machine with a repeatable random source
    pub fn with_seed(keys: Box<dyn KeySource>, seed: u64) -> Self {
        Self::with_rng(keys, StdRng::seed_from_u64(seed))
    }

    fn with_rng(keys: Box<dyn KeySource>, rng: StdRng) -> Self {
        Machine {
            memory: Memory::new(),
            registers: Registers::new(),
            screen: Screen::new(),
            keyboard: Keyboard::new(),
            rng,
            keys,
            halted: false,
        }
    }

    /// load a program image and point the program counter at it
    pub fn load(&mut self, program: &[u8]) {
        self.memory.load(program);
        self.registers.pc = PROGRAM_ADDR;
    }

    /// read the instruction at PC and move PC past it
    pub fn fetch(&mut self) -> u16 {
        let instruction = self.memory.get_word(self.registers.pc);
        self.registers.pc = self.registers.pc.wrapping_add(2);
        instruction
    }

    /// true once a key wait was abandoned; PC is left on the Fx0A
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// fetch, advance, execute
    pub fn step(&mut self) {
        let instruction = self.fetch();
        interpreter::execute(self, instruction);
    }
}
