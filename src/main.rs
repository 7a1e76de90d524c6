use std::error::Error;
use std::fs::File;
use std::num::NonZeroU32;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use chip8vm::display::MonoTermDisplay;
use chip8vm::driver::{Config, Driver};
use chip8vm::input::{TerminalInput, TerminalKeys};
use chip8vm::keyboard::{CONVENTIONAL_KEYMAP, KEY_COUNT, LITERAL_KEYMAP};
use chip8vm::machine::Machine;
use chip8vm::sound::{Mute, SimpleBeep, Sound};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Keymap {
    /// keys 0-9 and a-f
    Literal,
    /// 1234/qwer/asdf/zxcv, laid out like the COSMAC VIP pad
    Conventional,
}

impl Keymap {
    fn table(self) -> [char; KEY_COUNT] {
        match self {
            Keymap::Literal => LITERAL_KEYMAP,
            Keymap::Conventional => CONVENTIONAL_KEYMAP,
        }
    }
}

/// CHIP-8 interpreter for the terminal
#[derive(Parser, Debug)]
#[command(name = "chip8vm", about = "Run a CHIP-8 program in the terminal", long_about = None)]
struct Args {
    /// Path to the program image
    rom: PathBuf,

    /// Instructions per second
    #[arg(long, default_value_t = 700, value_parser = clap::value_parser!(u32).range(1..))]
    hz: u32,

    /// Which keys stand for the hex pad
    #[arg(long, value_enum, default_value_t = Keymap::Literal)]
    keymap: Keymap,

    /// Don't beep
    #[arg(long)]
    mute: bool,

    /// Seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many instructions
    #[arg(long)]
    cycles: Option<u64>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    // load the program before touching the terminal, so errors are readable
    let keys = Box::new(TerminalKeys);
    let mut machine = match args.seed {
        Some(seed) => Machine::with_seed(keys, seed),
        None => Machine::new(keys),
    };
    let mut f = File::open(&args.rom)
        .map_err(|e| format!("can't open {}: {}", args.rom.display(), e))?;
    machine
        .memory
        .load_program(&mut f)
        .map_err(|e| format!("can't load {}: {}", args.rom.display(), e))?;
    machine.keyboard.set_map(args.keymap.table());

    let mut input = TerminalInput::new()?;
    let mut display = MonoTermDisplay::new()?;
    let mut sound: Box<dyn Sound> = if args.mute {
        Box::new(Mute::new())
    } else {
        Box::new(SimpleBeep::new())
    };
    let config = Config {
        cycles_per_second: NonZeroU32::new(args.hz).ok_or("--hz must be at least 1")?,
        max_cycles: args.cycles,
        ..Config::default()
    };

    let mut driver = Driver::new(machine, &mut display, &mut input, sound.as_mut(), config);
    let result = driver.run();
    drop(driver);
    if sound.is_beeping() {
        sound.stop()?;
    }
    drop(input);

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..4 {
        println!();
    }
    result.map(|_| ())
}
