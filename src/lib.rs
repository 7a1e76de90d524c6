//!
//! ## Design
//!
//! * the core is a `Machine` (memory, registers and stack, screen, keyboard)
//!   plus a stateless interpreter that executes one instruction against it
//! * the driver owns the cycle loop: fetch, advance PC, execute; timers and
//!   frames run off a separate 60Hz clock
//! * abstract display so can plug alternatives; starting with TUI in-console
//! * input device, with trait for reading key-presses, and a separate
//!   blocking key source for Fx0A so the core doesn't know about terminals
//! * audio device, with trait for making beeps
//!
//! Model
//!
//! main
//!  |-- display, input, sound, config
//!  |-- machine(key source, random source)
//!  |    |-- memory (font at 0x000, program at 0x200)
//!  |    |-- registers + stack
//!  |    |-- screen
//!  |    `-- keyboard
//!  `-- driver(machine, display, input, sound, config)
//!       |-- every cycle: machine.step() -> interpreter::execute()
//!       `-- every 1/60s: pump keys -> keyboard, tick timers, draw screen
pub mod display;
pub mod driver;
pub mod input;
pub mod interpreter;
pub mod keyboard;
pub mod machine;
pub mod memory;
pub mod registers;
pub mod screen;
pub mod sound;
