//! The cycle loop around the interpreter: paces instructions, runs the 60Hz
//! timers, feeds keys into the machine and puts frames on the display.
//!
//! Instructions and timer interrupts are clocked separately, so a slow or
//! fast instruction rate doesn't change how quickly the timers count down.
//! A program blocked in Fx0A stalls everything, timers included, so any tone
//! is cut before the wait starts.
use crate::display::Display;
use crate::input::{Input, InputEvent};
use crate::machine::Machine;
use crate::memory::MemoryMap;
use crate::sound::Sound;
use std::error::Error;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};

/// runtime knobs for the driver
#[derive(Clone, Debug)]
pub struct Config {
    /// instructions executed per second
    pub cycles_per_second: NonZeroU32,
    /// timer decrement (and frame) rate
    pub timer_hz: NonZeroU32,
    /// stop after this many instructions
    pub max_cycles: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cycles_per_second: hz(700),
            timer_hz: hz(60),
            max_cycles: None,
        }
    }
}

const fn hz(n: u32) -> NonZeroU32 {
    match NonZeroU32::new(n) {
        Some(rate) => rate,
        None => panic!("rates must be non-zero"),
    }
}

fn period(rate: NonZeroU32) -> Duration {
    Duration::from_secs_f64(1.0 / rate.get() as f64)
}

/// Fx0A
fn is_key_wait(instruction: u16) -> bool {
    instruction & 0xf0ff == 0xf00a
}

pub struct Driver<'a> {
    machine: Machine,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    config: Config,
    tone_until: Option<Instant>,
}

impl<'a> Driver<'a> {
    pub fn new(
        machine: Machine,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
        config: Config,
    ) -> Self {
        Driver {
            machine,
            display,
            input,
            sound,
            config,
            tone_until: None,
        }
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    fn timer_period(&self) -> Duration {
        period(self.config.timer_hz)
    }

    /// run until the user quits or the cycle limit is hit; returns how many
    /// instructions were executed
    pub fn run(&mut self) -> Result<u64, Box<dyn Error>> {
        let cycle_period = period(self.config.cycles_per_second);
        let timer_period = self.timer_period();
        let mut next_interrupt = Instant::now();
        let mut cycles = 0u64;
        log::info!(
            "running at {} instructions/s, timers at {}Hz",
            self.config.cycles_per_second,
            self.config.timer_hz
        );

        loop {
            if self.config.max_cycles.map_or(false, |max| cycles >= max) {
                break;
            }
            let started = Instant::now();
            if started >= next_interrupt {
                if !self.interrupt(started)? {
                    log::info!("quit after {} cycles", cycles);
                    self.silence()?;
                    return Ok(cycles);
                }
                // if we fell behind (e.g. waiting on a key) don't try to catch up
                next_interrupt = started + timer_period;
            }

            if is_key_wait(self.machine.memory.get_word(self.machine.registers.pc)) {
                self.silence()?;
            }
            self.machine.step();
            if self.machine.is_halted() {
                log::info!("quit while waiting for a key after {} cycles", cycles);
                return Ok(cycles);
            }
            cycles += 1;

            spin_sleep::sleep(cycle_period.saturating_sub(started.elapsed()));
        }

        // show where we ended up
        self.silence()?;
        self.display.draw(&self.machine.screen)?;
        log::info!("stopped after {} cycles", cycles);
        Ok(cycles)
    }

    /// the 60Hz interrupt: keys in, timers down, frame out. false means the
    /// user asked to quit
    pub fn interrupt(&mut self, now: Instant) -> Result<bool, Box<dyn Error>> {
        if !self.pump_input()? {
            return Ok(false);
        }
        self.tick_timers(now)?;
        self.display.draw(&self.machine.screen)?;
        Ok(true)
    }

    /// cut any tone that's playing
    fn silence(&mut self) -> Result<(), Box<dyn Error>> {
        self.tone_until = None;
        if self.sound.is_beeping() {
            self.sound.stop()?;
        }
        Ok(())
    }

    fn pump_input(&mut self) -> Result<bool, Box<dyn Error>> {
        for event in self.input.poll_events()? {
            let keyboard = &mut self.machine.keyboard;
            match event {
                InputEvent::KeyDown(code) => match keyboard.map(code) {
                    Some(key) => keyboard.key_down(key),
                    None => log::warn!("can't map {:?} to a CHIP-8 key", code),
                },
                InputEvent::KeyUp(code) => {
                    if let Some(key) = keyboard.map(code) {
                        keyboard.key_up(key);
                    }
                }
                InputEvent::Quit => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Count the delay timer down. A running sound timer turns into a tone
    /// lasting as many timer periods as it held, and is cleared.
    pub fn tick_timers(&mut self, now: Instant) -> Result<(), Box<dyn Error>> {
        let period = self.timer_period();
        let regs = &mut self.machine.registers;
        if regs.delay_timer > 0 {
            regs.delay_timer -= 1;
        }

        if let Some(until) = self.tone_until {
            if now >= until {
                self.sound.stop()?;
                self.tone_until = None;
            }
        }

        if regs.sound_timer > 0 {
            self.tone_until = Some(now + period * regs.sound_timer as u32);
            regs.sound_timer = 0;
            if !self.sound.is_beeping() {
                self.sound.beep()?;
            }
        }
        Ok(())
    }
}
