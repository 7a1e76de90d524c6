use std::io;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// how much RAM we have
pub const MEMORY_SIZE_BYTES: usize = 4096;

/// where the program is loaded, and where the program counter starts
pub const PROGRAM_ADDR: u16 = 0x0200;

/// largest program image that fits between the load offset and the top of RAM
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE_BYTES - PROGRAM_ADDR as usize;

/// rows per built-in glyph; Fx29 multiplies by this to find a digit
pub const FONT_GLYPH_HEIGHT: u8 = 5;

/// Byte-level access to an address space. Implementors only hand out
/// bounds-checked slices; everything else is built on top of those.
pub trait MemoryMap {
    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> &mut [u8];

    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8];

    fn get_byte(&self, addr: u16) -> u8 {
        self.get_ro_slice(addr, 1)[0]
    }

    fn set_byte(&mut self, addr: u16, value: u8) {
        self.get_rw_slice(addr, 1)[0] = value;
    }

    /// get a two-byte big-endian word (instructions)
    fn get_word(&self, addr: u16) -> u16 {
        let word = self.get_ro_slice(addr, 2);
        ((word[0] as u16) << 8) | (word[1] as u16)
    }

    /// write a chunk of bytes into "RAM"
    fn write(&mut self, data: &[u8], addr: u16) {
        self.get_rw_slice(addr, data.len()).copy_from_slice(data);
    }
}

/// The 4K CHIP-8 address space:
///   0x0000-0x004f  built-in font (16 glyphs, 5 bytes each)
///   0x0050-0x01ff  reserved for the interpreter
///   0x0200-0x0fff  program
pub struct Memory {
    bytes: Box<[u8]>,
}

impl MemoryMap for Memory {
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> &mut [u8] {
        let a = check_range(addr, len);
        &mut self.bytes[a..(a + len)]
    }

    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8] {
        let a = check_range(addr, len);
        &self.bytes[a..(a + len)]
    }
}

fn check_range(addr: u16, len: usize) -> usize {
    let a = addr as usize;
    assert!(
        a + len <= MEMORY_SIZE_BYTES,
        "memory access of {} byte(s) at 0x{:04x} is outside the 0x{:04x}-byte address space",
        len,
        addr,
        MEMORY_SIZE_BYTES
    );
    a
}

impl Memory {
    /// zeroed RAM with the font baked in at 0x000
    pub fn new() -> Self {
        let mut m = Memory {
            bytes: vec![0u8; MEMORY_SIZE_BYTES].into_boxed_slice(),
        };
        m.write(&FONT, FONT_ADDR);
        m
    }

    /// copy a program image to 0x200. an image that doesn't fit is fatal;
    /// use `load_program` where the image comes from outside
    pub fn load(&mut self, program: &[u8]) {
        assert!(
            program.len() <= MAX_PROGRAM_SIZE,
            "program of {} bytes exceeds the {} bytes available at 0x{:04x}",
            program.len(),
            MAX_PROGRAM_SIZE,
            PROGRAM_ADDR
        );
        self.write(program, PROGRAM_ADDR);
    }

    /// read a whole program image and load it, reporting oversized images
    /// as `InvalidData` rather than aborting
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<(), io::Error> {
        let mut buf = Vec::new();
        let len = reader.read_to_end(&mut buf)?;
        if len > MAX_PROGRAM_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "program is {} bytes but at most {} bytes fit in memory",
                    len, MAX_PROGRAM_SIZE
                ),
            ));
        }
        log::info!("loading {} byte program at 0x{:04x}", len, PROGRAM_ADDR);
        self.load(&buf);
        Ok(())
    }

    /// `n` sprite rows starting at `addr`
    pub fn sprite(&self, addr: u16, n: usize) -> &[u8] {
        self.get_ro_slice(addr, n)
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

const FONT_ADDR: u16 = 0x000;
const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
