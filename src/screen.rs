/// display width in pixels
pub const SCREEN_WIDTH: usize = 64;

/// display height in pixels
pub const SCREEN_HEIGHT: usize = 32;

/// Monochrome pixel grid. The interpreter only ever XORs sprites onto it;
/// renderers poll `is_set` to find out what to draw.
pub struct Screen {
    pixels: [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT],
}

impl Screen {
    pub fn new() -> Self {
        Screen {
            pixels: [[false; SCREEN_WIDTH]; SCREEN_HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.pixels = [[false; SCREEN_WIDTH]; SCREEN_HEIGHT];
    }

    pub fn set_pixel(&mut self, x: usize, y: usize) {
        check_bounds(x, y);
        self.pixels[y][x] = true;
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        check_bounds(x, y);
        self.pixels[y][x]
    }

    /// XOR `sprite` onto the screen with its top left corner at (x, y); one
    /// byte per row, msb leftmost. Pixels that fall off an edge wrap round to
    /// the opposite one. Returns true if any lit pixel got switched off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (row, bits) in sprite.iter().enumerate() {
            for col in 0..8 {
                if bits & (0x80 >> col) == 0 {
                    continue;
                }
                let px = &mut self.pixels[(y + row) % SCREEN_HEIGHT][(x + col) % SCREEN_WIDTH];
                collision |= *px;
                *px ^= true;
            }
        }
        collision
    }

    /// number of lit pixels
    pub fn lit_count(&self) -> usize {
        self.pixels.iter().flatten().filter(|p| **p).count()
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

fn check_bounds(x: usize, y: usize) {
    assert!(
        x < SCREEN_WIDTH && y < SCREEN_HEIGHT,
        "pixel ({}, {}) is off the {}x{} screen",
        x,
        y,
        SCREEN_WIDTH,
        SCREEN_HEIGHT
    );
}
