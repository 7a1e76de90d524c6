use std::collections::VecDeque;

/// keys on the hex pad
pub const KEY_COUNT: usize = 16;

/// physical key for each virtual key, where '1' => 0x01 and 'a' => 0x0a
pub const LITERAL_KEYMAP: [char; KEY_COUNT] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
];

/// ditto using left-hand side of qwerty keyboard, laid out like the COSMAC
/// VIP pad:
///   1 2 3 C      1 2 3 4
///   4 5 6 D  =>  q w e r
///   7 8 9 E      a s d f
///   A 0 B F      z x c v
pub const CONVENTIONAL_KEYMAP: [char; KEY_COUNT] = [
    'x', // 0
    '1', // 1
    '2', // 2
    '3', // 3
    'q', // 4
    'w', // 5
    'e', // 6
    'a', // 7
    's', // 8
    'd', // 9
    'z', // a
    'c', // b
    '4', // c
    'r', // d
    'f', // e
    'v', // f
];

/// The 16-key pad: which virtual keys are held, and which physical key
/// stands for each of them.
pub struct Keyboard {
    keys: [bool; KEY_COUNT],
    keymap: [char; KEY_COUNT],
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard {
            keys: [false; KEY_COUNT],
            keymap: LITERAL_KEYMAP,
        }
    }

    pub fn set_map(&mut self, keymap: [char; KEY_COUNT]) {
        self.keymap = keymap;
    }

    /// virtual key for a physical one; `None` if it isn't on the pad
    pub fn map(&self, code: char) -> Option<u8> {
        self.keymap.iter().position(|k| *k == code).map(|i| i as u8)
    }

    pub fn key_down(&mut self, key: u8) {
        self.keys[check_key(key)] = true;
    }

    pub fn key_up(&mut self, key: u8) {
        self.keys[check_key(key)] = false;
    }

    pub fn is_down(&self, key: u8) -> bool {
        self.keys[check_key(key)]
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

fn check_key(key: u8) -> usize {
    assert!((key as usize) < KEY_COUNT, "0x{:02x} is not a key on the pad", key);
    key as usize
}

/// Something that can stop the world until a key is pressed (Fx0A). There's
/// no timeout: if nobody presses anything, this never returns.
pub trait KeySource {
    /// block until a mapped key goes down and return its virtual index, or
    /// `None` if the user gave up on the program instead
    fn wait_for_key(&mut self, keyboard: &Keyboard) -> Option<u8>;
}

/// dummy KeySource for testing; hands out a fixed list of virtual keys, then
/// gives up
pub struct DummyKeys {
    keys: VecDeque<u8>,
}

impl DummyKeys {
    pub fn new(keys: &[u8]) -> Self {
        DummyKeys {
            keys: keys.iter().copied().collect(),
        }
    }
}

impl KeySource for DummyKeys {
    fn wait_for_key(&mut self, _keyboard: &Keyboard) -> Option<u8> {
        self.keys.pop_front()
    }
}
