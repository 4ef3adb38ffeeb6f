//! NES controller input handling.
//!
//! Implements the standard controller shift register protocol: write 1 then 0 to $4016 to latch
//! the buttons, then read $4016/$4017 repeatedly to get one bit per read (A, B, Select, Start,
//! Up, Down, Left, Right). Button state comes from a [`ButtonSource`] sampled on the latch.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    /// Shift-out order; the index is the bit position in the latched byte.
    pub const ALL: [Button; 8] = [
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
    ];
}

/// Polled for each button when the controller latches.
pub trait ButtonSource {
    fn is_pressed(&mut self, button: Button) -> bool;
}

impl<F: FnMut(Button) -> bool> ButtonSource for F {
    fn is_pressed(&mut self, button: Button) -> bool {
        self(button)
    }
}

/// A single standard controller on $4016 or $4017.
#[derive(Default)]
pub struct Controller {
    source: Option<Box<dyn ButtonSource>>,
    strobe: bool,
    /// Shift register: latched on strobe fall, shifted out LSB-first on read.
    shift: u8,
}

impl Controller {
    /// Create a controller with nothing plugged into it.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, source: impl ButtonSource + 'static) {
        self.source = Some(Box::new(source));
    }

    fn poll(&mut self) -> u8 {
        let Some(source) = self.source.as_mut() else {
            return 0;
        };
        Button::ALL
            .iter()
            .enumerate()
            .filter(|&(_, &button)| source.is_pressed(button))
            .fold(0, |state, (bit, _)| state | 1 << bit)
    }

    /// Read one button from the shift register, OR'd with open bus ($40).
    /// After eight reads the register returns 1s.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            self.shift = self.poll();
        }
        let bit = self.shift & 1;
        self.shift = (self.shift >> 1) | 0x80;
        bit | 0x40
    }

    /// Write to $4016. The buttons are latched when bit 0 falls from 1 to 0.
    pub fn write(&mut self, data: u8) {
        let strobe = data & 1 != 0;
        if self.strobe && !strobe {
            self.shift = self.poll();
        }
        self.strobe = strobe;
    }
}
