use racer::{ClientMessage, InputFlags, InputState};
use winit::keyboard::{Key, NamedKey};

/// The eight directional controls the server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    W,
    A,
    S,
    D,
    Up,
    Down,
    Left,
    Right,
}

impl Control {
    /// Maps a logical key; letters match regardless of case.
    pub fn from_key(key: &Key) -> Option<Self> {
        match key {
            Key::Named(NamedKey::ArrowUp) => Some(Control::Up),
            Key::Named(NamedKey::ArrowDown) => Some(Control::Down),
            Key::Named(NamedKey::ArrowLeft) => Some(Control::Left),
            Key::Named(NamedKey::ArrowRight) => Some(Control::Right),
            Key::Character(c) => match c.to_lowercase().as_str() {
                "w" => Some(Control::W),
                "a" => Some(Control::A),
                "s" => Some(Control::S),
                "d" => Some(Control::D),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn flag(self) -> InputFlags {
        match self {
            Control::W => InputFlags::W,
            Control::A => InputFlags::A,
            Control::S => InputFlags::S,
            Control::D => InputFlags::D,
            Control::Up => InputFlags::UP,
            Control::Down => InputFlags::DOWN,
            Control::Left => InputFlags::LEFT,
            Control::Right => InputFlags::RIGHT,
        }
    }

    pub fn is_arrow(self) -> bool {
        matches!(
            self,
            Control::Up | Control::Down | Control::Left | Control::Right
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    /// The held state flipped; the full state must be sent.
    pub changed: bool,
    /// The key belongs to the game and must not reach other bindings.
    pub consumed: bool,
}

/// Edge-triggered tracker for the held directional keys.
#[derive(Debug, Default)]
pub struct InputTracker {
    held: InputFlags,
}

impl InputTracker {
    pub fn press(&mut self, control: Control) -> bool {
        self.set(control, true)
    }

    pub fn release(&mut self, control: Control) -> bool {
        self.set(control, false)
    }

    fn set(&mut self, control: Control, pressed: bool) -> bool {
        let flag = control.flag();
        if self.held.contains(flag) == pressed {
            return false;
        }
        self.held.set(flag, pressed);
        true
    }

    pub fn handle_key(&mut self, key: &Key, pressed: bool) -> KeyOutcome {
        let Some(control) = Control::from_key(key) else {
            return KeyOutcome::default();
        };

        let changed = if pressed {
            self.press(control)
        } else {
            self.release(control)
        };

        KeyOutcome {
            changed,
            consumed: control.is_arrow() || changed,
        }
    }

    pub fn flags(&self) -> InputFlags {
        self.held
    }

    pub fn state(&self) -> InputState {
        InputState::from(self.held)
    }

    pub fn message(&self) -> ClientMessage {
        ClientMessage::Input {
            input: self.state(),
        }
    }

    pub fn reset(&mut self) {
        self.held = InputFlags::empty();
    }
}
