use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Held directional keys. Player one drives with WASD, player two with the arrows.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InputFlags: u8 {
        const W = 1 << 0;
        const A = 1 << 1;
        const S = 1 << 2;
        const D = 1 << 3;
        const UP = 1 << 4;
        const DOWN = 1 << 5;
        const LEFT = 1 << 6;
        const RIGHT = 1 << 7;
    }
}

/// Wire form of [`InputFlags`]: every flag is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub w: bool,
    pub a: bool,
    pub s: bool,
    pub d: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl From<InputFlags> for InputState {
    fn from(flags: InputFlags) -> Self {
        Self {
            w: flags.contains(InputFlags::W),
            a: flags.contains(InputFlags::A),
            s: flags.contains(InputFlags::S),
            d: flags.contains(InputFlags::D),
            up: flags.contains(InputFlags::UP),
            down: flags.contains(InputFlags::DOWN),
            left: flags.contains(InputFlags::LEFT),
            right: flags.contains(InputFlags::RIGHT),
        }
    }
}

impl From<InputState> for InputFlags {
    fn from(state: InputState) -> Self {
        let mut flags = InputFlags::empty();
        flags.set(InputFlags::W, state.w);
        flags.set(InputFlags::A, state.a);
        flags.set(InputFlags::S, state.s);
        flags.set(InputFlags::D, state.d);
        flags.set(InputFlags::UP, state.up);
        flags.set(InputFlags::DOWN, state.down);
        flags.set(InputFlags::LEFT, state.left);
        flags.set(InputFlags::RIGHT, state.right);
        flags
    }
}
