use std::fmt;

/// Pointer/touch action.
///
/// Wire codes follow the common host convention (down 0, up 1, move 2,
/// cancel 3). Codes not represented here are kept as `Other` so stages can
/// still see them.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PointerAction {
    Down,
    Up,
    Move,
    Cancel,
    Other(i32),
}

impl PointerAction {
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Down,
            1 => Self::Up,
            2 => Self::Move,
            3 => Self::Cancel,
            other => Self::Other(other),
        }
    }

    pub const fn code(self) -> i32 {
        match self {
            Self::Down => 0,
            Self::Up => 1,
            Self::Move => 2,
            Self::Cancel => 3,
            Self::Other(code) => code,
        }
    }

    /// True for actions that end a pointer's gesture.
    pub const fn is_release(self) -> bool {
        matches!(self, Self::Up | Self::Cancel)
    }
}

impl From<i32> for PointerAction {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl fmt::Display for PointerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => f.write_str("down"),
            Self::Up => f.write_str("up"),
            Self::Move => f.write_str("move"),
            Self::Cancel => f.write_str("cancel"),
            Self::Other(code) => write!(f, "action({code})"),
        }
    }
}

/// A single pointer sample in surface pixels (origin top-left).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
    pub action: PointerAction,
    pub pointer_id: i32,

    /// Strictly increasing per engine; used to apply each sample at most once.
    pub seq: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_variants() {
        assert_eq!(PointerAction::from_code(0), PointerAction::Down);
        assert_eq!(PointerAction::from_code(1), PointerAction::Up);
        assert_eq!(PointerAction::from_code(2), PointerAction::Move);
        assert_eq!(PointerAction::from_code(3), PointerAction::Cancel);
    }

    #[test]
    fn unknown_code_is_preserved() {
        let a = PointerAction::from(7);
        assert_eq!(a, PointerAction::Other(7));
        assert_eq!(a.code(), 7);
        assert_eq!(a.to_string(), "action(7)");
    }

    #[test]
    fn codes_round_trip() {
        for code in 0..4 {
            assert_eq!(PointerAction::from_code(code).code(), code);
        }
    }

    #[test]
    fn release_actions() {
        assert!(PointerAction::Up.is_release());
        assert!(PointerAction::Cancel.is_release());
        assert!(!PointerAction::Move.is_release());
    }
}
