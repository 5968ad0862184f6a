//! Geometry and input types shared by the robot, the finders and the toolkit boundary

use crate::errors::RobotError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A point in screen (or scene) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis-aligned rectangle given by its minimum corner and its size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(min_x: f64, min_y: f64, width: f64, height: f64) -> Self {
        Self {
            min_x,
            min_y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f64 {
        self.min_x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.min_y + self.height
    }

    /// A rectangle with a negative extent covers nothing.
    pub fn is_empty(&self) -> bool {
        self.width < 0.0 || self.height < 0.0
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.min_x + dx, self.min_y + dy, self.width, self.height)
    }

    /// Edge-inclusive overlap test, so a node touching the border of its
    /// scene still counts as on-screen.
    pub fn intersects(&self, other: &Bounds) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        !(self.max_x() < other.min_x
            || self.max_y() < other.min_y
            || self.min_x > other.max_x()
            || self.min_y > other.max_y())
    }

    pub fn contains(&self, point: Point) -> bool {
        !self.is_empty()
            && point.x >= self.min_x
            && point.x <= self.max_x()
            && point.y >= self.min_y
            && point.y <= self.max_y()
    }

    /// The point of this rectangle selected by `pos`.
    pub fn point_at(&self, pos: Pos) -> Point {
        let (fx, fy) = pos.factors();
        Point::new(self.min_x + self.width * fx, self.min_y + self.height * fy)
    }
}

/// Anchor inside a bounded region used when a region is turned into a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Pos {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    #[default]
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Pos {
    /// Horizontal and vertical fractions of the region's extent.
    fn factors(self) -> (f64, f64) {
        match self {
            Pos::TopLeft => (0.0, 0.0),
            Pos::TopCenter => (0.5, 0.0),
            Pos::TopRight => (1.0, 0.0),
            Pos::CenterLeft => (0.0, 0.5),
            Pos::Center => (0.5, 0.5),
            Pos::CenterRight => (1.0, 0.5),
            Pos::BottomLeft => (0.0, 1.0),
            Pos::BottomCenter => (0.5, 1.0),
            Pos::BottomRight => (1.0, 1.0),
        }
    }
}

impl FromStr for Pos {
    type Err = RobotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "topleft" => Ok(Pos::TopLeft),
            "topcenter" => Ok(Pos::TopCenter),
            "topright" => Ok(Pos::TopRight),
            "centerleft" => Ok(Pos::CenterLeft),
            "center" => Ok(Pos::Center),
            "centerright" => Ok(Pos::CenterRight),
            "bottomleft" => Ok(Pos::BottomLeft),
            "bottomcenter" => Ok(Pos::BottomCenter),
            "bottomright" => Ok(Pos::BottomRight),
            _ => Err(RobotError::InvalidArgument(format!(
                "Unknown position: \"{s}\""
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MouseButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerticalDirection {
    Up,
    Down,
}

/// Physical keys the robot knows how to press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyCode {
    Shift,
    Control,
    Alt,
    Meta,
    Enter,
    Tab,
    Space,
    BackSpace,
    Delete,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Minus,
    Equals,
    OpenBracket,
    CloseBracket,
    BackSlash,
    Semicolon,
    Quote,
    BackQuote,
    Comma,
    Period,
    Slash,
}

const LETTERS: [KeyCode; 26] = [
    KeyCode::A,
    KeyCode::B,
    KeyCode::C,
    KeyCode::D,
    KeyCode::E,
    KeyCode::F,
    KeyCode::G,
    KeyCode::H,
    KeyCode::I,
    KeyCode::J,
    KeyCode::K,
    KeyCode::L,
    KeyCode::M,
    KeyCode::N,
    KeyCode::O,
    KeyCode::P,
    KeyCode::Q,
    KeyCode::R,
    KeyCode::S,
    KeyCode::T,
    KeyCode::U,
    KeyCode::V,
    KeyCode::W,
    KeyCode::X,
    KeyCode::Y,
    KeyCode::Z,
];

const DIGITS: [KeyCode; 10] = [
    KeyCode::Digit0,
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

const FUNCTION_KEYS: [KeyCode; 12] = [
    KeyCode::F1,
    KeyCode::F2,
    KeyCode::F3,
    KeyCode::F4,
    KeyCode::F5,
    KeyCode::F6,
    KeyCode::F7,
    KeyCode::F8,
    KeyCode::F9,
    KeyCode::F10,
    KeyCode::F11,
    KeyCode::F12,
];

impl KeyCode {
    /// Key for an ASCII letter, ignoring case.
    pub fn letter(c: char) -> Option<KeyCode> {
        if c.is_ascii_alphabetic() {
            let index = (c.to_ascii_lowercase() as u8 - b'a') as usize;
            LETTERS.get(index).copied()
        } else {
            None
        }
    }

    /// Key on the number row for an ASCII digit.
    pub fn digit(c: char) -> Option<KeyCode> {
        c.to_digit(10).and_then(|d| DIGITS.get(d as usize).copied())
    }

    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            KeyCode::Shift | KeyCode::Control | KeyCode::Alt | KeyCode::Meta
        )
    }
}

impl FromStr for KeyCode {
    type Err = RobotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(key) = KeyCode::letter(c).or_else(|| KeyCode::digit(c)) {
                return Ok(key);
            }
        }

        let lower = trimmed.to_lowercase();
        if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<usize>().ok()) {
            if (1..=12).contains(&n) {
                return Ok(FUNCTION_KEYS[n - 1]);
            }
        }

        let key = match lower.as_str() {
            "shift" => KeyCode::Shift,
            "ctrl" | "control" => KeyCode::Control,
            "alt" | "option" => KeyCode::Alt,
            "meta" | "cmd" | "command" | "super" | "win" => KeyCode::Meta,
            "enter" | "return" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "space" => KeyCode::Space,
            "backspace" | "back_space" => KeyCode::BackSpace,
            "delete" | "del" => KeyCode::Delete,
            "escape" | "esc" => KeyCode::Escape,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "page_up" => KeyCode::PageUp,
            "pagedown" | "page_down" => KeyCode::PageDown,
            "insert" => KeyCode::Insert,
            "-" | "minus" => KeyCode::Minus,
            "=" | "equals" => KeyCode::Equals,
            "[" | "openbracket" => KeyCode::OpenBracket,
            "]" | "closebracket" => KeyCode::CloseBracket,
            "\\" | "backslash" => KeyCode::BackSlash,
            ";" | "semicolon" => KeyCode::Semicolon,
            "'" | "quote" => KeyCode::Quote,
            "`" | "backquote" => KeyCode::BackQuote,
            "," | "comma" => KeyCode::Comma,
            "." | "period" => KeyCode::Period,
            "/" | "slash" => KeyCode::Slash,
            _ => {
                return Err(RobotError::InvalidArgument(format!(
                    "Unknown key name: \"{s}\""
                )))
            }
        };
        Ok(key)
    }
}

/// A key chord: modifiers held down in order, then the main key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCombination {
    pub modifiers: Vec<KeyCode>,
    pub key: KeyCode,
}

impl KeyCombination {
    pub fn new(key: KeyCode) -> Self {
        Self {
            modifiers: Vec::new(),
            key,
        }
    }

    pub fn with_modifier(mut self, modifier: KeyCode) -> Self {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
        self
    }

    /// Keys in press order: modifiers first, main key last.
    pub fn keys(&self) -> Vec<KeyCode> {
        let mut keys = self.modifiers.clone();
        keys.push(self.key);
        keys
    }
}

impl FromStr for KeyCombination {
    type Err = RobotError;

    /// Parses strings such as `"Ctrl+Shift+A"`. The plus key itself has no
    /// name here; spell it as `"Shift+Equals"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('+').map(str::trim).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(RobotError::InvalidArgument(format!(
                "Invalid key combination: \"{s}\""
            )));
        }
        let (last, modifiers) = parts.split_last().ok_or_else(|| {
            RobotError::InvalidArgument(format!("Empty key combination: \"{s}\""))
        })?;
        let mut combination = KeyCombination::new(last.parse()?);
        for modifier in modifiers {
            combination = combination.with_modifier(modifier.parse()?);
        }
        Ok(combination)
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.keys().iter().map(|k| format!("{k:?}")).collect();
        write!(f, "{}", names.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_at_anchors() {
        let bounds = Bounds::new(10.0, 10.0, 100.0, 50.0);
        assert_eq!(bounds.point_at(Pos::Center), Point::new(60.0, 35.0));
        assert_eq!(bounds.point_at(Pos::TopLeft), Point::new(10.0, 10.0));
        assert_eq!(bounds.point_at(Pos::BottomRight), Point::new(110.0, 60.0));
        assert_eq!(bounds.point_at(Pos::CenterRight), Point::new(110.0, 35.0));
    }

    #[test]
    fn test_intersects_is_edge_inclusive() {
        let scene = Bounds::new(0.0, 0.0, 400.0, 200.0);
        assert!(Bounds::new(400.0, 0.0, 10.0, 10.0).intersects(&scene));
        assert!(!Bounds::new(401.0, 0.0, 10.0, 10.0).intersects(&scene));
        assert!(!Bounds::new(-20.0, -20.0, 10.0, 10.0).intersects(&scene));
        assert!(!Bounds::new(0.0, 0.0, -1.0, 10.0).intersects(&scene));
    }

    #[test]
    fn test_parse_key_names() {
        assert_eq!("ctrl".parse::<KeyCode>().unwrap(), KeyCode::Control);
        assert_eq!("a".parse::<KeyCode>().unwrap(), KeyCode::A);
        assert_eq!("F11".parse::<KeyCode>().unwrap(), KeyCode::F11);
        assert_eq!("7".parse::<KeyCode>().unwrap(), KeyCode::Digit7);
        assert!("hyper".parse::<KeyCode>().is_err());
        assert!("F13".parse::<KeyCode>().is_err());
    }

    #[test]
    fn test_parse_key_combination_keeps_modifier_order() {
        let combination: KeyCombination = "Ctrl+Shift+A".parse().unwrap();
        assert_eq!(combination.modifiers, vec![KeyCode::Control, KeyCode::Shift]);
        assert_eq!(combination.key, KeyCode::A);
        assert_eq!(
            combination.keys(),
            vec![KeyCode::Control, KeyCode::Shift, KeyCode::A]
        );
        assert!("Ctrl+".parse::<KeyCombination>().is_err());
    }

    #[test]
    fn test_parse_pos() {
        assert_eq!("top-left".parse::<Pos>().unwrap(), Pos::TopLeft);
        assert_eq!("BOTTOM_CENTER".parse::<Pos>().unwrap(), Pos::BottomCenter);
        assert!("middle".parse::<Pos>().is_err());
    }
}
