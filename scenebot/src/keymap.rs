//! Character to key-stroke mapping for a US keyboard layout

use crate::types::{KeyCode, KeyCombination};

/// Keys to push to produce `character`, or `None` when the layout has no
/// key for it (the robot then falls back to `Toolkit::input_char`).
pub fn key_strokes_for(character: char) -> Option<KeyCombination> {
    if let Some(key) = KeyCode::letter(character) {
        let combination = KeyCombination::new(key);
        return Some(if character.is_ascii_uppercase() {
            combination.with_modifier(KeyCode::Shift)
        } else {
            combination
        });
    }
    if let Some(key) = KeyCode::digit(character) {
        return Some(KeyCombination::new(key));
    }

    let plain = |key| Some(KeyCombination::new(key));
    let shifted = |key| Some(KeyCombination::new(key).with_modifier(KeyCode::Shift));

    match character {
        ' ' => plain(KeyCode::Space),
        '\n' | '\r' => plain(KeyCode::Enter),
        '\t' => plain(KeyCode::Tab),
        '\u{8}' => plain(KeyCode::BackSpace),
        '-' => plain(KeyCode::Minus),
        '=' => plain(KeyCode::Equals),
        '[' => plain(KeyCode::OpenBracket),
        ']' => plain(KeyCode::CloseBracket),
        '\\' => plain(KeyCode::BackSlash),
        ';' => plain(KeyCode::Semicolon),
        '\'' => plain(KeyCode::Quote),
        '`' => plain(KeyCode::BackQuote),
        ',' => plain(KeyCode::Comma),
        '.' => plain(KeyCode::Period),
        '/' => plain(KeyCode::Slash),
        '!' => shifted(KeyCode::Digit1),
        '@' => shifted(KeyCode::Digit2),
        '#' => shifted(KeyCode::Digit3),
        '$' => shifted(KeyCode::Digit4),
        '%' => shifted(KeyCode::Digit5),
        '^' => shifted(KeyCode::Digit6),
        '&' => shifted(KeyCode::Digit7),
        '*' => shifted(KeyCode::Digit8),
        '(' => shifted(KeyCode::Digit9),
        ')' => shifted(KeyCode::Digit0),
        '_' => shifted(KeyCode::Minus),
        '+' => shifted(KeyCode::Equals),
        '{' => shifted(KeyCode::OpenBracket),
        '}' => shifted(KeyCode::CloseBracket),
        '|' => shifted(KeyCode::BackSlash),
        ':' => shifted(KeyCode::Semicolon),
        '"' => shifted(KeyCode::Quote),
        '~' => shifted(KeyCode::BackQuote),
        '<' => shifted(KeyCode::Comma),
        '>' => shifted(KeyCode::Period),
        '?' => shifted(KeyCode::Slash),
        _ => None,
    }
}
