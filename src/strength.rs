//! Password strength meter for the add-user form.

use regex::Regex;
use std::sync::OnceLock;

const LABELS: [&str; 5] = ["Very Weak", "Weak", "Medium", "Strong", "Very Strong"];
const COLORS: [[u8; 3]; 5] = [
    [0xcc, 0x00, 0x00],
    [0xee, 0x99, 0x00],
    [0xd9, 0xd9, 0x00],
    [0x00, 0xcc, 0x00],
    [0x00, 0x99, 0x00],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strength {
    pub score: u8,
}

impl Strength {
    pub fn label(&self) -> &'static str {
        LABELS[self.score as usize]
    }

    pub fn rgb(&self) -> [u8; 3] {
        COLORS[self.score as usize]
    }
}

fn character_classes() -> &'static [Regex] {
    static CLASSES: OnceLock<Vec<Regex>> = OnceLock::new();
    CLASSES.get_or_init(|| {
        [r"[A-Z]", r"[0-9]", r"[^A-Za-z0-9]"]
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// One point each for length >= 8, an uppercase letter, a digit and a symbol.
pub fn score(password: &str) -> Strength {
    let mut score = u8::from(password.chars().count() >= 8);
    score += character_classes()
        .iter()
        .filter(|re| re.is_match(password))
        .count() as u8;
    Strength { score }
}
