//! Lane colors.

use md5::{Digest, Md5};
use std::fmt;

const NAMED: &[(&str, Rgb)] = &[
    ("black", Rgb(0, 0, 0)),
    ("white", Rgb(0xff, 0xff, 0xff)),
    ("darkred", Rgb(0x7f, 0, 0)),
    ("darkgreen", Rgb(0, 0x7f, 0)),
    ("darkblue", Rgb(0, 0, 0x7f)),
    ("red", Rgb(0xdf, 0, 0)),
    ("green", Rgb(0, 0xdf, 0)),
    ("blue", Rgb(0, 0, 0xdf)),
    ("gray", Rgb(0x7f, 0x7f, 0x7f)),
    ("orange", Rgb(0xff, 0x9f, 0)),
];

/// An RGB color, displayed as `rgb(r,g,b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Derive a pastel color from a branch name.
    ///
    /// Each channel is `128 + 14 * k` with `k` in `0..10`, taken from the
    /// first three characters of the name's hex MD5 digest, so the same
    /// name always gets the same color as in the Trac revtree plugin.
    pub fn from_name(name: &str) -> Self {
        let digest = format!("{:x}", Md5::digest(name.as_bytes()));
        let bytes = digest.as_bytes();
        let channel = |i: usize| 128 + 14 * (bytes[i] % 10);
        Rgb(channel(0), channel(1), channel(2))
    }

    /// Parse `#rrggbb`, `#rgb`, or one of a few color names.
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(hex) = s.strip_prefix('#') {
            let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
            let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            return match hex.len() {
                6 => Some(Rgb(byte(0)?, byte(2)?, byte(4)?)),
                3 => Some(Rgb(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17)),
                _ => None,
            };
        }
        NAMED
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, color)| *color)
    }

    /// Darken by `0.7^k`, truncating each channel.
    pub fn darker(self, k: f64) -> Self {
        let f = 0.7_f64.powf(k);
        let scale = |c: u8| (f * c as f64) as u8;
        Rgb(scale(self.0), scale(self.1), scale(self.2))
    }
}

impl std::str::FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::parse(s).ok_or_else(|| format!("invalid color {:?}", s))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.0, self.1, self.2)
    }
}
