//! CLI enum types for character set, color and backend options.

use clap::ValueEnum;

use crate::ascii;
use crate::config;

/// ASCII character set for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CharacterSet {
    #[default]
    Standard,
    Blocks,
    Minimal,
}

impl From<CharacterSet> for ascii::CharSet {
    fn from(c: CharacterSet) -> Self {
        match c {
            CharacterSet::Standard => ascii::CharSet::Standard,
            CharacterSet::Blocks => ascii::CharSet::Blocks,
            CharacterSet::Minimal => ascii::CharSet::Minimal,
        }
    }
}

/// Color output of rendered grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    #[default]
    None,
    Truecolor,
    Indexed,
}

impl From<ColorChoice> for ascii::ColorMode {
    fn from(c: ColorChoice) -> Self {
        match c {
            ColorChoice::None => ascii::ColorMode::None,
            ColorChoice::Truecolor => ascii::ColorMode::TrueColor,
            ColorChoice::Indexed => ascii::ColorMode::Indexed,
        }
    }
}

/// Collection backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendChoice {
    Memory,
    File,
    Firestore,
}

impl From<BackendChoice> for config::Backend {
    fn from(b: BackendChoice) -> Self {
        match b {
            BackendChoice::Memory => config::Backend::Memory,
            BackendChoice::File => config::Backend::File,
            BackendChoice::Firestore => config::Backend::Firestore,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charset_to_ascii_charset() {
        assert_eq!(
            ascii::CharSet::from(CharacterSet::Standard),
            ascii::CharSet::Standard
        );
        assert_eq!(
            ascii::CharSet::from(CharacterSet::Blocks),
            ascii::CharSet::Blocks
        );
        assert_eq!(
            ascii::CharSet::from(CharacterSet::Minimal),
            ascii::CharSet::Minimal
        );
    }

    #[test]
    fn test_color_choice_to_mode() {
        assert_eq!(ascii::ColorMode::from(ColorChoice::None), ascii::ColorMode::None);
        assert_eq!(
            ascii::ColorMode::from(ColorChoice::Truecolor),
            ascii::ColorMode::TrueColor
        );
        assert_eq!(
            ascii::ColorMode::from(ColorChoice::Indexed),
            ascii::ColorMode::Indexed
        );
    }

    #[test]
    fn test_backend_choice_to_backend() {
        assert_eq!(config::Backend::from(BackendChoice::Memory), config::Backend::Memory);
        assert_eq!(
            config::Backend::from(BackendChoice::Firestore),
            config::Backend::Firestore
        );
    }
}
