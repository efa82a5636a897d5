//! Visual themes for rendered replies.
//!
//! A theme is a base skin plus optional element colours. It is either a built-in
//! ("dark", "light", "notty") or a JSON file such as
//! `{ "base": "light", "heading": "#c6a0f6", "code": "160" }`.

use serde::Deserialize;
use termimad::crossterm::style::Color as TermColor;
use termimad::MadSkin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Gray,
    DarkGray,
    Indexed(u8),
    Rgb(u8, u8, u8),
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let name = s.trim().to_ascii_lowercase();
        let color = match name.as_str() {
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "magenta" => Color::Magenta,
            "cyan" => Color::Cyan,
            "white" => Color::White,
            "gray" | "grey" => Color::Gray,
            "darkgray" | "darkgrey" => Color::DarkGray,
            hex if hex.starts_with('#') && hex.len() == 7 && hex.is_ascii() => {
                let channel = |i: usize| {
                    u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| format!("invalid color {:?}", s))
                };
                Color::Rgb(channel(1)?, channel(3)?, channel(5)?)
            }
            n => n
                .parse::<u8>()
                .map(Color::Indexed)
                .map_err(|_| format!("invalid color {:?}", s))?,
        };
        Ok(color)
    }
}

impl From<Color> for TermColor {
    fn from(color: Color) -> Self {
        match color {
            Color::Black => TermColor::Black,
            Color::Red => TermColor::Red,
            Color::Green => TermColor::Green,
            Color::Yellow => TermColor::Yellow,
            Color::Blue => TermColor::Blue,
            Color::Magenta => TermColor::Magenta,
            Color::Cyan => TermColor::Cyan,
            Color::White => TermColor::White,
            Color::Gray => TermColor::Grey,
            Color::DarkGray => TermColor::DarkGrey,
            Color::Indexed(n) => TermColor::AnsiValue(n),
            Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
        }
    }
}

/// Starting skin the element colours are layered on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Base {
    #[default]
    Dark,
    Light,
    /// No colours or attributes.
    NoTty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    pub base: Base,
    pub heading: Option<Color>,
    pub strong: Option<Color>,
    pub emphasis: Option<Color>,
    pub code: Option<Color>,
    pub code_block: Option<Color>,
    pub link: Option<Color>,
    pub quote: Option<Color>,
    pub list_marker: Option<Color>,
    pub rule: Option<Color>,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("reading theme {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing theme {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Theme {
    pub fn dark() -> Self {
        Theme {
            base: Base::Dark,
            heading: Some(Color::Indexed(141)),
            code: Some(Color::Indexed(203)),
            code_block: Some(Color::Indexed(250)),
            link: Some(Color::Indexed(117)),
            quote: Some(Color::Indexed(245)),
            list_marker: Some(Color::Indexed(141)),
            rule: Some(Color::Indexed(240)),
            ..Theme::default()
        }
    }

    pub fn light() -> Self {
        Theme {
            base: Base::Light,
            heading: Some(Color::Indexed(91)),
            code: Some(Color::Indexed(160)),
            code_block: Some(Color::Indexed(238)),
            link: Some(Color::Indexed(25)),
            quote: Some(Color::Indexed(242)),
            list_marker: Some(Color::Indexed(91)),
            rule: Some(Color::Indexed(250)),
            ..Theme::default()
        }
    }

    pub fn notty() -> Self {
        Theme {
            base: Base::NoTty,
            ..Theme::default()
        }
    }

    /// Resolve a theme setting. None means the default dark theme; anything that
    /// is not a built-in name is read as a path to a JSON theme file.
    pub fn load(setting: Option<&str>) -> Result<Theme, RenderError> {
        let Some(setting) = setting.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Theme::dark());
        };
        match setting.to_ascii_lowercase().as_str() {
            "dark" | "auto" => return Ok(Theme::dark()),
            "light" => return Ok(Theme::light()),
            "notty" | "ascii" | "plain" => return Ok(Theme::notty()),
            _ => {}
        }
        let s = std::fs::read_to_string(setting).map_err(|source| RenderError::Read {
            path: setting.to_string(),
            source,
        })?;
        serde_json::from_str(&s).map_err(|source| RenderError::Parse {
            path: setting.to_string(),
            source,
        })
    }

    /// termimad skin for ANSI output.
    pub fn skin(&self) -> MadSkin {
        let mut skin = match self.base {
            Base::Dark => MadSkin::default_dark(),
            Base::Light => MadSkin::default_light(),
            Base::NoTty => return MadSkin::no_style(),
        };
        if let Some(c) = self.heading {
            skin.set_headers_fg(c.into());
        }
        if let Some(c) = self.strong {
            skin.bold.set_fg(c.into());
        }
        if let Some(c) = self.emphasis {
            skin.italic.set_fg(c.into());
        }
        if let Some(c) = self.code {
            skin.inline_code.set_fg(c.into());
        }
        if let Some(c) = self.code_block {
            skin.code_block.set_fg(c.into());
        }
        if let Some(c) = self.quote {
            skin.quote_mark.set_fg(c.into());
        }
        if let Some(c) = self.list_marker {
            skin.bullet.set_fg(c.into());
        }
        if let Some(c) = self.rule {
            skin.horizontal_rule.set_fg(c.into());
        }
        skin
    }
}
