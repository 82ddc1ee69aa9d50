//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Number of block colours a theme carries.
pub const PALETTE_LEN: u8 = 6;

/// Scene and UI colours.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Block colours: light red, light blue, light green, yellow, orange, purple.
    pub blocks: [Color; PALETTE_LEN as usize],
    /// Background above the ground.
    pub sky: Color,
    pub ground: Color,
    /// Sidebar / popup background.
    pub panel_bg: Color,
    /// Borders.
    pub div_line: Color,
    /// Text (score, height).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Hints and secondary text.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

/// Parse a hex literal that is known to be valid.
fn hex(s: &str) -> Color {
    parse_hex(s).unwrap_or(Color::Reset)
}

impl Theme {
    /// Bright arcade defaults: sky blue over brown earth.
    pub fn classic() -> Self {
        Self {
            blocks: [
                hex("#FF6464"),
                hex("#6464FF"),
                hex("#64FF64"),
                hex("#FFFF64"),
                hex("#FF9664"),
                hex("#C864FF"),
            ],
            sky: hex("#87CEEB"),
            ground: hex("#654321"),
            panel_bg: hex("#31353F"),
            div_line: hex("#3F444F"),
            main_fg: hex("#ABB2BF"),
            title: hex("#FFD700"),
            inactive_fg: hex("#646464"),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to the classic colours if path is None or the file is missing.
    /// `palette` then selects the block colour variant.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            Some(p) => {
                log::warn!("theme file {} not found, using defaults", p.display());
                return Ok(Self::default_for_palette(palette));
            }
            None => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::classic();
        t.apply_palette(palette);
        t
    }

    /// Override block colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.blocks = [
                    hex("#FF0000"),
                    hex("#0044FF"),
                    hex("#00FF00"),
                    hex("#FFFF00"),
                    hex("#FF00FF"),
                    hex("#00FFFF"),
                ];
            }
            crate::Palette::Colorblind => {
                // Tol's bright scheme: distinguishable without red/green.
                self.blocks = [
                    hex("#0077BB"),
                    hex("#EE7733"),
                    hex("#009988"),
                    hex("#CC3311"),
                    hex("#EE3377"),
                    hex("#BBBB00"),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let base = Self::classic();
        let mut blocks = base.blocks;
        for (i, slot) in blocks.iter_mut().enumerate() {
            if let Some(c) = get(format!("block{i}").as_str()) {
                *slot = c;
            }
        }
        Self {
            blocks,
            sky: get("sky").or_else(|| get("main_bg")).unwrap_or(base.sky),
            ground: get("ground").unwrap_or(base.ground),
            panel_bg: get("meter_bg").unwrap_or(base.panel_bg),
            div_line: get("div_line").unwrap_or(base.div_line),
            main_fg: get("main_fg").unwrap_or(base.main_fg),
            title: get("title").unwrap_or(base.title),
            inactive_fg: get("inactive_fg").unwrap_or(base.inactive_fg),
        }
    }

    /// Block colour for a palette index; wraps out-of-range indices.
    #[inline]
    pub fn block_color(&self, index: u8) -> Color {
        self.blocks[(index % PALETTE_LEN) as usize]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let channel = |digits: &str| {
        u8::from_str_radix(digits, 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 if s.is_ascii() => (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?),
        3 if s.is_ascii() => (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        ),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}
