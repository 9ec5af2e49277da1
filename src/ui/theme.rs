use std::fs;

use ratatui::style::Color;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};

#[derive(Embed)]
#[folder = "assets/themes/"]
struct ThemeAssets;

pub const DEFAULT_THEME: &str = "light";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThemeColors {
    pub bg: String,
    pub fg: String,
    pub text_correct: String,
    pub text_corrected: String,
    pub text_corrected_bg: String,
    pub text_incorrect: String,
    pub text_incorrect_bg: String,
    pub text_pending: String,
    pub text_cursor_bg: String,
    pub text_cursor_fg: String,
    pub accent: String,
    pub accent_dim: String,
    pub border: String,
    pub border_focused: String,
    pub header_bg: String,
    pub header_fg: String,
    pub bar_filled: String,
    pub bar_empty: String,
    pub error: String,
    pub warning: String,
    pub success: String,
}

impl Theme {
    pub fn load(name: &str) -> Option<Self> {
        // Try user themes dir
        if let Some(config_dir) = dirs::config_dir() {
            let user_theme_path = config_dir.join("bandr").join("themes").join(format!("{name}.toml"));
            if let Ok(content) = fs::read_to_string(&user_theme_path) {
                if let Ok(theme) = toml::from_str::<Theme>(&content) {
                    return Some(theme);
                }
            }
        }

        // Try bundled themes
        let filename = format!("{name}.toml");
        let file = ThemeAssets::get(&filename)?;
        let content = std::str::from_utf8(file.data.as_ref()).ok()?;
        toml::from_str::<Theme>(content).ok()
    }

    pub fn available_themes() -> Vec<String> {
        let mut names: Vec<String> = ThemeAssets::iter()
            .filter_map(|f| f.strip_suffix(".toml").map(|n| n.to_string()))
            .collect();
        names.sort();
        names
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::load(DEFAULT_THEME).unwrap_or_else(|| Self {
            name: DEFAULT_THEME.to_string(),
            colors: ThemeColors::default(),
        })
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            bg: "#ffffff".to_string(),
            fg: "#334155".to_string(),
            text_correct: "#334155".to_string(),
            text_corrected: "#b45309".to_string(),
            text_corrected_bg: "#fef3c7".to_string(),
            text_incorrect: "#e11d48".to_string(),
            text_incorrect_bg: "#ffe4e6".to_string(),
            text_pending: "#cbd5e1".to_string(),
            text_cursor_bg: "#2563eb".to_string(),
            text_cursor_fg: "#ffffff".to_string(),
            accent: "#4f46e5".to_string(),
            accent_dim: "#e0e7ff".to_string(),
            border: "#e2e8f0".to_string(),
            border_focused: "#6366f1".to_string(),
            header_bg: "#f1f5f9".to_string(),
            header_fg: "#0f172a".to_string(),
            bar_filled: "#6366f1".to_string(),
            bar_empty: "#e2e8f0".to_string(),
            error: "#e11d48".to_string(),
            warning: "#d97706".to_string(),
            success: "#059669".to_string(),
        }
    }
}

impl ThemeColors {
    pub fn parse_color(hex: &str) -> Color {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6 && hex.is_ascii() {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Color::Rgb(r, g, b);
            }
        }
        Color::Reset
    }

    pub fn bg(&self) -> Color { Self::parse_color(&self.bg) }
    pub fn fg(&self) -> Color { Self::parse_color(&self.fg) }
    pub fn text_correct(&self) -> Color { Self::parse_color(&self.text_correct) }
    pub fn text_corrected(&self) -> Color { Self::parse_color(&self.text_corrected) }
    pub fn text_corrected_bg(&self) -> Color { Self::parse_color(&self.text_corrected_bg) }
    pub fn text_incorrect(&self) -> Color { Self::parse_color(&self.text_incorrect) }
    pub fn text_incorrect_bg(&self) -> Color { Self::parse_color(&self.text_incorrect_bg) }
    pub fn text_pending(&self) -> Color { Self::parse_color(&self.text_pending) }
    pub fn text_cursor_bg(&self) -> Color { Self::parse_color(&self.text_cursor_bg) }
    pub fn text_cursor_fg(&self) -> Color { Self::parse_color(&self.text_cursor_fg) }
    pub fn accent(&self) -> Color { Self::parse_color(&self.accent) }
    pub fn accent_dim(&self) -> Color { Self::parse_color(&self.accent_dim) }
    pub fn border(&self) -> Color { Self::parse_color(&self.border) }
    pub fn border_focused(&self) -> Color { Self::parse_color(&self.border_focused) }
    pub fn header_bg(&self) -> Color { Self::parse_color(&self.header_bg) }
    pub fn header_fg(&self) -> Color { Self::parse_color(&self.header_fg) }
    pub fn bar_filled(&self) -> Color { Self::parse_color(&self.bar_filled) }
    pub fn bar_empty(&self) -> Color { Self::parse_color(&self.bar_empty) }
    pub fn error(&self) -> Color { Self::parse_color(&self.error) }
    pub fn warning(&self) -> Color { Self::parse_color(&self.warning) }
    pub fn success(&self) -> Color { Self::parse_color(&self.success) }
}

/// Active theme, owned by the app and passed to widgets by reference.
pub struct ThemeContext {
    theme: Theme,
}

impl ThemeContext {
    /// Starts from `name`, falling back to the light theme when it is unknown.
    pub fn new(name: &str) -> Self {
        Self {
            theme: Theme::load(name).unwrap_or_default(),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn name(&self) -> &str {
        &self.theme.name
    }

    /// Flip between the bundled light and dark themes.
    pub fn toggle(&mut self) {
        let next = if self.theme.name == "dark" { "light" } else { "dark" };
        if let Some(theme) = Theme::load(next) {
            self.theme = theme;
        }
    }
}

impl Default for ThemeContext {
    fn default() -> Self {
        Self::new(DEFAULT_THEME)
    }
}
