//! Colour palette for the form, with overrides from the `[theme]` config table

use ratatui::style::Color;

use crate::config::ThemeConfig;

/// Theme colors for the UI
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub accent: Color,       // Focused borders, key hints
    pub danger: Color,       // Invalid URL, clipboard errors
    pub success: Color,      // Copied, the composed URL
    pub text: Color,         // Field values
    pub text_dim: Color,     // Placeholders, labels
    pub inactive: Color,     // Unfocused borders
    pub bg_selected: Color,  // Picker selection
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            inactive: Color::Rgb(88, 91, 112),
            bg_selected: Color::Rgb(69, 71, 90),
        }
    }
}

impl Theme {
    /// Defaults with any valid hex overrides from config applied
    pub fn from_config(config: &ThemeConfig) -> Self {
        let mut theme = Self::default();

        let overrides = [
            (&config.accent, &mut theme.accent, "accent"),
            (&config.danger, &mut theme.danger, "danger"),
            (&config.success, &mut theme.success, "success"),
            (&config.text, &mut theme.text, "text"),
            (&config.text_dim, &mut theme.text_dim, "text_dim"),
            (&config.inactive, &mut theme.inactive, "inactive"),
            (&config.bg_selected, &mut theme.bg_selected, "bg_selected"),
        ];

        for (value, slot, name) in overrides {
            let Some(value) = value else { continue };
            match parse_hex_color(value) {
                Some(color) => *slot = color,
                None => tracing::warn!("Ignoring theme.{}: `{}` is not a hex color", name, value),
            }
        }

        theme
    }
}

/// Parse a hex color string (#RRGGBB or #RGB)
fn parse_hex_color(s: &str) -> Option<Color> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }

    match s.len() {
        6 => {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}
