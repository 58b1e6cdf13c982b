//! Color themes for docrev.
//!
//! Two built-ins: `dark` (ANSI 16 colors, works everywhere) and
//! `catppuccin-mocha` (RGB, needs truecolor).

use ratatui::style::Color;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub border_active: Color,
    pub border_inactive: Color,

    // Version list
    /// Marker and text of the active version.
    pub version_active: Color,
    /// The protected "Original" entry.
    pub version_original: Color,
    pub version_label: Color,

    // Compare view header
    pub diff_added: Color,
    pub diff_removed: Color,

    // Chat panel
    pub chat_user: Color,
    pub chat_assistant: Color,
    pub chat_system: Color,
    /// Text typed into the chat or a prompt.
    pub input: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_insert: Color,
    /// Error notices shown in the status bar.
    pub status_error: Color,
    /// Spinner shown while a backend call is in flight.
    pub status_busy: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            version_active: Color::Cyan,
            version_original: Color::Yellow,
            version_label: Color::Gray,

            diff_added: Color::Green,
            diff_removed: Color::Red,

            chat_user: Color::Cyan,
            chat_assistant: Color::Green,
            chat_system: Color::DarkGray,
            input: Color::White,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,
            status_error: Color::Red,
            status_busy: Color::Yellow,
        }
    }

    /// Catppuccin Mocha palette (<https://github.com/catppuccin/catppuccin>).
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let blue = Color::Rgb(137, 180, 250); // #89b4fa
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let subtext0 = Color::Rgb(166, 173, 200); // #a6adc8
        let text = Color::Rgb(205, 214, 244); // #cdd6f4
        let peach = Color::Rgb(250, 179, 135); // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            version_active: lavender,
            version_original: peach,
            version_label: subtext0,

            diff_added: green,
            diff_removed: red,

            chat_user: blue,
            chat_assistant: green,
            chat_system: overlay1,
            input: text,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,
            status_error: red,
            status_busy: yellow,
        }
    }

    /// Resolves a theme name from config. Unknown names fall back to `dark`
    /// with a warning in the log.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }
}
