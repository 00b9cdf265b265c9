use colored::Color;
use once_cell::sync::Lazy;

/// Console color theme
pub struct ColorTheme {
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub highlight: Color,
    pub muted: Color,
    pub primary: Color,
    pub secondary: Color,
    pub key: Color,
    pub value: Color,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: Color::Green,
            error: Color::Red,
            warning: Color::Yellow,
            highlight: Color::Cyan,
            muted: Color::BrightBlack,
            primary: Color::BrightBlue,
            secondary: Color::Magenta,
            key: Color::BrightCyan,
            value: Color::White,
        }
    }
}

/// Global theme instance
pub static THEME: Lazy<ColorTheme> = Lazy::new(ColorTheme::default);

/// Markers printed in front of console lines
pub struct Icons {
    pub success: &'static str,
    pub error: &'static str,
    pub warning: &'static str,
    pub arrow: &'static str,
    pub launch: &'static str,
    pub friendship: &'static str,
    pub post: &'static str,
    pub search: &'static str,
    pub realtime: &'static str,
    pub live: &'static str,
    pub globe: &'static str,
    pub done: &'static str,
}

pub const ICONS: Icons = Icons {
    success: "✅",
    error: "✗",
    warning: "⚠",
    arrow: "→",
    launch: "🚀",
    friendship: "🤝",
    post: "📝",
    search: "🔍",
    realtime: "⚡",
    live: "📡",
    globe: "🌍",
    done: "🎉",
};
