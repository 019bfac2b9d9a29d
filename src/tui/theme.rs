// color palettes for the chat ui

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeKind {
    Night,
    Day,
    Desert,
    Gulf,
}

impl ThemeKind {
    const ORDER: [ThemeKind; 4] = [Self::Night, Self::Day, Self::Desert, Self::Gulf];

    pub fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|&k| k == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Night => "night",
            Self::Day => "day",
            Self::Desert => "desert",
            Self::Gulf => "gulf",
        }
    }
}

/// Day on bright terminals, night otherwise (or when the terminal won't say).
pub fn detect_theme() -> ThemeKind {
    match terminal_light::luma() {
        Ok(luma) if luma > 0.6 => ThemeKind::Day,
        _ => ThemeKind::Night,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub accent: Color,
    pub user: Color,
    pub border: Color,
    pub selection: Color,
    pub error: Color,
    pub success: Color,
    pub warning: Color,
    pub muted: Color,
}

// indigo to cyan, like the web app's gradient
const NIGHT: Theme = Theme {
    bg: Color::Rgb(15, 12, 41),
    fg: Color::Rgb(224, 224, 255),
    accent: Color::Rgb(0, 198, 255),
    user: Color::Rgb(0, 114, 255),
    border: Color::Rgb(60, 60, 90),
    selection: Color::Rgb(42, 42, 74),
    error: Color::Rgb(255, 107, 107),
    success: Color::Rgb(92, 230, 160),
    warning: Color::Rgb(255, 200, 100),
    muted: Color::Rgb(150, 150, 220),
};

const DAY: Theme = Theme {
    bg: Color::Rgb(248, 249, 252),
    fg: Color::Rgb(28, 30, 44),
    accent: Color::Rgb(0, 110, 196),
    user: Color::Rgb(48, 63, 159),
    border: Color::Rgb(196, 200, 214),
    selection: Color::Rgb(226, 236, 252),
    error: Color::Rgb(192, 48, 48),
    success: Color::Rgb(36, 140, 76),
    warning: Color::Rgb(190, 130, 20),
    muted: Color::Rgb(128, 132, 150),
};

// sand and terracotta
const DESERT: Theme = Theme {
    bg: Color::Rgb(43, 33, 24),
    fg: Color::Rgb(242, 228, 205),
    accent: Color::Rgb(232, 160, 76),
    user: Color::Rgb(214, 112, 76),
    border: Color::Rgb(96, 76, 56),
    selection: Color::Rgb(82, 62, 44),
    error: Color::Rgb(230, 90, 80),
    success: Color::Rgb(168, 196, 110),
    warning: Color::Rgb(240, 200, 90),
    muted: Color::Rgb(170, 146, 116),
};

// sea green and marina blue
const GULF: Theme = Theme {
    bg: Color::Rgb(10, 34, 44),
    fg: Color::Rgb(220, 240, 244),
    accent: Color::Rgb(64, 200, 190),
    user: Color::Rgb(110, 170, 240),
    border: Color::Rgb(40, 78, 92),
    selection: Color::Rgb(26, 64, 78),
    error: Color::Rgb(240, 110, 110),
    success: Color::Rgb(120, 220, 150),
    warning: Color::Rgb(244, 204, 120),
    muted: Color::Rgb(110, 150, 160),
};

impl Theme {
    pub fn from_kind(kind: ThemeKind) -> Self {
        match kind {
            ThemeKind::Night => NIGHT,
            ThemeKind::Day => DAY,
            ThemeKind::Desert => DESERT,
            ThemeKind::Gulf => GULF,
        }
    }

    fn fg_style(color: Color) -> Style {
        Style::new().fg(color)
    }

    pub fn base(&self) -> Style {
        Style::new().fg(self.fg).bg(self.bg)
    }

    pub fn accent(&self) -> Style {
        Self::fg_style(self.accent)
    }

    pub fn user(&self) -> Style {
        Self::fg_style(self.user).add_modifier(Modifier::BOLD)
    }

    pub fn border(&self) -> Style {
        Self::fg_style(self.border)
    }

    pub fn focused_border(&self) -> Style {
        Self::fg_style(self.accent)
    }

    pub fn selected(&self) -> Style {
        Style::new().bg(self.selection).add_modifier(Modifier::BOLD)
    }

    pub fn error(&self) -> Style {
        Self::fg_style(self.error)
    }

    pub fn success(&self) -> Style {
        Self::fg_style(self.success)
    }

    pub fn warning(&self) -> Style {
        Self::fg_style(self.warning)
    }

    pub fn muted(&self) -> Style {
        Self::fg_style(self.muted)
    }

    pub fn title(&self) -> Style {
        Self::fg_style(self.accent).add_modifier(Modifier::BOLD)
    }
}
