use ratatui::style::{Color, Modifier, Style};

use crate::forecast::ForecastResult;

pub(crate) const HEADER_BG: Color = Color::Rgb(30, 30, 46);
pub(crate) const HEADER_FG: Color = Color::Rgb(205, 214, 244);
pub(crate) const ACCENT: Color = Color::Rgb(137, 180, 250);
pub(crate) const GREEN: Color = Color::Rgb(166, 227, 161);
pub(crate) const RED: Color = Color::Rgb(243, 139, 168);
pub(crate) const YELLOW: Color = Color::Rgb(249, 226, 175);
pub(crate) const PEACH: Color = Color::Rgb(250, 179, 135);
pub(crate) const SURFACE: Color = Color::Rgb(49, 50, 68);
pub(crate) const TEXT: Color = Color::Rgb(205, 214, 244);
pub(crate) const TEXT_DIM: Color = Color::Rgb(127, 132, 156);
pub(crate) const OVERLAY: Color = Color::Rgb(69, 71, 90);
pub(crate) const COMMAND_BG: Color = Color::Rgb(24, 24, 37);

/// Colors cycled through for category bars.
pub(crate) const CATEGORY_COLORS: [Color; 6] = [ACCENT, GREEN, YELLOW, PEACH, RED, TEXT_DIM];

pub(crate) fn header_style() -> Style {
    Style::default()
        .fg(HEADER_FG)
        .bg(HEADER_BG)
        .add_modifier(Modifier::BOLD)
}

pub(crate) fn selected_style() -> Style {
    Style::default().fg(HEADER_BG).bg(ACCENT)
}

pub(crate) fn normal_style() -> Style {
    Style::default().fg(TEXT)
}

pub(crate) fn dim_style() -> Style {
    Style::default().fg(TEXT_DIM)
}

pub(crate) fn on_track_style() -> Style {
    Style::default().fg(GREEN)
}

pub(crate) fn over_budget_style() -> Style {
    Style::default().fg(RED)
}

pub(crate) fn warning_style() -> Style {
    Style::default().fg(YELLOW)
}

pub(crate) fn alt_row_style() -> Style {
    Style::default().fg(TEXT).bg(SURFACE)
}

pub(crate) fn command_bar_style() -> Style {
    Style::default().fg(TEXT).bg(COMMAND_BG)
}

pub(crate) fn status_bar_style() -> Style {
    Style::default().fg(TEXT_DIM).bg(SURFACE)
}

/// Gauge color for a usage ratio: green below 80%, yellow up to the limit.
pub(crate) fn ratio_color(ratio: f64, over: bool) -> Color {
    if over {
        RED
    } else if ratio >= 0.8 {
        YELLOW
    } else {
        GREEN
    }
}

pub(crate) fn forecast_style(result: &ForecastResult) -> Style {
    match result {
        ForecastResult::Ok { .. } => Style::default().fg(ACCENT),
        ForecastResult::InsufficientData { .. } => warning_style(),
        ForecastResult::NoData => dim_style(),
        ForecastResult::Error { .. } => over_budget_style(),
    }
}
