use ratatui::style::{Color, Modifier, Style};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Rgb(142, 192, 124))
    .add_modifier(Modifier::BOLD);
pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(131, 165, 152))
    .fg(Color::Black)
    .add_modifier(Modifier::BOLD);
pub const DIM_STYLE: Style = Style::new().fg(Color::Rgb(146, 131, 116));
pub const ALERT_STYLE: Style = Style::new()
    .fg(Color::Rgb(254, 128, 25))
    .add_modifier(Modifier::BOLD);
pub const MARKED_STYLE: Style = Style::new().fg(Color::Rgb(250, 189, 47));
pub const HIT_STYLE: Style = Style::new()
    .fg(Color::Rgb(214, 93, 14))
    .add_modifier(Modifier::BOLD);

pub fn log_kind_color(kind: &str) -> Color {
    match kind.to_lowercase().as_str() {
        "error" => Color::Rgb(214, 93, 14),
        "warning" => Color::Rgb(250, 189, 47),
        "info" => Color::Rgb(131, 165, 152),
        _ => Color::Rgb(168, 153, 132),
    }
}

pub fn connection_color(connected: bool) -> Color {
    if connected {
        Color::Rgb(184, 187, 38)
    } else {
        Color::Rgb(146, 131, 116)
    }
}

pub mod icons {
    pub const EXPANDED: &str = "v";
    pub const COLLAPSED: &str = ">";
    pub const MARKED: &str = "*";
    pub const DELETING: &str = "x";
    pub const HIT: &str = "!";
}
