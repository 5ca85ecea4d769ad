use ratatui::style::Color;

pub struct Theme {
    pub fg: Color,
    pub primary: Color,   // Blue
    pub secondary: Color, // Orange
    pub comment: Color,   // Grey
    pub success: Color,   // Green
    pub error: Color,     // Red
    pub border_focused: Color,
    pub border_normal: Color,
    pub current_line_bg: Color,
    pub register: Color,  // Yellow for register names
    pub flash: Color,     // Element touched by the last step
    pub bold: Color,      // Element held in emphasis
    pub address: Color,   // Cyan for memory addresses
}

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    primary: Color::Rgb(137, 180, 250),   // Blue
    secondary: Color::Rgb(250, 179, 135), // Orange
    comment: Color::Rgb(108, 112, 134),
    success: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),
    border_focused: Color::Rgb(249, 226, 175), // Yellow border for focus
    border_normal: Color::Rgb(108, 112, 134),  // Grey border for normal
    current_line_bg: Color::Rgb(50, 50, 70),   // Slightly lighter BG for status bar
    register: Color::Rgb(249, 226, 175),
    flash: Color::Rgb(250, 179, 135),
    bold: Color::Rgb(245, 194, 231),
    address: Color::Rgb(148, 226, 213),
};
