//! Commentary pane: the running narration of notification steps

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
    Frame,
};

/// Render the commentary pane
pub fn render_commentary_pane(
    frame: &mut Frame,
    area: Rect,
    lines: &[String],
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Commentary ")
        .borders(Borders::ALL)
        .border_style(border_style);

    if lines.is_empty() {
        let paragraph = Paragraph::new("(waiting for the interpreter)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let block = block.padding(Padding::new(1, 0, 0, 0));
    let total_items = lines.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders, min 1

    // Clamp scroll offset only if content exceeds visible area
    if total_items > visible_height {
        let max_scroll = total_items - visible_height;
        *scroll_offset = (*scroll_offset).min(max_scroll);
    } else {
        *scroll_offset = 0;
    }

    // The newest line is the one the last step produced
    let visible_items: Vec<ListItem> = lines
        .iter()
        .enumerate()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|(i, line)| {
            let style = if i + 1 == total_items {
                Style::default()
                    .fg(DEFAULT_THEME.primary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.fg)
            };
            ListItem::new(line.as_str()).style(style)
        })
        .collect();

    let list = List::new(visible_items).block(block);
    frame.render_widget(list, area);
}
