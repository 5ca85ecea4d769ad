//! Memory grid pane
//!
//! Memory is drawn ten cells per row, each row labelled with its zero-padded
//! row number and each cell showing its value as three decimal digits. Cells
//! touched by the last step are highlighted, and the view follows them.

use super::registers::emphasis_style;
use crate::display::{format_cell, Element, MachineView};
use crate::machine::MEMORY_ROW_WIDTH;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Scroll state for the memory pane
#[derive(Debug, Default)]
pub struct MemoryScrollState {
    /// First visible row
    pub offset: usize,
    /// Row followed on the previous frame, so manual scrolling is not undone
    pub followed_row: Option<usize>,
}

fn header_line() -> Line<'static> {
    let mut spans = vec![Span::raw("     ")];
    for col in 0..MEMORY_ROW_WIDTH {
        spans.push(Span::styled(
            format!("{:>3} ", col),
            Style::default()
                .fg(DEFAULT_THEME.address)
                .add_modifier(Modifier::BOLD),
        ));
    }
    Line::from(spans)
}

fn row_line(view: &MachineView, row: usize) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("{:03}  ", row),
        Style::default()
            .fg(DEFAULT_THEME.address)
            .add_modifier(Modifier::BOLD),
    )];
    let start = row * MEMORY_ROW_WIDTH;
    let end = (start + MEMORY_ROW_WIDTH).min(view.memory().len());
    for address in start..end {
        spans.push(Span::styled(
            format_cell(view.memory()[address]),
            emphasis_style(view, Element::Memory(address)),
        ));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

/// Render the memory pane
pub fn render_memory_pane(
    frame: &mut Frame,
    area: Rect,
    view: &MachineView,
    is_focused: bool,
    scroll_state: &mut MemoryScrollState,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let total_rows = view.memory().len().div_ceil(MEMORY_ROW_WIDTH);
    let block = Block::default()
        .title(format!(" Memory ({} bytes) ", view.memory().len()))
        .borders(Borders::ALL)
        .border_style(border_style);

    // Borders and the header row
    let visible_rows = area.height.saturating_sub(3).max(1) as usize;

    // Follow the cells the last step touched, once per step
    let touched_row = view.first_flashing_address().map(|a| a / MEMORY_ROW_WIDTH);
    if let Some(row) = touched_row.filter(|r| Some(*r) != scroll_state.followed_row) {
        if row < scroll_state.offset || row >= scroll_state.offset + visible_rows {
            scroll_state.offset = row.saturating_sub(visible_rows / 2);
        }
    }
    scroll_state.followed_row = touched_row;

    let max_offset = total_rows.saturating_sub(visible_rows);
    scroll_state.offset = scroll_state.offset.min(max_offset);

    let mut lines = Vec::with_capacity(visible_rows + 1);
    lines.push(header_line());
    lines.extend(
        (scroll_state.offset..total_rows)
            .take(visible_rows)
            .map(|row| row_line(view, row)),
    );

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}
