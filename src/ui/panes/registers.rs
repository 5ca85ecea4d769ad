//! Register and comparison flag pane

use crate::display::{Element, MachineView};
use crate::machine::{Flag, Register};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Style for a value, reflecting the emphasis the display model gives it
pub(crate) fn emphasis_style(view: &MachineView, element: Element) -> Style {
    if view.is_flashing(element) {
        Style::default()
            .fg(DEFAULT_THEME.flash)
            .add_modifier(Modifier::BOLD)
    } else if view.is_bold(element) {
        Style::default()
            .fg(DEFAULT_THEME.bold)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.fg)
    }
}

fn register_line(view: &MachineView, register: Register) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{:>4} ", register.name()),
            Style::default().fg(DEFAULT_THEME.register),
        ),
        Span::styled(
            view.register(register).to_string(),
            emphasis_style(view, Element::Register(register)),
        ),
    ])
}

/// Render the register pane: fetch-cycle registers, general registers, flags
pub fn render_registers_pane(frame: &mut Frame, area: Rect, view: &MachineView, is_focused: bool) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Registers ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default()
                .fg(DEFAULT_THEME.comment)
                .add_modifier(Modifier::ITALIC),
        ))
    };

    let mut lines = vec![heading("control")];
    lines.extend(Register::CONTROL.iter().map(|r| register_line(view, *r)));
    lines.push(Line::raw(""));
    lines.push(heading("general"));
    lines.extend(Register::GENERAL.iter().map(|r| register_line(view, *r)));
    lines.push(Line::raw(""));
    lines.push(heading("compare"));

    let mut flags = Vec::new();
    for flag in Flag::ALL {
        flags.push(Span::styled(
            format!(" {}=", flag.code()),
            Style::default().fg(DEFAULT_THEME.register),
        ));
        let active = view.flag(flag) == "1";
        flags.push(Span::styled(
            view.flag(flag).to_string(),
            if active {
                Style::default()
                    .fg(DEFAULT_THEME.success)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.fg)
            },
        ));
    }
    lines.push(Line::from(flags));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
