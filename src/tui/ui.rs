//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::{MachineStatus, Reg};
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    // Left side: code, registers and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(7),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_code(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: memory and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_help(frame, right_chunks[1]);
}

/// Draw decoded instructions around the PC.
fn draw_code(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let code = app.get_code_view((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = code
        .iter()
        .map(|(addr, text, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let line = format!("{} {}{:04X}: {}", bp, prefix, addr, text);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(line).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(format!(" {} ", app.image().name))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw the register file, PC and machine status.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let machine = &app.session.machine;

    let mut content: Vec<Line> = (0..4)
        .map(|i| {
            let (left, right) = (Reg::ALL[i], Reg::ALL[i + 4]);
            Line::from(vec![
                register_span(left, machine.regs.get(left)),
                Span::raw("   "),
                register_span(right, machine.regs.get(right)),
            ])
        })
        .collect();

    content.push(Line::from(vec![
        Span::raw("PC: "),
        Span::styled(format!("{:04X}", machine.pc), Style::default().fg(Color::Yellow)),
        Span::raw("   Steps: "),
        Span::styled(format!("{}", machine.steps()), Style::default().fg(Color::Cyan)),
        Span::raw("   State: "),
        Span::styled(format!("{:?}", machine.status()), status_style(machine.status())),
    ]));

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

fn register_span(reg: Reg, value: u16) -> Span<'static> {
    let style = if value == 0 {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };
    Span::styled(format!("{}: {:04X} {:>6}", reg, value, value as i16), style)
}

/// Draw memory view, eight words per line.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let machine = &app.session.machine;
    let visible_rows = (area.height as usize).saturating_sub(2);
    let start = app.mem_scroll;
    let end = (start + visible_rows).min(super::app::MEMORY_LINES);

    let items: Vec<ListItem> = (start..end)
        .map(|line| {
            let base = line * 16;
            let words = machine.mem.dump(base, base + 16);
            let pc = machine.pc as usize;
            let has_pc = (base..base + 16).contains(&pc);

            let text = words
                .iter()
                .fold(format!("{:04X}:", base), |acc, (_, w)| format!("{} {:04X}", acc, w));

            let style = if has_pc {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if words.iter().any(|&(_, w)| w != 0) {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓: Scroll memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

/// Color for the machine status.
fn status_style(status: MachineStatus) -> Style {
    match status {
        MachineStatus::Running => Style::default().fg(Color::Green),
        MachineStatus::Halted => Style::default().fg(Color::Gray),
        MachineStatus::Faulted(_) => Style::default().fg(Color::Red),
    }
}
