//! UI rendering with Ratatui.

use crate::app::{App, AppState, FormField, InputMode, LoginField};
use equiptrack_core::DisplayColor;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    prelude::*,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};

const DATE_DISPLAY: &str = "%d/%m/%Y";

/// Main render function.
pub fn render(frame: &mut Frame, app: &App) {
    match app.state {
        AppState::Locked => render_locked(frame, app),
        AppState::Unlocked => render_unlocked(frame, app),
        AppState::Quit => {}
    }
}

fn status_color(color: DisplayColor) -> Color {
    let (r, g, b) = color.rgb();
    Color::Rgb(r, g, b)
}

/// Render the login screen.
fn render_locked(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let dialog_area = centered_rect(50, 9, area);

    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .title(" Safety Equipment Control - Sign In ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let field_style = |field: LoginField| {
        if app.login_field == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        }
    };

    let user = Line::from(vec![
        Span::styled("Username: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.username_input.as_str(), field_style(LoginField::Username)),
    ]);
    frame.render_widget(Paragraph::new(user), chunks[0]);

    let masked: String = "*".repeat(app.password_input.chars().count());
    let pass = Line::from(vec![
        Span::styled("Password: ", Style::default().fg(Color::DarkGray)),
        Span::styled(masked, field_style(LoginField::Password)),
    ]);
    frame.render_widget(Paragraph::new(pass), chunks[1]);

    if let Some(ref error) = app.error_message {
        let error_msg = Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red));
        frame.render_widget(error_msg, chunks[2]);
    }

    let help = Paragraph::new("Enter: next/sign in | Tab: switch field | Esc: exit")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[3]);
}

/// Render the record table with the search bar and status line.
fn render_unlocked(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_search_bar(frame, app, chunks[0]);
    render_table(frame, app, chunks[1]);
    render_status_line(frame, app, chunks[2]);

    let help = Paragraph::new(
        "a: add | e: edit | d: delete | /: search | s: save | l: load | q: quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[3]);

    match app.input_mode {
        InputMode::Form => render_form(frame, app, area),
        InputMode::ConfirmDelete => render_confirm(frame, app, area),
        InputMode::LoadPath => render_load_prompt(frame, app, area),
        _ => {}
    }
}

fn render_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.input_mode == InputMode::Search;
    let border_color = if is_focused { Color::Magenta } else { Color::DarkGray };

    let block = Block::default()
        .title(format!(" Search ({} backend) ", app.store.backend()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let mut spans = vec![
        Span::styled("▸ ", Style::default().fg(Color::Magenta)),
        Span::styled(app.search_query.as_str(), Style::default().fg(Color::White)),
    ];
    if is_focused {
        spans.push(Span::styled(
            "_",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::SLOW_BLINK),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.input_mode == InputMode::Normal;
    let border_color = if is_focused { Color::Cyan } else { Color::DarkGray };

    let records = app.visible_records();
    let title = format!(" Equipment ({} of {}) ", records.len(), app.store.len());

    let header = Row::new(
        ["Name", "First Date", "Last Issue Date", "Material", "Quantity", "Status"]
            .into_iter()
            .map(|h| Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))),
    )
    .style(Style::default().fg(Color::Gray));

    let rows: Vec<Row> = records
        .iter()
        .map(|record| {
            Row::new(vec![
                Cell::from(record.name.clone()),
                Cell::from(record.first_issue_date.format(DATE_DISPLAY).to_string()),
                Cell::from(record.last_issue_date.format(DATE_DISPLAY).to_string()),
                Cell::from(record.material.clone()),
                Cell::from(record.quantity.to_string()),
                Cell::from(record.status.label())
                    .style(Style::default().fg(status_color(record.status.color()))),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(26),
        Constraint::Length(12),
        Constraint::Length(16),
        Constraint::Percentage(20),
        Constraint::Length(9),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color)),
        )
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(60, 60, 80))
                .add_modifier(Modifier::BOLD),
        );

    let mut state = TableState::default();
    if !records.is_empty() {
        state.select(Some(app.selected_index));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(ref message) = app.status_message {
        let color = if message.is_error { Color::Red } else { Color::Green };
        let line = Paragraph::new(message.text.as_str()).style(Style::default().fg(color));
        frame.render_widget(line, area);
    }
}

/// Render the add/edit dialog.
fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let dialog_area = centered_rect(60.min(area.width.saturating_sub(4)), 13, area);
    frame.render_widget(Clear, dialog_area);

    let title = if app.form.editing.is_some() {
        " Update Equipment "
    } else {
        " Add Equipment "
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let fields = [
        FormField::Name,
        FormField::Material,
        FormField::Quantity,
        FormField::FirstDate,
        FormField::LastDate,
    ];
    for (i, field) in fields.into_iter().enumerate() {
        let focused = app.form.focus == field;
        let value_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let value = match field {
            FormField::Material => format!("◂ {} ▸", app.form.value(field)),
            _ if focused => format!("{}_", app.form.value(field)),
            _ => app.form.value(field).to_string(),
        };
        let line = Line::from(vec![
            Span::styled(format!("{:>16}: ", field.label()), Style::default().fg(Color::DarkGray)),
            Span::styled(value, value_style),
        ]);
        frame.render_widget(Paragraph::new(line), chunks[i]);
    }

    // Live status preview
    if let Some(preview) = app.form_preview() {
        let line = Line::from(vec![
            Span::styled(format!("{:>16}: ", "Status"), Style::default().fg(Color::DarkGray)),
            Span::styled(
                preview.status.label(),
                Style::default().fg(status_color(preview.color)),
            ),
            Span::styled(
                format!("  (renewal due {})", preview.expires_on.format(DATE_DISPLAY)),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), chunks[6]);
    }

    let help = Paragraph::new("Tab: next field | ←/→: material | Enter: save | Esc: cancel")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[7]);
}

/// Render the delete confirmation.
fn render_confirm(frame: &mut Frame, app: &App, area: Rect) {
    let dialog_area = centered_rect(50.min(area.width.saturating_sub(4)), 5, area);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .title(" Confirm ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let name = app
        .selected_record()
        .map(|r| r.name.as_str())
        .unwrap_or_default();
    let text = Paragraph::new(vec![
        Line::from(format!("Delete {name}?")),
        Line::from(Span::styled("y: yes | n: no", Style::default().fg(Color::DarkGray))),
    ])
    .alignment(Alignment::Center)
    .block(block);
    frame.render_widget(text, dialog_area);
}

/// Render the prompt for the CSV file to load.
fn render_load_prompt(frame: &mut Frame, app: &App, area: Rect) {
    let dialog_area = centered_rect(70.min(area.width.saturating_sub(4)), 5, area);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .title(" Load CSV ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let text = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("File: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{}_", app.load_path),
                Style::default().fg(Color::Yellow),
            ),
        ]),
        Line::from(Span::styled(
            "Enter: load | Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(block);
    frame.render_widget(text, dialog_area);
}

/// Helper to create a centered rectangle.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
