use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, Field, Popup, StatusKind};
use crate::theme::Theme;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Install the palette before the first frame; later calls are ignored
pub fn init_theme(theme: Theme) {
    let _ = THEME.set(theme);
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

fn accent() -> Color { theme().accent }
fn danger() -> Color { theme().danger }
fn success() -> Color { theme().success }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn inactive() -> Color { theme().inactive }
fn bg_selected() -> Color { theme().bg_selected }

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Min(10),   // Form + result
            Constraint::Length(1), // Footer
        ])
        .split(area);

    // Stack the panels on narrow terminals
    let direction = if area.width < 90 { Direction::Vertical } else { Direction::Horizontal };
    let body = Layout::default()
        .direction(direction)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    draw_info_line(f, app, chunks[0]);
    draw_form(f, app, body[0]);
    draw_result(f, app, body[1]);
    draw_footer(f, app, chunks[2]);

    // Draw popups on top
    match app.popup {
        Popup::None => {}
        Popup::Suggestions => draw_suggestions(f, app),
        Popup::Help => draw_help_popup(f),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let line = match app.status_message {
        Some(ref status) => {
            let color = match app.status_kind {
                StatusKind::Info => accent(),
                StatusKind::Success => success(),
                StatusKind::Error => danger(),
            };
            Line::from(Span::styled(status.as_str(), Style::default().fg(color)))
        }
        None => Line::from(Span::styled("UTM link builder", Style::default().fg(text_dim()))),
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_form(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Campaign ", Style::default().fg(accent()).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3); 6])
        .split(inner);

    for (field, row) in Field::ALL.into_iter().zip(rows.iter()) {
        draw_field(f, app, field, *row);
    }
}

fn draw_field(f: &mut Frame, app: &App, field: Field, area: Rect) {
    let focused = app.field == field;
    let border_color = if focused { accent() } else { inactive() };

    let mut title = vec![Span::styled(
        format!(" {} ", field.label()),
        if focused {
            Style::default().fg(accent()).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(text())
        },
    )];
    if let Field::Param(p) = field {
        title.push(Span::styled(format!("({}) ", p), Style::default().fg(text_dim())));
    }
    if field.is_required() {
        title.push(Span::styled("* ", Style::default().fg(danger())));
    }

    let value = app.value(field);
    let cursor = if focused { "_" } else { "" };
    let content = if value.is_empty() && !focused {
        Line::from(Span::styled(field.placeholder(), Style::default().fg(inactive())))
    } else {
        Line::from(vec![
            Span::styled(value, Style::default().fg(text())),
            Span::styled(cursor, Style::default().fg(accent())),
        ])
    };

    let has_suggestions = !app.suggestions(field).is_empty();
    let block = Block::default()
        .title(Line::from(title))
        .title_bottom(if focused && has_suggestions {
            Line::from(Span::styled(" F4 suggestions ", Style::default().fg(text_dim()))).right_aligned()
        } else {
            Line::default()
        })
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn draw_result(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(5)])
        .split(area);

    let block = Block::default()
        .title(Span::styled(" Result ", Style::default().fg(accent()).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));

    match app.composed() {
        Ok(url) => {
            let inner = block.inner(chunks[0]);
            f.render_widget(block, chunks[0]);

            let params = app.parameter_set();
            let pairs: Vec<(&'static str, String)> =
                params.populated().map(|(p, v)| (p.key(), v.to_string())).collect();

            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(pairs.len() as u16 + 2)])
                .split(inner);

            let url_view = Paragraph::new(Span::styled(url, Style::default().fg(success())))
                .wrap(Wrap { trim: false });
            f.render_widget(url_view, parts[0]);

            let rows: Vec<Row> = if pairs.is_empty() {
                vec![Row::new(vec![Span::styled(
                    "No parameters yet",
                    Style::default().fg(text_dim()),
                )])]
            } else {
                pairs
                    .into_iter()
                    .map(|(key, value)| {
                        Row::new(vec![
                            Span::styled(key, Style::default().fg(accent())),
                            Span::styled(value, Style::default().fg(text())),
                        ])
                    })
                    .collect()
            };

            let table = Table::new(rows, [Constraint::Length(14), Constraint::Min(10)]).block(
                Block::default()
                    .title(Span::styled(" Parameters ", Style::default().fg(text_dim())))
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(inactive())),
            );
            f.render_widget(table, parts[1]);
        }
        Err(e) => {
            let message = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "Fill in a valid base URL to build a link",
                    Style::default().fg(danger()),
                )),
                Line::from(""),
                Line::from(Span::styled(e.to_string(), Style::default().fg(text_dim()))),
            ])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
            f.render_widget(message, chunks[0]);
        }
    }

    let tip = Paragraph::new(vec![Line::from(vec![
        Span::styled("Use clear, lowercase names. For Google Ads try ", Style::default().fg(text_dim())),
        Span::styled("utm_source=google", Style::default().fg(accent())),
        Span::styled(" and ", Style::default().fg(text_dim())),
        Span::styled("utm_medium=cpc", Style::default().fg(accent())),
        Span::styled(".", Style::default().fg(text_dim())),
    ])])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(Span::styled(" Tip ", Style::default().fg(text_dim())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(inactive())),
    );
    f.render_widget(tip, chunks[1]);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    // Copy is shown disabled while the URL does not compose
    let copy_color = if app.composed().is_ok() { accent() } else { inactive() };

    let hints = Line::from(vec![
        Span::styled("Tab", Style::default().fg(accent())),
        Span::styled(" next  ", Style::default().fg(text_dim())),
        Span::styled("Enter", Style::default().fg(copy_color)),
        Span::styled(" copy  ", Style::default().fg(if copy_color == inactive() { inactive() } else { text_dim() })),
        Span::styled("F4", Style::default().fg(accent())),
        Span::styled(" suggest  ", Style::default().fg(text_dim())),
        Span::styled("^R", Style::default().fg(accent())),
        Span::styled(" reset  ", Style::default().fg(text_dim())),
        Span::styled("F1", Style::default().fg(accent())),
        Span::styled(" help  ", Style::default().fg(text_dim())),
        Span::styled("Esc", Style::default().fg(accent())),
        Span::styled(" quit", Style::default().fg(text_dim())),
    ]);

    f.render_widget(Paragraph::new(hints).alignment(Alignment::Center), area);
}

fn draw_suggestions(f: &mut Frame, app: &App) {
    let area = f.area();
    let height = (app.picker.len() as u16 + 2).min(area.height);
    let popup_area = centered_fixed(44.min(area.width), height, area);

    f.render_widget(Clear, popup_area);

    let rows: Vec<Row> = app
        .picker
        .iter()
        .enumerate()
        .map(|(i, preset)| {
            let style = if i == app.picker_selected {
                Style::default().bg(bg_selected()).fg(text())
            } else {
                Style::default()
            };
            Row::new(vec![
                Span::styled(preset.value.as_str(), Style::default().fg(accent())),
                Span::styled(preset.label.as_str(), Style::default().fg(text_dim())),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(16), Constraint::Min(10)]).block(
        Block::default()
            .title(Span::styled(
                format!(" {} ", app.field.label()),
                Style::default().fg(accent()),
            ))
            .title_bottom(Line::from(Span::styled(" Enter pick · Esc close ", Style::default().fg(text_dim()))).right_aligned())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent())),
    );

    f.render_widget(table, popup_area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 30 { 95 } else { 70 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let key_line = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", key), Style::default().fg(accent())),
            Span::raw(what),
        ])
    };
    let heading = |title: &'static str| {
        Line::from(Span::styled(title, Style::default().fg(danger()).add_modifier(Modifier::BOLD)))
    };

    let help_text = vec![
        heading("═══ Fields ═══"),
        key_line("Tab/↓", "Next field"),
        key_line("S-Tab/↑", "Previous field"),
        key_line("Backspace", "Delete last character"),
        key_line("Ctrl+U", "Clear field"),
        Line::from(""),
        heading("═══ Actions ═══"),
        key_line("F4", "Suggestions for source, medium, campaign"),
        key_line("Enter", "Copy link to clipboard"),
        key_line("Ctrl+Y", "Copy link to clipboard"),
        key_line("Ctrl+R", "Reset form"),
        key_line("Esc", "Quit"),
        Line::from(""),
        heading("═══ Command line ═══"),
        Line::from(Span::styled("  utmkit -u https://example.com --source google --copy", Style::default().fg(text_dim()))),
        Line::from(Span::styled("  utmkit --presets", Style::default().fg(text_dim()))),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("F1", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" utmkit Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn centered_fixed(width: u16, height: u16, r: Rect) -> Rect {
    Rect {
        x: r.x + r.width.saturating_sub(width) / 2,
        y: r.y + r.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::testing::FakeClipboard;
    use crate::config::AppConfig;
    use crate::utm::UtmParam;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn render(app: &App) -> String {
        let backend = TestBackend::new(120, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_renders_url_and_parameters() {
        let mut app = App::new(AppConfig::default(), Arc::new(FakeClipboard::default()));
        app.params[UtmParam::Source as usize] = "google".to_string();

        let screen = render(&app);
        assert!(screen.contains("https://example.com/?utm_source=google"));
        assert!(screen.contains("utm_source"));
    }

    #[test]
    fn test_renders_invalid_url_message() {
        let mut app = App::new(AppConfig::default(), Arc::new(FakeClipboard::default()));
        app.base_url = "nope".to_string();

        let screen = render(&app);
        assert!(screen.contains("Fill in a valid base URL"));
    }

    #[test]
    fn test_centered_fixed_clamps() {
        let r = centered_fixed(10, 4, Rect::new(0, 0, 30, 10));
        assert_eq!(r, Rect::new(10, 3, 10, 4));
    }
}
