use mdcore::{styled_runs, Block as MessageBlock, BlockType};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::config::Theme;
use crate::overlay::{Overlay, OverlayStyle, Viewport};
use crate::store::StoredMessage;
use crate::ui_state::MessageType;

pub fn draw(f: &mut Frame, app: &mut App) {
    let composer_height = app.config.composer.height + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),               // Title bar
            Constraint::Min(0),                  // History
            Constraint::Length(1),               // Toolbar
            Constraint::Length(composer_height), // Composer
            Constraint::Length(1),               // Status bar
        ])
        .split(f.size());

    draw_title_bar(f, app, chunks[0]);
    draw_history(f, app, chunks[1]);
    draw_toolbar(f, app, chunks[2]);
    draw_composer(f, app, chunks[3]);
    draw_status_bar(f, app, chunks[4]);

    if app.ui_state.show_help {
        draw_help(f, f.size());
    }
}

pub fn overlay_style(theme: &Theme) -> OverlayStyle {
    let text = Style::default().fg(Theme::color(&theme.foreground, Color::Reset));
    let accent = Theme::color(&theme.accent_color, Color::Yellow);
    OverlayStyle {
        text,
        heading: text.add_modifier(Modifier::BOLD),
        badge: Style::default().fg(Theme::color(&theme.badge_color, Color::DarkGray)),
        active_badge: Style::default().fg(accent).add_modifier(Modifier::BOLD),
    }
}

fn draw_title_bar(f: &mut Frame, app: &App, area: Rect) {
    let title = format!("  Jotline -- {} messages", app.store.len());
    let title_bar = Paragraph::new(title)
        .style(
            Style::default()
                .bg(Theme::color(&app.config.theme.status_background, Color::Blue))
                .fg(Color::White),
        )
        .alignment(Alignment::Left);
    f.render_widget(title_bar, area);
}

fn draw_history(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.config.theme;
    let mut lines = Vec::new();
    for message in app.store.list() {
        lines.extend(message_lines(message, theme));
        lines.push(Line::from(""));
    }

    // newest messages stay in view
    let overflow = lines.len().saturating_sub(area.height as usize);
    let history = Paragraph::new(lines).scroll((overflow.min(u16::MAX as usize) as u16, 0));
    f.render_widget(history, area);
}

/// Renders a stored message through the read path: block parsing, then
/// inline runs.
pub fn message_lines(message: &StoredMessage, theme: &Theme) -> Vec<Line<'static>> {
    let text = Style::default().fg(Theme::color(&theme.foreground, Color::Reset));
    let accent = Theme::color(&theme.accent_color, Color::Yellow);
    let dim = Style::default().fg(Color::DarkGray);

    let mut header = vec![Span::styled(
        format!("#{} {}", message.id, message.timestamp.format("%H:%M")),
        dim,
    )];
    if message.edited {
        header.push(Span::styled(" (edited)", dim.add_modifier(Modifier::ITALIC)));
    }
    if let Some(attachment) = &message.attachment {
        header.push(Span::styled(format!(" [image: {}]", attachment.0), dim));
    }
    let mut lines = vec![Line::from(header)];

    for block in message.document().blocks {
        match block {
            MessageBlock::Heading { level, text: heading } => {
                let mut style = text.fg(accent).add_modifier(Modifier::BOLD);
                if level == 1 {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                lines.push(Line::from(inline_spans(&heading, style)));
            }
            MessageBlock::Paragraph(body) => lines.push(Line::from(inline_spans(&body, text))),
            MessageBlock::UnorderedList(items) | MessageBlock::OrderedList(items) => {
                for item in items {
                    let marker = match (item.number, item.checked) {
                        (Some(n), _) => format!("  {}. ", n),
                        (None, Some(true)) => "  [x] ".to_string(),
                        (None, Some(false)) => "  [ ] ".to_string(),
                        (None, None) => "  \u{2022} ".to_string(),
                    };
                    let mut spans = vec![Span::styled(marker, Style::default().fg(accent))];
                    spans.extend(inline_spans(&item.text, text));
                    lines.push(Line::from(spans));
                }
            }
            MessageBlock::Quote(body) => {
                let mut spans = vec![Span::styled("\u{2502} ", dim)];
                spans.extend(inline_spans(&body, text.add_modifier(Modifier::ITALIC)));
                lines.push(Line::from(spans));
            }
            MessageBlock::CodeBlock { lines: code, .. } => {
                let code_style = Style::default().fg(Color::Cyan).bg(Color::Rgb(40, 40, 40));
                lines.extend(code.into_iter().map(|l| Line::from(Span::styled(l, code_style))));
            }
            MessageBlock::Rule => lines.push(Line::from(Span::styled("\u{2500}".repeat(24), dim))),
            MessageBlock::Blank => lines.push(Line::from("")),
        }
    }

    lines
}

fn inline_spans(text: &str, base: Style) -> Vec<Span<'static>> {
    styled_runs(text)
        .into_iter()
        .map(|run| {
            let mut style = base;
            if run.style.bold {
                style = style.add_modifier(Modifier::BOLD);
            }
            if run.style.italic {
                style = style.add_modifier(Modifier::ITALIC);
            }
            if run.style.code {
                style = style.fg(Color::Cyan).bg(Color::Rgb(40, 40, 40));
            }
            Span::styled(run.text, style)
        })
        .collect()
}

fn draw_toolbar(f: &mut Frame, app: &App, area: Rect) {
    let session = app.composer.session();
    let accent = Theme::color(&app.config.theme.accent_color, Color::Yellow);
    let on = Style::default().fg(Color::Black).bg(accent).add_modifier(Modifier::BOLD);
    let off = Style::default().fg(Color::Gray);

    let mut spans = Vec::new();
    for (label, block) in [
        ("N", BlockType::Plain),
        ("H1", BlockType::Heading1),
        ("H2", BlockType::Heading2),
        ("H3", BlockType::Heading3),
        ("\u{2022}", BlockType::UnorderedItem),
        ("1.", BlockType::OrderedItem),
    ] {
        let style = if session.active_block() == block { on } else { off };
        spans.push(Span::styled(format!(" {} ", label), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw(" "));
    let armed = session.armed();
    for (label, kind) in [("B", mdcore::InlineKind::Bold), ("I", mdcore::InlineKind::Italic)] {
        let style = if armed.is_armed(kind) { on } else { off };
        spans.push(Span::styled(format!(" {} ", label), style));
        spans.push(Span::raw(" "));
    }

    f.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Rgb(30, 30, 30))),
        area,
    );
}

fn draw_composer(f: &mut Frame, app: &mut App, area: Rect) {
    let title = match app.ui_state.editing {
        Some(id) => format!(" Editing #{} ", id),
        None => " Message ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .style(Style::default().bg(Theme::color(&app.config.theme.background, Color::Reset)))
        .title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let height = inner.height as usize;
    app.input.set_viewport_height(height);
    let (caret_line, caret_col) = app.input.cursor_screen_position();
    let offset = app
        .scroll_sync
        .sync(app.input.viewport_offset(), caret_line, height);

    let style = overlay_style(&app.config.theme);
    let overlay = Overlay::build(
        app.composer.lines(),
        &style,
        Viewport {
            offset,
            height,
            active_line: app.composer.session().active_line(),
        },
    );

    let gutter_width = if app.config.composer.show_gutter {
        overlay.gutter.iter().map(Line::width).max().unwrap_or(0) as u16
    } else {
        0
    };
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(gutter_width), Constraint::Min(0)])
        .split(inner);

    if gutter_width > 0 {
        f.render_widget(Paragraph::new(overlay.gutter), chunks[0]);
    }

    let text_area = chunks[1];
    if text_area.width == 0 {
        return;
    }
    let width = text_area.width as usize;
    app.input.set_viewport_width(width);
    let column = app
        .scroll_sync
        .sync_column(app.input.viewport_column(), caret_col, width);

    if app.composer.is_blank() && app.input.len_chars() == 0 {
        let placeholder = Paragraph::new("Write a message...")
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC));
        f.render_widget(placeholder, text_area);
    } else {
        let scroll = (0, column.min(u16::MAX as usize) as u16);
        f.render_widget(Paragraph::new(overlay.preview).scroll(scroll), text_area);
    }

    if caret_line >= offset
        && caret_line - offset < height
        && caret_col >= column
        && caret_col - column < width
    {
        f.set_cursor(
            text_area.x + (caret_col - column) as u16,
            text_area.y + (caret_line - offset) as u16,
        );
    }
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let line = match app.ui_state.status_message() {
        Some(status) => {
            let color = match status.message_type {
                MessageType::Info => Color::Green,
                MessageType::Warning => Color::Yellow,
                MessageType::Error => Color::Red,
            };
            Line::from(Span::styled(status.content.clone(), Style::default().fg(color)))
        }
        None => {
            let key = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
            Line::from(vec![
                Span::styled("Enter", key),
                Span::raw(" Send  "),
                Span::styled("Shift+Enter", key),
                Span::raw(" Newline  "),
                Span::styled("Alt+B/I", key),
                Span::raw(" Style  "),
                Span::styled("F1", key),
                Span::raw(" Help  "),
                Span::styled("Esc", key),
                Span::raw(" Quit"),
            ])
        }
    };

    f.render_widget(
        Paragraph::new(line).style(Style::default().bg(Color::DarkGray)),
        area,
    );
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            " HELP -- Composer Key Bindings",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("  Enter              Send the message"),
        Line::from("  Shift+Enter, C-j   New line (lists continue)"),
        Line::from("  Backspace          On an empty styled line, clear the style"),
        Line::from("  Alt+B / Alt+I      Bold / italic for new text"),
        Line::from("  Alt+0              Normal line"),
        Line::from("  Alt+1..3           Heading 1..3"),
        Line::from("  Alt+8 / Alt+9      Bullet / numbered item"),
        Line::from("  Ctrl+E             Edit the last message"),
        Line::from("  Ctrl+D             Delete the last message"),
        Line::from("  Esc                Cancel edit, or quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Press any key to close",
            Style::default().add_modifier(Modifier::ITALIC),
        )]),
    ];

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Blue)),
        );

    f.render_widget(Clear, area);
    f.render_widget(help, area);
}
