use crate::app::{App, AppMode};
use crate::config::Config;
use crate::update::UpdateChecker;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
    Frame,
};

pub fn draw(f: &mut Frame, app: &App, checker: &UpdateChecker, config: &Config) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(6),
            Constraint::Length(2),
        ])
        .split(area);

    draw_header(f, chunks[0], config);
    draw_timer(f, chunks[1], app, config);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[2]);
    draw_todos(f, body[0], app, config);
    draw_notes(f, body[1], app, config);

    draw_status_bar(f, chunks[3], app, checker, config);

    match app.mode {
        AppMode::AddingTodo => draw_input_overlay(f, "New Todo", &app.input_buffer, config),
        AppMode::EditingFocus => {
            let title = format!("Focus Minutes (now {})", app.timer.focus_secs() / 60);
            draw_input_overlay(f, &title, &app.input_buffer, config)
        }
        AppMode::EditingBreak => {
            let title = format!("Break Minutes (now {})", app.timer.break_secs() / 60);
            draw_input_overlay(f, &title, &app.input_buffer, config)
        }
        AppMode::EditingNotes => draw_notes_overlay(f, &app.input_buffer, config),
        AppMode::UpdatePrompt => draw_update_overlay(f, checker, config),
        AppMode::Normal => {}
    }
}

fn draw_header(f: &mut Frame, area: Rect, config: &Config) {
    let theme = &config.theme;
    let icons = &config.icons;
    let text = Line::from(vec![
        Span::raw(icons.header_left.clone()),
        Span::styled(
            "POMO",
            Style::default().fg(theme.blue).add_modifier(Modifier::BOLD),
        ),
        Span::raw(icons.header_right.clone()),
    ]);
    f.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(theme.surface)),
        ),
        area,
    );
}

fn draw_timer(f: &mut Frame, area: Rect, app: &App, config: &Config) {
    let theme = &config.theme;
    let icons = &config.icons;
    let timer = &app.timer;

    let phase = if timer.is_on_break() { "Break" } else { "Focus" };
    let state_icon = if timer.is_running() {
        &icons.play
    } else {
        &icons.stop
    };
    let remaining = timer.remaining();
    let time_str = format!("{:02}:{:02}", remaining / 60, remaining % 60);

    let block = Block::default()
        .title(Span::styled(
            format!(" {} {} {} ", icons.timer, phase, state_icon),
            Style::default().fg(theme.gray),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.green));
    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner_area);
    f.render_widget(
        Paragraph::new(time_str)
            .style(
                Style::default()
                    .fg(theme.foreground)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center),
        v_chunks[0],
    );
    f.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(theme.blue).bg(theme.surface))
            .percent((timer.progress() * 100.0) as u16),
        v_chunks[1],
    );
}

fn draw_todos(f: &mut Frame, area: Rect, app: &App, config: &Config) {
    let theme = &config.theme;
    let icons = &config.icons;
    let block = Block::default()
        .title(Span::styled(
            format!(" {} Todos ", icons.todos),
            Style::default().fg(theme.gray),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.green));
    let inner_area = block.inner(area);
    f.render_widget(block, area);

    if app.todos.is_empty() {
        f.render_widget(
            Paragraph::new("No todos. Press 'a' to add one.")
                .style(Style::default().fg(theme.gray))
                .alignment(Alignment::Center),
            inner_area,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .todos
        .iter()
        .enumerate()
        .map(|(i, todo)| {
            let marker = if i == app.selected_todo {
                Span::styled(icons.select.clone(), Style::default().fg(theme.selection))
            } else {
                Span::raw(" ")
            };
            let check = Span::raw(format!(
                " {} ",
                if todo.done { &icons.done } else { &icons.pending }
            ));
            let title = Span::styled(
                todo.title.clone(),
                if todo.done {
                    Style::default()
                        .fg(theme.gray)
                        .add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default().fg(theme.foreground)
                },
            );
            let mut item = ListItem::new(Line::from(vec![marker, check, title]));
            if i == app.selected_todo {
                item = item.style(Style::default().bg(theme.surface));
            }
            item
        })
        .collect();
    f.render_widget(List::new(items), inner_area);
}

fn draw_notes(f: &mut Frame, area: Rect, app: &App, config: &Config) {
    let theme = &config.theme;
    let icons = &config.icons;
    let block = Block::default()
        .title(Span::styled(
            format!(" {} Notes ", icons.notes),
            Style::default().fg(theme.gray),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.green));
    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let body = if app.notes.is_empty() {
        Paragraph::new("Press 'n' to jot something down.").style(Style::default().fg(theme.gray))
    } else {
        Paragraph::new(app.notes.as_str())
            .style(Style::default().fg(theme.foreground))
            .wrap(Wrap { trim: false })
    };
    f.render_widget(body, inner_area);
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App, checker: &UpdateChecker, config: &Config) {
    let theme = &config.theme;
    let (mode_text, mode_color) = match app.mode {
        AppMode::Normal => ("NORMAL", theme.green),
        AppMode::AddingTodo => ("INSERT", theme.yellow),
        AppMode::EditingNotes => ("NOTES", theme.blue),
        AppMode::EditingFocus | AppMode::EditingBreak => ("TIME", theme.blue),
        AppMode::UpdatePrompt => ("UPDATE", theme.magenta),
    };
    let help = match app.mode {
        AppMode::Normal => {
            "space:start/stop │ r/b:reset │ t/T:durations │ a:add │ d:del │ x:done │ n:notes │ u:update │ q:quit"
        }
        AppMode::EditingNotes => "esc:save",
        AppMode::UpdatePrompt => "d:download │ s:skip │ l:later │ esc:dismiss",
        _ => "enter:confirm │ esc:cancel",
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                format!(" {} ", mode_text),
                Style::default()
                    .bg(mode_color)
                    .fg(theme.background)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::raw(help),
        ]))
        .block(Block::default().style(Style::default().bg(theme.surface).fg(theme.gray))),
        rows[0],
    );
    f.render_widget(
        Paragraph::new(update_status_line(checker, config))
            .block(Block::default().style(Style::default().bg(theme.surface))),
        rows[1],
    );
}

fn update_status_line(checker: &UpdateChecker, config: &Config) -> Line<'static> {
    let theme = &config.theme;
    if checker.is_checking {
        return Line::from(Span::styled(
            " Checking for updates...",
            Style::default().fg(theme.gray),
        ));
    }
    if checker.is_downloading {
        return Line::from(Span::styled(
            format!(
                " Downloading update... {:.0}%",
                checker.download_progress * 100.0
            ),
            Style::default().fg(theme.yellow),
        ));
    }
    if let Some(message) = &checker.error_message {
        return Line::from(Span::styled(
            format!(" {}", message),
            Style::default().fg(theme.red),
        ));
    }
    if checker.update_available {
        let tag = checker
            .latest_release
            .as_ref()
            .map(|r| r.tag.as_str())
            .unwrap_or("?");
        return Line::from(Span::styled(
            format!(" Update {} available - press 'u'", tag),
            Style::default().fg(theme.yellow),
        ));
    }
    if let Some(path) = &checker.last_download {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Line::from(Span::styled(
            format!(" Saved {} to your downloads folder", name),
            Style::default().fg(theme.green),
        ));
    }
    Line::from(Span::styled(
        concat!(" pomo v", env!("CARGO_PKG_VERSION")),
        Style::default().fg(theme.gray),
    ))
}

fn draw_input_overlay(f: &mut Frame, title: &str, input: &str, config: &Config) {
    let theme = &config.theme;
    let area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.yellow))
        .border_type(BorderType::Double)
        .style(Style::default().bg(theme.background));
    let inner_area = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("▸ ", Style::default().fg(theme.foreground)),
            Span::styled(input, Style::default().fg(theme.foreground)),
            Span::styled(
                &config.icons.input_cursor,
                Style::default()
                    .fg(theme.foreground)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
        ])),
        inner_area,
    );
}

fn draw_notes_overlay(f: &mut Frame, draft: &str, config: &Config) {
    let theme = &config.theme;
    let area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(" Notes (esc saves) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.yellow))
        .border_type(BorderType::Double)
        .style(Style::default().bg(theme.background));
    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let mut text = draft.to_string();
    text.push_str(&config.icons.input_cursor);
    f.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(theme.foreground))
            .wrap(Wrap { trim: false }),
        inner_area,
    );
}

fn draw_update_overlay(f: &mut Frame, checker: &UpdateChecker, config: &Config) {
    let theme = &config.theme;
    let area = centered_rect(60, 50, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(" Update Available ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.magenta))
        .border_type(BorderType::Double)
        .style(Style::default().bg(theme.background));
    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let mut lines: Vec<Line> = vec![];
    if let Some(release) = &checker.latest_release {
        lines.push(Line::from(vec![
            Span::styled(release.title.clone(), Style::default().fg(theme.foreground)),
            Span::styled(
                format!("  ({})", release.published_at.format("%Y-%m-%d")),
                Style::default().fg(theme.gray),
            ),
        ]));
        lines.push(Line::from(Span::styled(
            format!(
                "{} -> {}",
                env!("CARGO_PKG_VERSION"),
                release.tag
            ),
            Style::default().fg(theme.yellow),
        )));
        lines.push(Line::from(""));
        for note_line in release.notes.lines().take(8) {
            lines.push(Line::from(Span::styled(
                note_line.to_string(),
                Style::default().fg(theme.gray),
            )));
        }
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "d: download   s: skip this version   l: remind me later   esc: dismiss",
        Style::default().fg(theme.foreground),
    )));

    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }),
        inner_area,
    );
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
