use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::core::app::{App, Focus, MenuOption, SUGGESTIONS};
use crate::ui::markdown::render_transcript;
use crate::ui::theme::Theme;

const SIDEBAR_WIDTH: u16 = 30;
const MAX_INPUT_LINES: u16 = 6;
const GREETING: &str = "What can I help with?";

pub fn ui(f: &mut Frame, app: &App) {
    let theme = Theme::default();

    let main_area = if app.ui.sidebar_open {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(f.area());
        render_sidebar(f, app, &theme, columns[0]);
        columns[1]
    } else {
        f.area()
    };

    let input_lines = (app.ui.textarea().lines().len() as u16).clamp(1, MAX_INPUT_LINES);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(input_lines + 2), // +2 for borders
            Constraint::Length(1),
        ])
        .split(main_area);

    if app.is_home() {
        render_home(f, &theme, rows[0]);
    } else {
        render_messages(f, app, &theme, rows[0]);
    }
    render_input(f, app, &theme, rows[1]);
    render_status(f, app, &theme, rows[2]);

    if app.ui.menu_open {
        render_menu(f, app, &theme, rows[1]);
    }
}

fn chat_title(app: &App) -> String {
    let thread = app
        .conversation
        .active_thread
        .as_deref()
        .map(|id| app.conversation.thread_title(id).unwrap_or("Untitled"))
        .unwrap_or("New chat");
    format!(
        "threadline v{} - {} ({})",
        env!("CARGO_PKG_VERSION"),
        thread,
        app.conversation.provider
    )
}

fn render_home(f: &mut Frame, theme: &Theme, area: Rect) {
    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled(GREETING, theme.greeting_style)),
        Line::default(),
    ];
    lines.extend(SUGGESTIONS.iter().enumerate().map(|(index, suggestion)| {
        Line::from(Span::styled(
            format!("{}. {}", index + 1, suggestion),
            theme.suggestion_style,
        ))
    }));

    let paragraph = Paragraph::new(lines)
        .block(Block::default().title(Span::styled("threadline", theme.title_style)))
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

fn render_messages(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let lines = render_transcript(app.transcript.messages(), theme, app.ui.markdown_enabled);
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });

    let available_height = area.height.saturating_sub(1); // title row
    let total = wrapped_height(&paragraph, area.width);
    let max_offset = total.saturating_sub(available_height);
    let scroll_top = max_offset.saturating_sub(app.ui.scroll_from_bottom.min(max_offset));

    let paragraph = paragraph
        .block(Block::default().title(Span::styled(chat_title(app), theme.title_style)))
        .scroll((scroll_top, 0));
    f.render_widget(paragraph, area);
}

/// Rows the paragraph occupies with the same word wrap it renders with.
fn wrapped_height(paragraph: &Paragraph, width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    paragraph.line_count(width).min(u16::MAX as usize) as u16
}

fn render_input(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let border_style = if app.ui.search_mode {
        theme.search_border_style
    } else {
        theme.input_border_style
    };
    let mut textarea = app.ui.textarea().clone();
    textarea.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(app.ui.input_title(), theme.input_title_style)),
    );
    if app.ui.focus == Focus::Sidebar || app.ui.menu_open {
        textarea.set_cursor_style(Style::default());
    }
    f.render_widget(&textarea, area);
}

fn render_status(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let text = if let Some(status) = &app.ui.status {
        status.clone()
    } else if app.ui.pending_delete.is_some() {
        "Delete this chat? (y to confirm, any other key to cancel)".to_string()
    } else if app.ui.loading {
        "Thinking...".to_string()
    } else {
        String::new()
    };
    f.render_widget(Paragraph::new(Span::styled(text, theme.status_style)), area);
}

fn render_sidebar(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.sidebar_border_style)
        .title(Span::styled("Chats", theme.title_style));

    if app.conversation.threads.is_empty() {
        let empty = Paragraph::new(Span::styled("No chats yet", theme.suggestion_style))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let active = app.conversation.active_thread.as_deref();
    let items: Vec<ListItem> = app
        .conversation
        .threads
        .iter()
        .map(|thread| {
            let title = if thread.title.is_empty() {
                "Untitled"
            } else {
                thread.title.as_str()
            };
            let style = if Some(thread.id.as_str()) == active {
                theme.sidebar_active_style
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(title.to_string(), style)))
        })
        .collect();

    let highlight = if app.ui.focus == Focus::Sidebar {
        theme.selection_style
    } else {
        theme.selection_unfocused_style
    };
    let list = List::new(items).block(block).highlight_style(highlight);
    let mut state = ListState::default();
    state.select(Some(app.ui.sidebar_selected));
    f.render_stateful_widget(list, area, &mut state);
}

/// Options popup drawn just above the input box.
fn render_menu(f: &mut Frame, app: &App, theme: &Theme, input_area: Rect) {
    let height = MenuOption::ALL.len() as u16 + 2;
    let width = MenuOption::ALL
        .iter()
        .map(|option| option.label().width() as u16)
        .max()
        .unwrap_or(0)
        + 6;
    let area = Rect {
        x: input_area.x + 1,
        y: input_area.y.saturating_sub(height),
        width: width.min(input_area.width),
        height: height.min(input_area.y),
    };

    let items: Vec<ListItem> = MenuOption::ALL
        .iter()
        .map(|option| ListItem::new(option.label()))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.input_border_style)
                .title("Options"),
        )
        .highlight_style(theme.selection_style)
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(app.ui.menu_selected));

    f.render_widget(Clear, area);
    f.render_stateful_widget(list, area, &mut state);
}
