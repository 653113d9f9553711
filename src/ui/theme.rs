use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    // Chat message styles
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_text_style: Style,
    pub error_text_style: Style,

    // Markdown
    pub md_heading_style: Style,
    pub md_code_style: Style,
    pub md_blockquote_style: Style,
    pub md_list_marker_style: Style,
    pub md_link_style: Style,

    // Chrome
    pub title_style: Style,
    pub status_style: Style,
    pub input_border_style: Style,
    pub input_title_style: Style,
    pub search_border_style: Style,
    pub greeting_style: Style,
    pub suggestion_style: Style,

    // Sidebar and menu
    pub sidebar_border_style: Style,
    pub sidebar_active_style: Style,
    pub selection_style: Style,
    pub selection_unfocused_style: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            user_prefix_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            assistant_text_style: Style::default().fg(Color::White),
            error_text_style: Style::default().fg(Color::Red),

            md_heading_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            md_code_style: Style::default().fg(Color::Yellow),
            md_blockquote_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            md_list_marker_style: Style::default().fg(Color::DarkGray),
            md_link_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),

            title_style: Style::default().fg(Color::Gray),
            status_style: Style::default().fg(Color::Yellow),
            input_border_style: Style::default().fg(Color::Gray),
            input_title_style: Style::default().fg(Color::Gray),
            search_border_style: Style::default().fg(Color::LightBlue),
            greeting_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            suggestion_style: Style::default().fg(Color::DarkGray),

            sidebar_border_style: Style::default().fg(Color::DarkGray),
            sidebar_active_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            selection_style: Style::default().add_modifier(Modifier::REVERSED),
            selection_unfocused_style: Style::default().add_modifier(Modifier::UNDERLINED),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark_default()
    }
}
