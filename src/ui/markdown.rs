//! Message rendering for the chat area.
//!
//! User and assistant content goes through `pulldown-cmark`; error entries
//! are shown verbatim. Every rendered message ends with one blank line.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::message::{Message, Role};
use crate::ui::theme::Theme;

const USER_PREFIX: &str = "You: ";
const USER_CONTINUATION_INDENT: &str = "     ";
const QUOTE_PREFIX: &str = "│ ";
const CODE_INDENT: &str = "  ";
const RULE_WIDTH: usize = 40;

pub fn render_message(message: &Message, theme: &Theme, markdown: bool) -> Vec<Line<'static>> {
    if markdown && message.role.renders_markdown() {
        MarkdownRenderer::new(message.role, theme).render(&message.content)
    } else {
        render_plain(message, theme)
    }
}

/// Render a whole transcript.
pub fn render_transcript<'a>(
    messages: impl IntoIterator<Item = &'a Message>,
    theme: &Theme,
    markdown: bool,
) -> Vec<Line<'static>> {
    messages
        .into_iter()
        .flat_map(|message| render_message(message, theme, markdown))
        .collect()
}

fn base_style(role: Role, theme: &Theme) -> Style {
    match role {
        Role::User => theme.user_text_style,
        Role::Assistant => theme.assistant_text_style,
        Role::Error => theme.error_text_style,
    }
}

fn render_plain(message: &Message, theme: &Theme) -> Vec<Line<'static>> {
    let style = base_style(message.role, theme);
    let mut lines: Vec<Line<'static>> = message
        .content
        .lines()
        .enumerate()
        .map(|(index, text)| {
            let mut spans = Vec::with_capacity(2);
            if message.role.is_user() {
                let prefix = if index == 0 {
                    Span::styled(USER_PREFIX, theme.user_prefix_style)
                } else {
                    Span::raw(USER_CONTINUATION_INDENT)
                };
                spans.push(prefix);
            }
            spans.push(Span::styled(text.to_string(), style));
            Line::from(spans)
        })
        .collect();
    if lines.is_empty() && message.role.is_user() {
        lines.push(Line::from(Span::styled(USER_PREFIX, theme.user_prefix_style)));
    }
    lines.push(Line::default());
    lines
}

struct MarkdownRenderer<'t> {
    role: Role,
    theme: &'t Theme,
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    /// Next number for ordered lists, `None` for bullets.
    list_stack: Vec<Option<u64>>,
    quote_depth: usize,
    in_code_block: bool,
    did_prefix: bool,
}

impl<'t> MarkdownRenderer<'t> {
    fn new(role: Role, theme: &'t Theme) -> Self {
        Self {
            role,
            theme,
            lines: Vec::new(),
            spans: Vec::new(),
            style_stack: Vec::new(),
            list_stack: Vec::new(),
            quote_depth: 0,
            in_code_block: false,
            did_prefix: false,
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack
            .last()
            .copied()
            .unwrap_or_else(|| base_style(self.role, self.theme))
    }

    fn push_modifier(&mut self, modifier: Modifier) {
        let style = self.current_style().add_modifier(modifier);
        self.style_stack.push(style);
    }

    fn line_prefix(&mut self) -> Vec<Span<'static>> {
        let mut prefix = Vec::new();
        if self.role.is_user() {
            if self.did_prefix {
                prefix.push(Span::raw(USER_CONTINUATION_INDENT));
            } else {
                prefix.push(Span::styled(USER_PREFIX, self.theme.user_prefix_style));
                self.did_prefix = true;
            }
        }
        for _ in 0..self.quote_depth {
            prefix.push(Span::styled(QUOTE_PREFIX, self.theme.md_blockquote_style));
        }
        prefix
    }

    fn flush(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let mut spans = self.line_prefix();
        spans.append(&mut self.spans);
        self.lines.push(Line::from(spans));
    }

    fn push_blank(&mut self) {
        if self.lines.last().is_some_and(|line| line.spans.is_empty()) || self.lines.is_empty() {
            return;
        }
        self.lines.push(Line::default());
    }

    fn push_code_text(&mut self, text: &str) {
        let style = self.theme.md_code_style;
        for line in text.lines() {
            let mut spans = self.line_prefix();
            spans.push(Span::raw(CODE_INDENT));
            spans.push(Span::styled(line.to_string(), style));
            self.lines.push(Line::from(spans));
        }
    }

    fn start_item(&mut self) {
        self.flush();
        let depth = self.list_stack.len().saturating_sub(1);
        let marker = match self.list_stack.last_mut() {
            Some(Some(next)) => {
                let marker = format!("{next}. ");
                *next += 1;
                marker
            }
            _ => "- ".to_string(),
        };
        if depth > 0 {
            self.spans.push(Span::raw("  ".repeat(depth)));
        }
        self.spans
            .push(Span::styled(marker, self.theme.md_list_marker_style));
    }

    fn render(mut self, content: &str) -> Vec<Line<'static>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        for event in Parser::new_ext(content, options) {
            match event {
                Event::Start(tag) => match tag {
                    Tag::Heading { .. } => {
                        self.flush();
                        self.style_stack.push(self.theme.md_heading_style);
                    }
                    Tag::BlockQuote(_) => {
                        self.flush();
                        self.quote_depth += 1;
                        self.style_stack.push(self.theme.md_blockquote_style);
                    }
                    Tag::List(start) => {
                        self.flush();
                        self.list_stack.push(start);
                    }
                    Tag::Item => self.start_item(),
                    Tag::CodeBlock(_) => {
                        self.flush();
                        self.in_code_block = true;
                    }
                    Tag::Emphasis => self.push_modifier(Modifier::ITALIC),
                    Tag::Strong => self.push_modifier(Modifier::BOLD),
                    Tag::Strikethrough => self.push_modifier(Modifier::CROSSED_OUT),
                    Tag::Link { .. } => self.style_stack.push(self.theme.md_link_style),
                    _ => {}
                },
                Event::End(tag_end) => match tag_end {
                    TagEnd::Paragraph => {
                        self.flush();
                        if self.list_stack.is_empty() {
                            self.push_blank();
                        }
                    }
                    TagEnd::Heading(_) => {
                        self.style_stack.pop();
                        self.flush();
                        self.push_blank();
                    }
                    TagEnd::BlockQuote(_) => {
                        self.flush();
                        self.style_stack.pop();
                        self.quote_depth = self.quote_depth.saturating_sub(1);
                    }
                    TagEnd::List(_) => {
                        self.flush();
                        self.list_stack.pop();
                        if self.list_stack.is_empty() {
                            self.push_blank();
                        }
                    }
                    TagEnd::Item => self.flush(),
                    TagEnd::CodeBlock => {
                        self.in_code_block = false;
                        self.push_blank();
                    }
                    TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                        self.style_stack.pop();
                    }
                    _ => {}
                },
                Event::Text(text) => {
                    if self.in_code_block {
                        self.push_code_text(&text);
                    } else {
                        let style = self.current_style();
                        self.spans.push(Span::styled(text.into_string(), style));
                    }
                }
                Event::Code(code) => {
                    self.spans
                        .push(Span::styled(code.into_string(), self.theme.md_code_style));
                }
                Event::Html(html) | Event::InlineHtml(html) => {
                    let style = self.current_style();
                    self.spans
                        .push(Span::styled(html.trim_end().to_string(), style));
                }
                Event::SoftBreak => self.spans.push(Span::raw(" ")),
                Event::HardBreak => self.flush(),
                Event::Rule => {
                    self.flush();
                    let rule = Span::styled("─".repeat(RULE_WIDTH), self.theme.md_list_marker_style);
                    let mut spans = self.line_prefix();
                    spans.push(rule);
                    self.lines.push(Line::from(spans));
                    self.push_blank();
                }
                Event::TaskListMarker(checked) => {
                    let marker = if checked { "[x] " } else { "[ ] " };
                    self.spans
                        .push(Span::styled(marker, self.theme.md_list_marker_style));
                }
                _ => {}
            }
        }

        self.flush();
        if self.lines.is_empty() && self.role.is_user() {
            let prefix = self.line_prefix();
            self.lines.push(Line::from(prefix));
        }
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines.push(Line::default());
        self.lines
    }
}
