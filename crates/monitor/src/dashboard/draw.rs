//! Maps tone-tagged panel content onto ratatui widgets.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use monitor_core::panels::{ContentLine, PanelContent, Tone};

/// Everything drawn in one frame.
#[derive(Debug, Clone, Default)]
pub struct Screen {
    pub header: ContentLine,
    pub tabs: ContentLine,
    pub body: PanelContent,
    pub footer: ContentLine,
    pub scroll: u16,
}

pub fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Normal => Style::default(),
        Tone::Muted => Style::default().fg(Color::DarkGray),
        Tone::Heading => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        Tone::Good => Style::default().fg(Color::Green),
        Tone::Warning => Style::default().fg(Color::Yellow),
        Tone::Critical => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Tone::Stale => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM),
    }
}

pub fn to_line(line: &ContentLine) -> Line<'static> {
    Line::from(
        line.segments
            .iter()
            .map(|segment| Span::styled(segment.text.clone(), tone_style(segment.tone)))
            .collect::<Vec<_>>(),
    )
}

pub fn draw(frame: &mut Frame<'_>, screen: &Screen) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    frame.render_widget(
        Paragraph::new(to_line(&screen.header))
            .style(Style::default().add_modifier(Modifier::REVERSED)),
        chunks[0],
    );
    frame.render_widget(Paragraph::new(to_line(&screen.tabs)), chunks[1]);

    // Keep at least the last line on screen when content shrinks
    let max_scroll = u16::try_from(screen.body.len().saturating_sub(1)).unwrap_or(u16::MAX);
    let body: Vec<Line<'static>> = screen.body.lines.iter().map(to_line).collect();
    frame.render_widget(
        Paragraph::new(body)
            .block(Block::default().borders(Borders::TOP))
            .scroll((screen.scroll.min(max_scroll), 0)),
        chunks[2],
    );

    frame.render_widget(Paragraph::new(to_line(&screen.footer)), chunks[3]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn rendered(screen: &Screen, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| draw(frame, screen)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect()
    }

    fn screen() -> Screen {
        let mut body = PanelContent::new();
        for i in 0..5 {
            body.line(ContentLine::text(format!("row {}", i), Tone::Normal));
        }
        Screen {
            header: ContentLine::text(" monitor · prod", Tone::Heading),
            tabs: ContentLine::text(" 1 Services ", Tone::Heading),
            body,
            footer: ContentLine::text(" q quit", Tone::Muted),
            scroll: 0,
        }
    }

    #[test]
    fn test_layout_rows() {
        let rows = rendered(&screen(), 30, 10);
        assert!(rows[0].starts_with(" monitor · prod"));
        assert!(rows[1].starts_with(" 1 Services"));
        // Row 2 is the body's top border
        assert!(rows[3].starts_with("row 0"));
        assert!(rows[9].starts_with(" q quit"));
    }

    #[test]
    fn test_scroll_is_clamped_to_content() {
        let mut screen = screen();
        screen.scroll = 100;
        let rows = rendered(&screen, 30, 10);
        assert!(rows[3].starts_with("row 4"));
    }

    #[test]
    fn test_tone_styles_differ() {
        assert_ne!(tone_style(Tone::Good), tone_style(Tone::Critical));
        assert_eq!(tone_style(Tone::Normal), Style::default());
    }
}
