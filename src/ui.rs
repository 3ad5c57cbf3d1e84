use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::{
    app::App,
    clock::Clock,
    session::{DetectionStatus, SessionView},
    stopwatch::StopwatchPhase,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let view = self.session.view();

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints(
                [
                    Constraint::Length(1),
                    Constraint::Min(3),
                    Constraint::Length(2),
                    Constraint::Length(2),
                    Constraint::Length(2),
                ]
                .as_ref(),
            )
            .split(area);

        // status
        let status_style = match view.status {
            DetectionStatus::Unavailable(_) => Style::default().fg(Color::Yellow),
            _ => dim_style,
        };
        let mut status = vec![Span::styled(view.status.to_string(), status_style)];
        if let Some(pose) = self.head_pose() {
            status.push(Span::styled(
                format!("  simulated head: {}", pose),
                italic_style,
            ));
        }
        Paragraph::new(Line::from(status))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        // clock
        let clock_style = match view.phase {
            StopwatchPhase::Running => green_bold_style,
            StopwatchPhase::Paused => Style::default().patch(bold_style).fg(Color::Yellow),
            StopwatchPhase::Idle => bold_style,
        };
        let started = view
            .started_at
            .map(|t| format!(" started {} ", t.format("%H:%M")))
            .unwrap_or_default();
        Paragraph::new(vec![
            Line::from(Span::styled(view.elapsed.clone(), clock_style)),
            Line::from(Span::styled(view.phase.to_string(), dim_style)),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(started))
        .render(chunks[1], buf);

        // focus verdict
        let focus_line = if matches!(view.status, DetectionStatus::Unavailable(_)) {
            Line::from(Span::styled("focus unknown", dim_style))
        } else if view.focused {
            Line::from(Span::styled("FOCUSED", green_bold_style))
        } else {
            Line::from(Span::styled("DISTRACTED", red_bold_style))
        };
        Paragraph::new(focus_line)
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        durations(&view).render(chunks[3], buf);
        hints(&view, self.head.is_some()).render(chunks[4], buf);
    }
}

fn durations(view: &SessionView) -> Paragraph<'static> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    Paragraph::new(Line::from(vec![
        Span::raw("focused "),
        Span::styled(view.focused_time.clone(), bold_style.fg(Color::Green)),
        Span::raw("   distracted "),
        Span::styled(view.distracted_time.clone(), bold_style.fg(Color::Red)),
        Span::raw("   "),
        Span::styled(format!("{}% focus", view.focus_percentage), bold_style),
        Span::raw(format!("   auto-paused {}x", view.auto_pauses)),
    ]))
    .alignment(Alignment::Center)
}

fn hints(view: &SessionView, simulated: bool) -> Paragraph<'static> {
    let on = Style::default().fg(Color::Magenta);
    let off = Style::default().add_modifier(Modifier::DIM);
    let pick = |enabled: bool| if enabled { on } else { off };

    let mut spans = vec![
        Span::styled("(s)tart", pick(view.can_start)),
        Span::raw(" / "),
        Span::styled(
            format!("(p) {}", view.pause_label.to_lowercase()),
            pick(view.can_pause),
        ),
        Span::raw(" / "),
        Span::styled("(r)eset", pick(view.can_reset)),
    ];
    if simulated {
        spans.push(Span::raw(" / "));
        spans.push(Span::styled("(f) tilt head / (d) leave desk", on));
    }
    spans.push(Span::raw(" / "));
    spans.push(Span::styled("(q)uit", on));

    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}
