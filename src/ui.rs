use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

use crate::config::Theme;
use crate::game::{Failure, FailureCause, Key, Snapshot};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const KEYCAP_GAP: &str = " ";

struct Palette {
    fg: Color,
    bg: Color,
    accent: Color,
    pressed: Color,
    danger: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            fg: Color::White,
            bg: Color::Reset,
            accent: Color::Cyan,
            pressed: Color::Green,
            danger: Color::Red,
        },
        Theme::Light => Palette {
            fg: Color::Black,
            bg: Color::White,
            accent: Color::Blue,
            pressed: Color::Rgb(0, 128, 0),
            danger: Color::Rgb(190, 0, 0),
        },
    }
}

/// Renders one frame of the game from a snapshot
pub struct GameView<'a> {
    pub snapshot: &'a Snapshot,
    pub theme: Theme,
    /// False when the terminal cannot report key releases
    pub release_events: bool,
}

impl<'a> GameView<'a> {
    pub fn new(snapshot: &'a Snapshot, theme: Theme) -> Self {
        Self {
            snapshot,
            theme,
            release_events: true,
        }
    }
}

fn upper(c: char) -> String {
    c.to_uppercase().to_string()
}

fn key_label(key: Key) -> String {
    match key {
        Key::Enter => "ENTER".to_string(),
        Key::Char(c) => upper(c),
        Key::Named(name) => name.to_uppercase(),
    }
}

/// Sequence as shown to the player: upper-cased, space separated
pub fn display_sequence(sequence: &str) -> String {
    sequence.chars().map(upper).join(" ")
}

pub fn failure_message(failure: &Failure) -> String {
    match failure.cause {
        FailureCause::WrongInput {
            pressed,
            expected: Some(expected),
        } => format!(
            "Wrong key! You pressed {} instead of {}.",
            key_label(pressed),
            upper(expected)
        ),
        FailureCause::WrongInput {
            pressed,
            expected: None,
        } => format!("Wrong key! {} is not in the sequence.", key_label(pressed)),
        FailureCause::LetGo { released } => {
            format!("You let go of {} too early!", upper(released))
        }
        FailureCause::TimedOut => "Time's up!".to_string(),
    }
}

/// Three text rows drawing a bordered keycap per character
fn keycap_lines(snapshot: &Snapshot, normal: Style, pressed: Style) -> Vec<Line<'static>> {
    let mut rows: [Vec<Span<'static>>; 3] = Default::default();

    for (idx, (c, is_pressed)) in snapshot.keycaps().enumerate() {
        let style = if is_pressed { pressed } else { normal };
        if idx > 0 {
            rows.iter_mut().for_each(|r| r.push(Span::raw(KEYCAP_GAP)));
        }
        rows[0].push(Span::styled("┌───┐", style));
        rows[1].push(Span::styled(format!("│ {} │", upper(c)), style));
        rows[2].push(Span::styled("└───┘", style));
    }

    rows.into_iter().map(Line::from).collect()
}

impl Widget for GameView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = palette(self.theme);
        let snap = self.snapshot;

        // styles
        let base_style = Style::default().fg(colors.fg).bg(colors.bg);
        let bold_style = base_style.add_modifier(Modifier::BOLD);
        let accent_style = bold_style.fg(colors.accent);
        let pressed_style = bold_style.fg(colors.pressed);
        let danger_style = bold_style.fg(colors.danger);
        let dim_style = base_style.add_modifier(Modifier::DIM);
        let italic_style = base_style.add_modifier(Modifier::ITALIC);

        Block::default().style(base_style).render(area, buf);

        let body: Vec<Line> = if snap.running {
            let mut lines = vec![
                Line::from(Span::styled(format!("Level {}", snap.level), accent_style)),
                Line::default(),
            ];
            lines.extend(keycap_lines(snap, bold_style, pressed_style));
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("{}s", snap.seconds_remaining),
                dim_style,
            )));
            lines
        } else {
            let mut lines = Vec::new();
            if let Some(failure) = &snap.failure {
                lines.push(Line::from(Span::styled(
                    failure_message(failure),
                    danger_style,
                )));
                lines.push(Line::from(Span::styled(
                    format!(
                        "Lost at level {} on {}",
                        failure.level,
                        display_sequence(&failure.sequence)
                    ),
                    dim_style,
                )));
                lines.push(Line::default());
            } else if snap.level > 1 {
                lines.push(Line::from(Span::styled(
                    format!("Level {} cleared!", snap.level - 1),
                    pressed_style,
                )));
                lines.push(Line::default());
            }

            if snap.level == 1 {
                lines.push(Line::from(Span::styled("Rules:", bold_style)));
                lines.push(Line::from(Span::styled(
                    "- Press each key you see from left to right without letting go of any of them.",
                    base_style,
                )));
                lines.push(Line::from(Span::styled(
                    "- If needed, feel free to use other parts of your body than your fingers.",
                    base_style,
                )));
                lines.push(Line::default());
            }

            if !self.release_events {
                lines.push(Line::from(Span::styled(
                    "This terminal does not report key releases or repeats: letting go early goes unnoticed.",
                    italic_style,
                )));
                lines.push(Line::default());
            }

            lines.push(Line::from(Span::styled(
                format!("Best: level {}", snap.best_score),
                accent_style,
            )));
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("PRESS ENTER TO START", bold_style)));
            lines
        };

        let body_height = body.len() as u16;
        let top_padding = area
            .height
            .saturating_sub(body_height + VERTICAL_MARGIN * 2 + 1)
            / 2;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(top_padding),
                Constraint::Length(body_height),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        Paragraph::new(body)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false })
            .render(chunks[1], buf);

        let legend = if snap.running {
            "hold every key · (esc)ape"
        } else {
            "(enter) start / (tab) theme / (esc)ape"
        };
        Paragraph::new(Span::styled(legend, italic_style)).render(chunks[3], buf);
    }
}
