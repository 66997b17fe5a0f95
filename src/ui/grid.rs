//! Step grid UI component.
//!
//! Renders the 16x16 pattern as rows of toggle buttons, one row per
//! instrument, with the instrument name on the left.

use iced::widget::{button, column, container, row, text, Column, Row};
use iced::{Background, Border, Color, Element, Length, Theme};

use beatbox::instrument::INSTRUMENTS;
use beatbox::pattern::{Pattern, STEP_COUNT};

const NAME_WIDTH: f32 = 120.0;
const CELL_SIZE: f32 = 24.0;

/// Cell colors. Every fourth step is tinted to mark the beat.
fn cell_color(on: bool, step: usize) -> Color {
    match (on, step % 4 == 0) {
        (true, _) => Color::from_rgb(0.9, 0.55, 0.1), // Orange
        (false, true) => Color::from_rgb(0.22, 0.22, 0.22),
        (false, false) => Color::from_rgb(0.15, 0.15, 0.15),
    }
}

fn label_color() -> Color {
    Color::from_rgb(0.8, 0.8, 0.8)
}

fn view_cell<'a, M: 'a + Clone>(on: bool, step: usize, on_press: M) -> Element<'a, M> {
    let bg = cell_color(on, step);
    button(text(""))
        .on_press(on_press)
        .width(Length::Fixed(CELL_SIZE))
        .height(Length::Fixed(CELL_SIZE))
        .style(move |_theme, _status| button::Style {
            background: Some(Background::Color(bg)),
            border: Border::default().rounded(3),
            ..Default::default()
        })
        .into()
}

fn view_row<'a, M: 'a + Clone>(
    instrument: usize,
    steps: &[bool; STEP_COUNT],
    on_toggle: impl Fn(usize, usize) -> M + 'a + Copy,
) -> Element<'a, M> {
    let name = INSTRUMENTS[instrument].name;
    let cells: Vec<Element<'a, M>> = steps
        .iter()
        .enumerate()
        .map(|(step, &on)| view_cell(on, step, on_toggle(instrument, step)))
        .collect();

    row![
        container(text(name).size(12).color(label_color()))
            .width(Length::Fixed(NAME_WIDTH))
            .center_y(Length::Fixed(CELL_SIZE)),
        Row::with_children(cells).spacing(2),
    ]
    .spacing(4)
    .into()
}

/// Build the complete grid.
///
/// `on_toggle(instrument, step)` produces the message sent when a cell is
/// clicked.
pub fn view_grid<'a, M: 'a + Clone>(
    pattern: &Pattern,
    on_toggle: impl Fn(usize, usize) -> M + 'a + Copy,
) -> Element<'a, M> {
    let rows: Vec<Element<'a, M>> = (0..INSTRUMENTS.len())
        .map(|i| view_row(i, pattern.row(i), on_toggle))
        .collect();

    container(column![Column::with_children(rows).spacing(2)].padding(8))
        .style(|_theme: &Theme| container::Style {
            background: Some(Background::Color(Color::from_rgb(0.08, 0.08, 0.08))),
            border: Border::default().rounded(2),
            ..Default::default()
        })
        .into()
}
