//! Frame rendering
//!
//! Draws a [`View`] snapshot. Nothing here reads or mutates dashboard state.

use crate::app::{Row as ViewRow, View};
use crate::config::UiStrings;
use crate::icons::Icons;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Paragraph, Row, Table};
use ratatui::Frame;
use tw_core::Counters;

const ACCENT: Color = Color::Indexed(99);
const DIM: Color = Color::Indexed(241);
const CURSOR_BG: Color = Color::Indexed(236);
const COUNTER_WIDTH: u16 = 5;

/// Static presentation choices
#[derive(Debug, Clone)]
pub struct Theme {
    pub icons: Icons,
    pub strings: UiStrings,
}

impl Theme {
    pub fn new(icons: Icons, strings: UiStrings) -> Self {
        Self { icons, strings }
    }

    fn title(&self) -> Line<'static> {
        Line::from(vec![
            Span::styled(" tea", Style::new().fg(ACCENT).add_modifier(Modifier::BOLD)),
            Span::styled(self.icons.app, Style::new().fg(ACCENT)),
            Span::styled("watch", Style::new().fg(ACCENT).add_modifier(Modifier::BOLD)),
        ])
    }
}

/// Draw one frame
pub fn draw(frame: &mut Frame, view: &View<'_>, theme: &Theme) {
    let area = frame.area();

    if view.visible_total == 0 && view.filter.is_none() {
        draw_empty(frame, area, view, theme);
        return;
    }

    let [header, rule, body, footer, error] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(view.viewport as u16),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    draw_header(frame, header, theme);
    frame.render_widget(
        Paragraph::new("─".repeat(rule.width as usize)).style(Style::new().fg(ACCENT)),
        rule,
    );
    draw_rows(frame, body, view, theme);
    draw_footer(frame, footer, view, theme);

    if let Some(err) = &view.tally.last_error {
        frame.render_widget(
            Paragraph::new(format!("{}{}", theme.strings.error_prefix, err))
                .style(Style::new().fg(Color::Red)),
            error,
        );
    }
}

fn column_widths() -> [Constraint; 6] {
    let c = Constraint::Length(COUNTER_WIDTH);
    [Constraint::Fill(1), c, c, c, c, c]
}

fn draw_header(frame: &mut Frame, area: Rect, theme: &Theme) {
    let mut cells = vec![Cell::from(theme.title())];
    cells.extend(
        theme
            .icons
            .columns()
            .into_iter()
            .map(|icon| Cell::from(Line::from(icon).centered())),
    );

    let table = Table::new([Row::new(cells)], column_widths())
        .column_spacing(0)
        .style(Style::new().add_modifier(Modifier::BOLD));
    frame.render_widget(table, area);
}

fn draw_rows(frame: &mut Frame, area: Rect, view: &View<'_>, theme: &Theme) {
    let rows = view.rows.iter().map(|row| table_row(row, theme));
    let table = Table::new(rows, column_widths()).column_spacing(0);
    frame.render_widget(table, area);
}

fn table_row<'a>(row: &ViewRow<'_>, theme: &Theme) -> Row<'a> {
    let entry = row.entry;
    let icon = if entry.is_dir {
        theme.icons.folder
    } else {
        theme.icons.file
    };

    let mut name_style = Style::new();
    if entry.deleted {
        name_style = name_style.fg(DIM).add_modifier(Modifier::CROSSED_OUT);
    }
    if row.recent {
        name_style = name_style.add_modifier(Modifier::BOLD);
    }

    let name = Line::from(vec![
        Span::raw("  ".repeat(row.depth)),
        Span::raw(format!("{} ", icon)),
        Span::styled(row.name.clone(), name_style),
    ]);

    let mut cells = vec![Cell::from(name)];
    cells.extend(counter_cells(&entry.counts));

    let mut style = Style::new();
    if row.selected {
        style = style.bg(CURSOR_BG).add_modifier(Modifier::BOLD);
    }
    Row::new(cells).style(style)
}

/// Counter columns in header order; zero renders blank
fn counter_cells<'a>(counts: &Counters) -> Vec<Cell<'a>> {
    [counts.create, counts.write, counts.remove, counts.rename, counts.chmod]
        .into_iter()
        .map(|n| {
            let text = if n == 0 { String::new() } else { n.to_string() };
            Cell::from(Line::from(text).centered())
        })
        .collect()
}

fn draw_footer(frame: &mut Frame, area: Rect, view: &View<'_>, theme: &Theme) {
    let strings = &theme.strings;
    let help = Style::new().fg(DIM);

    let left = match view.filter {
        Some(text) => {
            let caret = if view.blink_on { "_" } else { " " };
            Line::from(vec![
                Span::styled(strings.filter_prompt.clone(), Style::new().fg(ACCENT)),
                Span::raw(text.to_string()),
                Span::raw(caret),
            ])
        }
        None => Line::from(Span::styled(
            format!(
                "{} {}: {} | {} | {} | {}",
                theme.icons.total,
                strings.total_events,
                view.tally.total_events,
                strings.help_nav,
                strings.help_filter,
                strings.help_quit
            ),
            help,
        )),
    };

    let (start, end) = view.page();
    let right = Line::from(Span::styled(
        format!(
            "{} {}: {} | {}-{}/{} ",
            theme.icons.atomic,
            strings.atomic_events,
            view.tally.atomic_events,
            start,
            end,
            view.visible_total
        ),
        help,
    ))
    .right_aligned();

    let [left_area, right_area] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(right.width() as u16)])
            .areas(area);
    frame.render_widget(Paragraph::new(left), left_area);
    frame.render_widget(Paragraph::new(right), right_area);
}

fn draw_empty(frame: &mut Frame, area: Rect, view: &View<'_>, theme: &Theme) {
    let mut title = theme.title();
    title.push_span(Span::raw(format!(
        " {} {}...",
        theme.strings.monitoring,
        view.root.display()
    )));

    let mut lines = vec![
        title,
        Line::from(Span::styled(
            theme.strings.empty_dir.clone(),
            Style::new().fg(DIM),
        )),
    ];
    if let Some(err) = &view.tally.last_error {
        lines.push(Line::from(Span::styled(
            format!("{}{}", theme.strings.error_prefix, err),
            Style::new().fg(Color::Red),
        )));
    }
    frame.render_widget(Paragraph::new(lines), area);
}
