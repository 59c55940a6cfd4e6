use hentedag_core::ATTR_PICKUP_FREQUENCY;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
};

use crate::app::App;

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let header = Paragraph::new(format!("hentedag – waste pickups for {}", app.address()))
        .block(Block::default().borders(Borders::ALL).title("Hentedag"));
    frame.render_widget(header, *header_area);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(*content_area);

    let [table_area, detail_area] = content_chunks.as_ref() else {
        return;
    };

    draw_sensor_table(frame, app, *table_area);
    draw_attributes(frame, app, *detail_area);

    // Status bar
    let nav_hint = "↑/↓ move · r refresh now · q/Ctrl-C quit";

    let status_text = if app.is_loading {
        format!("Refreshing… · {nav_hint}")
    } else if let Some(msg) = &app.error_message {
        format!("{msg} · {nav_hint}")
    } else if let Some(polled) = app.last_poll {
        format!(
            "Last poll {} · every {} min · {nav_hint}",
            polled.format("%H:%M:%S"),
            app.poll_interval.as_secs() / 60
        )
    } else {
        nav_hint.to_owned()
    };

    let status_style = if app.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn draw_sensor_table(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let title = "Next pickups (↑/↓)";

    if app.sensors().is_empty() {
        let paragraph = Paragraph::new("No waste categories found for this address.")
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = app.sensors().iter().map(|sensor| {
        let date = sensor
            .pickup_date()
            .map_or_else(|| "–".to_owned(), |date| date.format("%d.%m.%Y").to_string());
        let weekday = sensor
            .pickup_date()
            .map_or_else(String::new, |date| date.format("%a").to_string());
        let relative = sensor
            .days_remaining()
            .map_or_else(|| "no data".to_owned(), relative_day_label);
        let frequency = sensor
            .attributes()
            .get(ATTR_PICKUP_FREQUENCY)
            .cloned()
            .unwrap_or_default();

        let mut style = Style::default().fg(category_color(sensor.category()));
        if sensor.days_remaining().is_some_and(|days| days <= 1) {
            style = style.add_modifier(Modifier::BOLD);
        }

        Row::new(vec![
            Cell::from(sensor.category().to_owned()),
            Cell::from(date),
            Cell::from(weekday),
            Cell::from(relative),
            Cell::from(frequency),
        ])
        .style(style)
    });

    let column_widths = [
        Constraint::Min(14),
        Constraint::Length(12),
        Constraint::Length(5),
        Constraint::Length(12),
        Constraint::Min(12),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Category", "Date", "Day", "In", "Frequency"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .column_spacing(1);

    let mut state = TableState::default();
    state.select(Some(app.selected));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_attributes(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(sensor) = app.selected_sensor() else {
        let paragraph = Paragraph::new("")
            .block(Block::default().borders(Borders::ALL).title("Attributes"));
        frame.render_widget(paragraph, area);
        return;
    };

    let mut lines = sensor
        .attributes()
        .iter()
        .map(|(key, value)| {
            Line::from(vec![
                Span::styled(format!("{key}: "), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(value.clone()),
            ])
        })
        .collect::<Vec<Line<'_>>>();

    let state = sensor.days_remaining().map_or_else(
        || "unknown".to_owned(),
        |days| format!("{days} {}", sensor.unit_of_measurement()),
    );
    lines.push(Line::from(vec![
        Span::styled("state: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(state),
    ]));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Attributes – {}", sensor.category())),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn category_color(category: &str) -> Color {
    let normalized = category.to_lowercase();

    if normalized.contains("rest") {
        Color::Gray
    } else if normalized.contains("mat") || normalized.contains("bio") {
        Color::Green
    } else if normalized.contains("papir") || normalized.contains("papp") {
        Color::Blue
    } else if normalized.contains("plast") {
        Color::Yellow
    } else if normalized.contains("glass") || normalized.contains("metall") {
        Color::Cyan
    } else {
        Color::Magenta
    }
}

fn relative_day_label(delta: i64) -> String {
    match delta {
        0 => "today".to_owned(),
        1 => "tomorrow".to_owned(),
        days if days > 1 => format!("in {days} days"),
        -1 => "yesterday".to_owned(),
        days => format!("{} days ago", days.abs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_relative_days() {
        assert_eq!(relative_day_label(0), "today", "pickup today");
        assert_eq!(relative_day_label(1), "tomorrow", "pickup tomorrow");
        assert_eq!(relative_day_label(3), "in 3 days", "future pickup");
        assert_eq!(relative_day_label(-1), "yesterday", "just missed");
        assert_eq!(relative_day_label(-4), "4 days ago", "overdue");
    }

    #[test]
    fn colors_known_categories() {
        assert_eq!(category_color("Restavfall"), Color::Gray, "residual");
        assert_eq!(category_color("Papir"), Color::Blue, "paper");
        assert_eq!(category_color("Plastemballasje"), Color::Yellow, "plastic");
        assert_eq!(category_color("Hageavfall"), Color::Magenta, "other");
    }
}
