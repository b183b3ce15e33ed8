use chrono::Datelike;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::models::Frequency;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, month_label, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(area);

    render_bill_table(f, chunks[0], app);
    render_pending(f, chunks[1], app);
}

fn block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            title,
            Style::default()
                .fg(theme::TEXT_DIM)
                .add_modifier(Modifier::BOLD),
        ))
}

fn render_bill_table(f: &mut Frame, area: Rect, app: &App) {
    let block = block(format!(" Recurring Bills ({}) ", app.bills.len()));

    if app.bills.is_empty() {
        let msg = vec![
            Line::from(""),
            Line::from(Span::styled("No recurring bills", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Add one with :bill <name> <amount> <category> [--weekly] [--day N]",
                theme::dim_style(),
            )),
        ];
        f.render_widget(Paragraph::new(msg).centered().block(block), area);
        return;
    }

    let header_cells = ["Name", "Category", "Amount", "Every", "Due", "Last applied"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .bills
        .iter()
        .enumerate()
        .skip(app.bill_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, bill)| {
            let style = if i == app.bill_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            let due = match bill.frequency {
                Frequency::Monthly => format!("day {}", bill.day_of_month),
                Frequency::Weekly => format!("{}s", bill.start_date.weekday()),
            };
            let applied = if bill.applied_in(app.year, app.month) {
                Span::styled(bill.last_applied.clone(), theme::on_track_style())
            } else if bill.last_applied.is_empty() {
                Span::styled("never", theme::dim_style())
            } else {
                Span::styled(bill.last_applied.clone(), theme::warning_style())
            };

            Row::new(vec![
                Cell::from(truncate(&bill.name, 24)),
                Cell::from(truncate(&bill.category, 18)),
                Cell::from(format_amount(bill.amount)),
                Cell::from(bill.frequency.as_str()),
                Cell::from(due),
                Cell::from(applied),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(16),
        Constraint::Length(18),
        Constraint::Length(14),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(13),
    ];

    let table = Table::new(rows, widths).header(header).block(block);
    f.render_widget(table, area);
}

fn render_pending(f: &mut Frame, area: Rect, app: &App) {
    let label = month_label(app.year, app.month);
    let line = if app.unapplied_rows == 0 {
        Line::from(Span::styled(
            format!("All bills applied for {label}"),
            theme::on_track_style(),
        ))
    } else {
        Line::from(vec![
            Span::styled(
                format!(
                    "{} row(s) totalling {} not yet applied to {label}. ",
                    app.unapplied_rows,
                    format_amount(app.unapplied_total)
                ),
                theme::warning_style(),
            ),
            Span::styled("Run :apply", theme::dim_style()),
        ])
    };
    f.render_widget(Paragraph::new(line).block(block(" This Month ".into())), area);
}
