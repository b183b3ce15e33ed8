use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, month_label, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let title = format!(
        " Expenses, {} ({}) ",
        month_label(app.year, app.month),
        app.expenses.len()
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            title,
            Style::default()
                .fg(theme::TEXT_DIM)
                .add_modifier(Modifier::BOLD),
        ));

    if app.expenses.is_empty() {
        let msg = vec![
            Line::from(""),
            Line::from(Span::styled(
                "No expenses for this month",
                theme::dim_style(),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Add one with :add <amount> <category> or import a CSV with :import",
                theme::dim_style(),
            )),
        ];
        f.render_widget(Paragraph::new(msg).centered().block(block), area);
        return;
    }

    let header_cells = ["Date", "Category", "Amount", "Payment", "Notes"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .expenses
        .iter()
        .enumerate()
        .skip(app.expense_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, expense)| {
            let style = if i == app.expense_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            let date_cell = if expense.is_recurring {
                format!("\u{21bb} {}", expense.date)
            } else {
                format!("  {}", expense.date)
            };

            Row::new(vec![
                Cell::from(date_cell),
                Cell::from(truncate(&expense.category, 18)),
                Cell::from(format_amount(expense.amount)),
                Cell::from(expense.payment_type.as_str()),
                Cell::from(truncate(&expense.notes, 40)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(14),
        Constraint::Length(18),
        Constraint::Length(14),
        Constraint::Length(10),
        Constraint::Min(20),
    ];

    let table = Table::new(rows, widths).header(header).block(block);
    f.render_widget(table, area);
}
