use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph, Sparkline},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::forecast::ForecastResult;
use crate::run::MonthReport;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, month_label, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Summary cards
            Constraint::Length(8), // Forecast and savings
            Constraint::Min(8),    // Category split
            Constraint::Length(4), // Daily sparkline
        ])
        .split(area);

    render_summary_cards(f, chunks[0], app);

    let Some(report) = app.report.as_ref() else {
        return;
    };

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);
    render_forecast_panel(f, middle[0], app, report);
    render_savings_panel(f, middle[1], report);

    render_category_chart(f, chunks[2], app);
    render_daily_sparkline(f, chunks[3], app);
}

fn panel(title: impl Into<String>) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            format!(" {} ", title.into()),
            Style::default()
                .fg(theme::TEXT_DIM)
                .add_modifier(Modifier::BOLD),
        ))
}

fn render_summary_cards(f: &mut Frame, area: Rect, app: &App) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(area);

    let spent = app
        .report
        .as_ref()
        .map_or(Decimal::ZERO, |r| r.spent_so_far);
    let month_count = app.daily.iter().filter(|d| !d.is_zero()).count();

    render_card(
        f,
        cards[0],
        "Today",
        format_amount(app.today_total),
        theme::ACCENT,
        app.today.format("%a %d %b").to_string(),
    );
    render_card(
        f,
        cards[1],
        &month_label(app.year, app.month),
        format_amount(spent),
        theme::YELLOW,
        format!("{month_count} days with spending"),
    );

    match app.settings().monthly_budget {
        Some(budget) => {
            let left = budget.checked_sub(spent).unwrap_or(Decimal::MIN);
            let color = if left < Decimal::ZERO {
                theme::RED
            } else {
                theme::GREEN
            };
            render_card(
                f,
                cards[2],
                "Budget Left",
                format_amount(left),
                color,
                format!("of {}", format_amount(budget)),
            );
        }
        None => render_card(
            f,
            cards[2],
            "Budget",
            "not set".into(),
            theme::TEXT_DIM,
            ":budget <amount>".into(),
        ),
    }
}

fn render_card(f: &mut Frame, area: Rect, title: &str, value: String, color: Color, subtitle: String) {
    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(subtitle, theme::dim_style())),
    ])
    .centered()
    .block(panel(title));

    f.render_widget(text, area);
}

fn render_forecast_panel(f: &mut Frame, area: Rect, app: &App, report: &MonthReport) {
    let block = panel("Month-End Forecast");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(inner);

    let style = theme::forecast_style(&report.forecast);
    let mut lines = match &report.forecast {
        ForecastResult::Ok {
            predicted_total,
            model_name,
            ..
        } => vec![
            Line::from(vec![
                Span::styled("Predicted total  ", theme::dim_style()),
                Span::styled(
                    format_amount(*predicted_total),
                    style.add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("Model            ", theme::dim_style()),
                Span::styled(*model_name, theme::normal_style()),
            ]),
        ],
        ForecastResult::InsufficientData {
            days_collected,
            non_zero_days,
        } => {
            let threshold = report.settings.forecast_threshold_days;
            vec![
                Line::from(Span::styled("Not enough data yet", style)),
                Line::from(Span::styled(
                    format!(
                        "{days_collected} of {threshold} days, {non_zero_days} with spending"
                    ),
                    theme::dim_style(),
                )),
            ]
        }
        ForecastResult::NoData => vec![Line::from(Span::styled(
            "No expenses recorded yet. Add one with :add",
            style,
        ))],
        ForecastResult::Error { message } => vec![Line::from(Span::styled(
            format!("Forecast failed: {message}"),
            style,
        ))],
    };

    let outlook = &report.outlook;
    match outlook.budget_left {
        Some(left) if outlook.over_budget() => lines.push(Line::from(Span::styled(
            format!("Over budget by {}", format_amount(left.abs())),
            theme::over_budget_style(),
        ))),
        Some(left) => lines.push(Line::from(Span::styled(
            format!("On track, {} to spare", format_amount(left)),
            theme::on_track_style(),
        ))),
        None => {
            if let Some(upgrade) = app.upgrade_model {
                lines.push(Line::from(Span::styled(
                    format!("Upgrade model: {upgrade}"),
                    theme::dim_style(),
                )));
            }
        }
    }
    f.render_widget(Paragraph::new(lines), rows[0]);

    if let Some(ratio) = outlook.budget_ratio {
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(theme::ratio_color(ratio, outlook.over_budget())))
            .ratio(ratio)
            .label(format!("{:.0}% of budget", ratio * 100.0));
        f.render_widget(gauge, rows[1]);
    }
}

fn render_savings_panel(f: &mut Frame, area: Rect, report: &MonthReport) {
    let block = panel("Savings");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(inner);

    let outlook = &report.outlook;
    let Some(savings) = outlook.predicted_savings else {
        let msg = Paragraph::new(vec![
            Line::from(Span::styled("Income not set", theme::dim_style())),
            Line::from(Span::styled(":income <amount>", theme::dim_style())),
        ]);
        f.render_widget(msg, rows[0]);
        return;
    };

    let savings_style = if savings < Decimal::ZERO {
        theme::over_budget_style()
    } else {
        theme::on_track_style()
    };
    let label = if outlook.has_forecast {
        "Predicted savings  "
    } else {
        "Savings so far     "
    };
    let mut lines = vec![Line::from(vec![
        Span::styled(label, theme::dim_style()),
        Span::styled(format_amount(savings), savings_style.add_modifier(Modifier::BOLD)),
    ])];
    match report.settings.savings_goal {
        Some(goal) if savings >= goal => lines.push(Line::from(Span::styled(
            format!("Goal of {} reached", format_amount(goal)),
            theme::on_track_style(),
        ))),
        Some(goal) => lines.push(Line::from(Span::styled(
            format!(
                "{} short of {}",
                format_amount(goal.checked_sub(savings).unwrap_or(Decimal::MAX)),
                format_amount(goal)
            ),
            theme::warning_style(),
        ))),
        None => lines.push(Line::from(Span::styled(
            "No goal set (:goal <amount>)",
            theme::dim_style(),
        ))),
    }
    f.render_widget(Paragraph::new(lines), rows[0]);

    if let Some(ratio) = outlook.savings_ratio {
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(theme::GREEN))
            .ratio(ratio)
            .label(format!("{:.0}% of goal", ratio * 100.0));
        f.render_widget(gauge, rows[1]);
    }
}

fn render_category_chart(f: &mut Frame, area: Rect, app: &App) {
    if app.spending_by_category.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No expenses for this month. Add one with :add or import a CSV with :import",
            theme::dim_style(),
        )))
        .centered()
        .block(panel("Spending by Category"));
        f.render_widget(msg, area);
        return;
    }

    let total = app
        .spending_by_category
        .iter()
        .try_fold(Decimal::ZERO, |total, (_, amt)| total.checked_add(*amt))
        .unwrap_or(Decimal::MAX);
    let bars: Vec<Bar> = app
        .spending_by_category
        .iter()
        .take(10)
        .enumerate()
        .map(|(i, (name, amt))| {
            let share = amt
                .checked_mul(Decimal::ONE_HUNDRED)
                .and_then(|scaled| scaled.checked_div(total))
                .map_or(Decimal::ZERO, |share| share.round());
            let color = theme::CATEGORY_COLORS[i % theme::CATEGORY_COLORS.len()];
            Bar::default()
                .value(amt.to_u64().unwrap_or(0))
                .text_value(format!("{share}%"))
                .label(Line::from(truncate(name, 10)))
                .style(Style::default().fg(color))
                .value_style(
                    Style::default()
                        .fg(theme::HEADER_BG)
                        .bg(color)
                        .add_modifier(Modifier::BOLD),
                )
        })
        .collect();

    let chart = BarChart::default()
        .block(panel(format!("Spending by Category ({})", format_amount(total))))
        .data(BarGroup::default().bars(&bars))
        .bar_width(10)
        .bar_gap(1);

    f.render_widget(chart, area);
}

fn render_daily_sparkline(f: &mut Frame, area: Rect, app: &App) {
    let data: Vec<u64> = app
        .daily
        .iter()
        .map(|d| d.to_u64().unwrap_or(0))
        .collect();
    let peak = app.daily.iter().copied().max().unwrap_or_default();

    let sparkline = Sparkline::default()
        .block(panel(format!("Daily Spend (peak {})", format_amount(peak))))
        .data(&data)
        .style(Style::default().fg(theme::YELLOW));

    f.render_widget(sparkline, area);
}
