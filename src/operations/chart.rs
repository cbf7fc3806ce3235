use super::summary::{
    CategoryShare, Summary, category_shares, expense_breakdown_by_category, format_amount,
    summarize,
};
use super::terminal::with_terminal;
use crate::db::repository;
use crate::error::{Error, Result};
use crate::models::transaction::{Transaction, TransactionKind};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Rect, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use rusqlite::Connection;

const PALETTE: [Color; 11] = [
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::Blue,
    Color::Red,
    Color::LightCyan,
    Color::LightMagenta,
    Color::LightYellow,
    Color::LightGreen,
    Color::LightBlue,
];

pub struct ChartData {
    pub summary: Summary,
    pub shares: Vec<CategoryShare>,
    pub expense_rows: usize,
}

impl ChartData {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        Self {
            summary: summarize(transactions),
            shares: category_shares(&expense_breakdown_by_category(transactions)),
            expense_rows: transactions
                .iter()
                .filter(|t| t.kind == TransactionKind::Expense)
                .count(),
        }
    }

    /// Shown in place of the pie when there is nothing to slice.
    fn empty_message(&self) -> &'static str {
        if self.expense_rows == 0 {
            "No expenses recorded to create a pie chart."
        } else {
            "Expenses total 0.00; nothing to chart."
        }
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Total Income: {} | Total Expense: {} | Net Balance: {}",
            format_amount(self.summary.total_income),
            format_amount(self.summary.total_expense),
            format_amount(self.summary.net_balance)
        )
    }

    /// `Category NN.N%` labels in slice order.
    pub fn labels(&self) -> Vec<String> {
        self.shares
            .iter()
            .map(|share| format!("{} {:.1}%", share.category, share.percent))
            .collect()
    }

    fn color(&self, index: usize) -> Color {
        PALETTE[index % PALETTE.len()]
    }
}

/// Full-screen chart over every stored transaction; `q` or `Esc` closes it.
pub fn run_chart(conn: &Connection) -> Result<()> {
    let transactions = repository::get_all_transactions(conn)?;
    if transactions.is_empty() {
        return Err(Error::validation(
            "No transactions found to generate charts.",
        ));
    }
    let data = ChartData::from_transactions(&transactions);

    with_terminal(|terminal| {
        loop {
            terminal
                .draw(|frame| render_chart(frame, frame.area(), &data))
                .map_err(|e| Error::Terminal(format!("Failed to draw terminal UI: {}", e)))?;

            if event::poll(std::time::Duration::from_millis(250))
                .map_err(|e| Error::Terminal(format!("Failed to poll input: {}", e)))?
            {
                match event::read()
                    .map_err(|e| Error::Terminal(format!("Failed to read input: {}", e)))?
                {
                    Event::Key(key) if key.kind == KeyEventKind::Release => {}
                    Event::Key(key) if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) => {
                        break;
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    })
}

pub fn render_chart(frame: &mut ratatui::Frame, area: Rect, data: &ChartData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    let summary = Paragraph::new(Line::from(Span::styled(
        data.summary_line(),
        Style::default().fg(Color::White).bold(),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .title("Financial Summary  (q/Esc to close)")
            .borders(Borders::ALL),
    );
    frame.render_widget(summary, layout[0]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(layout[1]);

    render_pie_chart(frame, bottom[0], data);
    render_legend(frame, bottom[1], data);
}

fn render_pie_chart(frame: &mut ratatui::Frame, area: Rect, data: &ChartData) {
    let block = Block::default()
        .title("Expense Breakdown by Category")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if data.shares.is_empty() {
        let empty = Paragraph::new(data.empty_message()).alignment(Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    }

    // Slices start at 12 o'clock and run counter-clockwise.
    let mut slices = Vec::new();
    let mut start_angle = std::f64::consts::FRAC_PI_2;
    for ((index, share), label) in data.shares.iter().enumerate().zip(data.labels()) {
        let sweep = share.percent / 100.0 * std::f64::consts::TAU;
        slices.push((start_angle, start_angle + sweep, data.color(index), label));
        start_angle += sweep;
    }

    let canvas = Canvas::default()
        .x_bounds([-1.0, 1.0])
        .y_bounds([-1.0, 1.0])
        .paint(|ctx| {
            for (start, end, color, _) in &slices {
                let mut points = Vec::new();
                let mut r = 0.0;
                while r <= 1.0 {
                    let mut angle = *start;
                    while angle <= *end {
                        points.push((r * angle.cos(), r * angle.sin()));
                        angle += 0.05;
                    }
                    r += 0.04;
                }
                if !points.is_empty() {
                    ctx.draw(&Points {
                        coords: &points,
                        color: *color,
                    });
                }
            }
            ctx.layer();
            for (start, end, _, label) in &slices {
                let middle = (start + end) / 2.0;
                ctx.print(
                    0.6 * middle.cos(),
                    0.6 * middle.sin(),
                    Span::styled(label.clone(), Style::default().fg(Color::White).bold()),
                );
            }
        });

    frame.render_widget(canvas, inner);
}

fn render_legend(frame: &mut ratatui::Frame, area: Rect, data: &ChartData) {
    let block = Block::default().title("Category Spend").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if data.shares.is_empty() {
        frame.render_widget(
            Paragraph::new(data.empty_message()).alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{:15}", "Category"), Style::default().bold()),
        Span::raw("  "),
        Span::styled(format!("{:>12}", "Amount"), Style::default().bold()),
        Span::raw("  "),
        Span::styled(format!("{:>6}", "Share"), Style::default().bold()),
    ])];

    for (index, share) in data.shares.iter().enumerate() {
        let style = Style::default().fg(data.color(index));
        lines.push(Line::from(vec![
            Span::styled(format!("{:15}", share.category), style),
            Span::raw("  "),
            Span::styled(format!("{:>12}", format_amount(share.amount)), style),
            Span::raw("  "),
            Span::styled(format!("{:>5.1}%", share.percent), style),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Left), inner);
}
