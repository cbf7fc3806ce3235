use super::chart::{ChartData, render_chart};
use super::filter::{DateRange, list_transactions_db, parse_date_range};
use super::pdf_report::save_report;
use super::summary::format_amount;
use super::terminal::with_terminal;
use crate::db::repository;
use crate::error::{Error, Result};
use crate::models::transaction::{
    CATEGORY_SUGGESTIONS, DATE_FORMAT, Transaction, TransactionInput, TransactionKind,
};
use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Rect, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};
use rusqlite::Connection;
use std::cmp::{max, min};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    List,
    Form,
    Filter,
    ConfirmDelete(i64),
    Chart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Date,
    Amount,
    Description,
    Kind,
    Category,
}

impl FormField {
    const ALL: [FormField; 5] = [
        FormField::Date,
        FormField::Amount,
        FormField::Description,
        FormField::Kind,
        FormField::Category,
    ];

    fn position(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn label(self) -> &'static str {
        match self {
            FormField::Date => "Date (YYYY-MM-DD)",
            FormField::Amount => "Amount",
            FormField::Description => "Description",
            FormField::Kind => "Type",
            FormField::Category => "Category",
        }
    }
}

/// The add/edit form. `editing_id` is set while an existing row is being changed.
#[derive(Debug, Clone, PartialEq)]
struct TransactionForm {
    date: String,
    amount: String,
    description: String,
    kind: TransactionKind,
    category: String,
    focus: FormField,
    editing_id: Option<i64>,
}

impl TransactionForm {
    fn blank(today: NaiveDate) -> Self {
        Self {
            date: today.format(DATE_FORMAT).to_string(),
            amount: String::new(),
            description: String::new(),
            kind: TransactionKind::Expense,
            category: String::new(),
            focus: FormField::Date,
            editing_id: None,
        }
    }

    fn from_transaction(tx: &Transaction) -> Self {
        Self {
            date: tx.date.format(DATE_FORMAT).to_string(),
            amount: tx.amount.to_string(),
            description: tx.description.clone(),
            kind: tx.kind,
            category: tx.category.clone(),
            focus: FormField::Date,
            editing_id: Some(tx.id),
        }
    }

    fn to_input(&self) -> Result<TransactionInput> {
        TransactionInput::parse(
            &self.date,
            self.kind.as_str(),
            &self.category,
            &self.amount,
            &self.description,
        )
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Date => Some(&mut self.date),
            FormField::Amount => Some(&mut self.amount),
            FormField::Description => Some(&mut self.description),
            FormField::Category => Some(&mut self.category),
            FormField::Kind => None,
        }
    }

    fn push_char(&mut self, ch: char) {
        match self.focus {
            // Only characters that can appear in a plain decimal number.
            FormField::Amount if !(ch.is_ascii_digit() || ch == '.') => {}
            FormField::Kind => match ch.to_ascii_lowercase() {
                'i' => self.kind = TransactionKind::Income,
                'e' => self.kind = TransactionKind::Expense,
                ' ' => self.kind = self.kind.toggle(),
                _ => {}
            },
            _ => {
                if let Some(text) = self.focused_text() {
                    text.push(ch);
                }
            }
        }
    }

    fn pop_char(&mut self) {
        if let Some(text) = self.focused_text() {
            text.pop();
        }
    }

    /// Left/Right on the kind field flips it; on the category field it steps
    /// through the suggested categories.
    fn cycle(&mut self, forward: bool) {
        match self.focus {
            FormField::Kind => self.kind = self.kind.toggle(),
            FormField::Category => {
                let len = CATEGORY_SUGGESTIONS.len();
                let next = match CATEGORY_SUGGESTIONS
                    .iter()
                    .position(|c| c.eq_ignore_ascii_case(self.category.trim()))
                {
                    Some(i) if forward => (i + 1) % len,
                    Some(i) => (i + len - 1) % len,
                    None if forward => 0,
                    None => len - 1,
                };
                self.category = CATEGORY_SUGGESTIONS[next].to_string();
            }
            _ => {}
        }
    }

    fn value(&self, field: FormField) -> String {
        match field {
            FormField::Date => self.date.clone(),
            FormField::Amount => self.amount.clone(),
            FormField::Description => self.description.clone(),
            FormField::Kind => format!("< {} >", self.kind.label()),
            FormField::Category => self.category.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Status {
    Info(String),
    Error(String),
}

pub struct AppState {
    mode: Mode,
    transactions: Vec<Transaction>,
    table_state: TableState,
    filter: Option<DateRange>,
    filter_buffer: String,
    form: TransactionForm,
    chart: Option<ChartData>,
    status: Option<Status>,
    report_dir: PathBuf,
    today: NaiveDate,
    last_page_size: usize,
}

impl AppState {
    pub fn new(transactions: Vec<Transaction>, report_dir: PathBuf, today: NaiveDate) -> Self {
        let mut state = Self {
            mode: Mode::List,
            transactions: Vec::new(),
            table_state: TableState::default(),
            filter: None,
            filter_buffer: String::new(),
            form: TransactionForm::blank(today),
            chart: None,
            status: None,
            report_dir,
            today,
            last_page_size: 10,
        };
        state.set_transactions(transactions);
        state
    }

    fn set_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
        if self.transactions.is_empty() {
            self.table_state.select(None);
        } else {
            let selected = match self.table_state.selected() {
                Some(sel) => min(sel, self.transactions.len() - 1),
                None => 0,
            };
            self.table_state.select(Some(selected));
        }
    }

    fn selected_transaction(&self) -> Option<&Transaction> {
        self.transactions.get(self.table_state.selected()?)
    }

    fn move_selection(&mut self, delta: i32) {
        if self.transactions.is_empty() {
            self.table_state.select(None);
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as i32;
        let max_index = self.transactions.len().saturating_sub(1) as i32;
        let next = (current + delta).clamp(0, max_index) as usize;
        self.table_state.select(Some(next));
    }

    fn info(&mut self, message: impl Into<String>) {
        self.status = Some(Status::Info(message.into()));
    }

    fn report_error(&mut self, err: &Error) {
        warn!("{}", err);
        self.status = Some(Status::Error(err.to_string()));
    }

    fn reload(&mut self, conn: &Connection) -> Result<()> {
        let transactions = list_transactions_db(conn, self.filter)?;
        self.set_transactions(transactions);
        Ok(())
    }

    fn start_add(&mut self) {
        self.form = TransactionForm::blank(self.today);
        self.mode = Mode::Form;
    }

    fn start_edit(&mut self) -> Result<()> {
        let tx = self
            .selected_transaction()
            .ok_or_else(|| Error::validation("Please select a transaction to edit."))?;
        let form = TransactionForm::from_transaction(tx);
        self.form = form;
        self.mode = Mode::Form;
        Ok(())
    }

    fn cancel_form(&mut self) {
        self.form = TransactionForm::blank(self.today);
        self.mode = Mode::List;
    }

    fn submit_form(&mut self, conn: &Connection) -> Result<()> {
        let input = self.form.to_input()?;
        let message = match self.form.editing_id {
            Some(id) => {
                repository::update_transaction(conn, id, &input)?;
                info!("Updated transaction #{} from the form", id);
                format!("Transaction ID {} updated.", id)
            }
            None => {
                let id = repository::add_transaction(conn, &input)?;
                info!("Recorded transaction #{} from the form", id);
                "Transaction recorded.".to_string()
            }
        };
        self.cancel_form();
        self.reload(conn)?;
        self.info(message);
        Ok(())
    }

    fn request_delete(&mut self) -> Result<()> {
        let id = self
            .selected_transaction()
            .map(|tx| tx.id)
            .ok_or_else(|| Error::validation("Please select a transaction to delete."))?;
        self.mode = Mode::ConfirmDelete(id);
        Ok(())
    }

    fn confirm_delete(&mut self, conn: &Connection, id: i64) -> Result<()> {
        self.mode = Mode::List;
        repository::remove_transaction(conn, id)?;
        info!("Deleted transaction #{} from the list", id);
        self.reload(conn)?;
        self.info("Transaction deleted.");
        Ok(())
    }

    fn start_filter(&mut self) {
        self.filter_buffer = self
            .filter
            .map(|r| {
                format!(
                    "{}..{}",
                    r.start.format(DATE_FORMAT),
                    r.end.format(DATE_FORMAT)
                )
            })
            .unwrap_or_default();
        self.mode = Mode::Filter;
    }

    fn apply_filter(&mut self, conn: &Connection) -> Result<()> {
        let range = parse_date_range(&self.filter_buffer)?;
        self.filter = Some(range);
        self.mode = Mode::List;
        self.reload(conn)?;
        if self.transactions.is_empty() {
            self.info("No transactions found in the selected date range.");
        } else {
            self.info(format!("Displayed {} transactions.", self.transactions.len()));
        }
        Ok(())
    }

    fn clear_filter(&mut self, conn: &Connection) -> Result<()> {
        self.filter = None;
        self.reload(conn)?;
        self.info("Filter cleared.");
        Ok(())
    }

    fn open_chart(&mut self, conn: &Connection) -> Result<()> {
        let all = repository::get_all_transactions(conn)?;
        if all.is_empty() {
            return Err(Error::validation(
                "No transactions found to generate charts.",
            ));
        }
        self.chart = Some(ChartData::from_transactions(&all));
        self.mode = Mode::Chart;
        Ok(())
    }

    fn close_chart(&mut self) {
        self.chart = None;
        self.mode = Mode::List;
    }

    fn save_pdf(&mut self, conn: &Connection) -> Result<()> {
        let path = save_report(conn, None, &self.report_dir)?;
        self.info(format!("PDF report saved as: {}", path.display()));
        Ok(())
    }
}

pub fn run_app(conn: &Connection, report_dir: PathBuf) -> Result<()> {
    let initial = repository::get_all_transactions(conn)?;
    let mut state = AppState::new(initial, report_dir, Local::now().date_naive());

    with_terminal(|terminal| {
        loop {
            terminal
                .draw(|frame| {
                    let size = frame.area();
                    if state.mode == Mode::Chart {
                        if let Some(chart) = state.chart.as_ref() {
                            render_chart(frame, size, chart);
                        }
                        return;
                    }

                    let layout = Layout::default()
                        .direction(Direction::Vertical)
                        .constraints([
                            Constraint::Length(3),
                            Constraint::Min(5),
                            Constraint::Length(4),
                        ])
                        .split(size);

                    render_header(frame, layout[0], &state);
                    render_table(frame, layout[1], &mut state);
                    render_footer(frame, layout[2], &state);

                    match state.mode {
                        Mode::Form => render_form_modal(frame, size, &state.form),
                        Mode::Filter => render_filter_modal(frame, size, &state),
                        Mode::ConfirmDelete(id) => render_confirm_modal(frame, size, id),
                        _ => {}
                    }
                })
                .map_err(|e| Error::Terminal(format!("Failed to draw terminal UI: {}", e)))?;

            if event::poll(std::time::Duration::from_millis(200))
                .map_err(|e| Error::Terminal(format!("Failed to poll input: {}", e)))?
            {
                let event = event::read()
                    .map_err(|e| Error::Terminal(format!("Failed to read input: {}", e)))?;
                if let Event::Key(key) = event {
                    if handle_key(conn, &mut state, key) {
                        break;
                    }
                }
            }
        }
        Ok(())
    })
}

/// Applies one key press. Returns `true` when the user asked to quit.
///
/// Failures of individual actions land in the status line; none of them end the loop.
fn handle_key(conn: &Connection, state: &mut AppState, key: KeyEvent) -> bool {
    // Many terminals emit both a Press and a Release event. Only act on Press/Repeat.
    if key.kind == KeyEventKind::Release {
        return false;
    }

    let result = match state.mode {
        Mode::List => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                state.move_selection(-1);
                Ok(())
            }
            KeyCode::Down => {
                state.move_selection(1);
                Ok(())
            }
            KeyCode::PageUp => {
                state.move_selection(-(max(1, state.last_page_size) as i32));
                Ok(())
            }
            KeyCode::PageDown => {
                state.move_selection(max(1, state.last_page_size) as i32);
                Ok(())
            }
            KeyCode::Home => {
                if !state.transactions.is_empty() {
                    state.table_state.select(Some(0));
                }
                Ok(())
            }
            KeyCode::End => {
                if !state.transactions.is_empty() {
                    state
                        .table_state
                        .select(Some(state.transactions.len() - 1));
                }
                Ok(())
            }
            KeyCode::Char('a') => {
                state.start_add();
                Ok(())
            }
            KeyCode::Char('e') | KeyCode::Enter => state.start_edit(),
            KeyCode::Char('d') | KeyCode::Delete => state.request_delete(),
            KeyCode::Char('f') => {
                state.start_filter();
                Ok(())
            }
            KeyCode::Char('x') => state.clear_filter(conn),
            KeyCode::Char('v') => state.open_chart(conn),
            KeyCode::Char('p') => state.save_pdf(conn),
            KeyCode::Char('r') => state.reload(conn),
            _ => Ok(()),
        },
        Mode::Form => {
            // Allow Ctrl+C / Ctrl+Q to cancel
            if key.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
            {
                state.cancel_form();
                return false;
            }
            match key.code {
                KeyCode::Enter => state.submit_form(conn),
                code => {
                    match code {
                        KeyCode::Esc => state.cancel_form(),
                        KeyCode::Tab | KeyCode::Down => state.form.focus = state.form.focus.next(),
                        KeyCode::BackTab | KeyCode::Up => {
                            state.form.focus = state.form.focus.prev()
                        }
                        KeyCode::Left => state.form.cycle(false),
                        KeyCode::Right => state.form.cycle(true),
                        KeyCode::Backspace => state.form.pop_char(),
                        KeyCode::Char(ch) => state.form.push_char(ch),
                        _ => {}
                    }
                    Ok(())
                }
            }
        }
        Mode::Filter => match key.code {
            KeyCode::Enter => state.apply_filter(conn),
            code => {
                match code {
                    KeyCode::Esc => state.mode = Mode::List,
                    KeyCode::Backspace => {
                        state.filter_buffer.pop();
                    }
                    KeyCode::Char(ch) => state.filter_buffer.push(ch),
                    _ => {}
                }
                Ok(())
            }
        },
        Mode::ConfirmDelete(id) => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                state.confirm_delete(conn, id)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.mode = Mode::List;
                Ok(())
            }
            _ => Ok(()),
        },
        Mode::Chart => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b')) {
                state.close_chart();
            }
            Ok(())
        }
    };

    if let Err(err) = result {
        state.report_error(&err);
    }
    false
}

fn render_header(frame: &mut ratatui::Frame, area: Rect, state: &AppState) {
    let range = state
        .filter
        .map(|r| {
            format!(
                "{}..{}",
                r.start.format(DATE_FORMAT),
                r.end.format(DATE_FORMAT)
            )
        })
        .unwrap_or_else(|| "(all dates)".to_string());

    let line = Line::from(vec![
        Span::styled(
            "Personal Expense Tracker",
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::raw("  |  "),
        Span::raw(format!("Date: {}", range)),
        Span::raw("  |  "),
        Span::raw(format!("Rows: {}", state.transactions.len())),
    ]);

    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(line).block(block).alignment(Alignment::Left),
        area,
    );
}

fn render_footer(frame: &mut ratatui::Frame, area: Rect, state: &AppState) {
    let hint = match state.mode {
        Mode::List => "a add  e edit  d delete  f filter  x clear filter  v chart  p save PDF  r reload  q quit",
        Mode::Form => "Tab/↑/↓ field  ←/→ type & category  Enter save  Esc cancel",
        Mode::Filter => "Type range, Enter apply, Esc cancel",
        Mode::ConfirmDelete(_) => "y confirm  n cancel",
        Mode::Chart => "Esc/q/b back",
    };

    let status = match &state.status {
        Some(Status::Info(msg)) => Span::styled(msg.clone(), Style::default().fg(Color::Green)),
        Some(Status::Error(msg)) => Span::styled(msg.clone(), Style::default().fg(Color::Red)),
        None => Span::raw(""),
    };

    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(vec![Line::from(hint), Line::from(status)])
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_table(frame: &mut ratatui::Frame, area: Rect, state: &mut AppState) {
    let block = Block::default()
        .title("Transaction History")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let header = Row::new([
        Cell::from("Id").style(Style::default().bold()),
        Cell::from("Date").style(Style::default().bold()),
        Cell::from("Type").style(Style::default().bold()),
        Cell::from("Category").style(Style::default().bold()),
        Cell::from("Amount").style(Style::default().bold()),
        Cell::from("Description").style(Style::default().bold()),
    ])
    .style(Style::default().fg(Color::White));

    let rows = state.transactions.iter().map(|tx| {
        let amount_style = match tx.kind {
            TransactionKind::Income => Style::default().fg(Color::Green),
            TransactionKind::Expense => Style::default().fg(Color::Red),
        };
        Row::new([
            Cell::from(tx.id.to_string()),
            Cell::from(tx.date.format(DATE_FORMAT).to_string()),
            Cell::from(tx.kind.label()),
            Cell::from(tx.category.clone()),
            Cell::from(format_amount(tx.amount)).style(amount_style),
            Cell::from(tx.description.clone()),
        ])
    });

    // Leave room for the header row.
    state.last_page_size = max(1, inner.height.saturating_sub(2) as usize);

    let widths = [
        Constraint::Length(6),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(14),
        Constraint::Length(12),
        Constraint::Min(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White).bold())
        .highlight_symbol("➤ ")
        .column_spacing(1);

    frame.render_stateful_widget(table, inner, &mut state.table_state);

    if state.transactions.is_empty() {
        let message = if state.filter.is_some() {
            "No transactions found in the selected date range"
        } else {
            "No transactions yet. Press 'a' to add one"
        };
        frame.render_widget(
            Paragraph::new(message)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray)),
            inner,
        );
    }
}

fn render_form_modal(frame: &mut ratatui::Frame, area: Rect, form: &TransactionForm) {
    let popup_area = centered_rect(70, 60, area);
    frame.render_widget(Clear, popup_area);

    let title = match form.editing_id {
        Some(id) => format!("Update Transaction #{}", id),
        None => "New Transaction".to_string(),
    };

    let mut lines = vec![
        Line::from(Span::styled(title.clone(), Style::default().fg(Color::Cyan).bold())),
        Line::from(""),
    ];
    for field in FormField::ALL {
        let focused = field == form.focus;
        let marker = if focused { "➤ " } else { "  " };
        let value_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{:20}", field.label()), Style::default().bold()),
            Span::styled(form.value(field), value_style),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Suggested categories: {}", CATEGORY_SUGGESTIONS.join(", ")),
        Style::default().fg(Color::DarkGray),
    )));

    let block = Block::default().borders(Borders::ALL).title(title);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false }),
        popup_area,
    );
}

fn render_filter_modal(frame: &mut ratatui::Frame, area: Rect, state: &AppState) {
    let popup_area = centered_rect(80, 30, area);
    frame.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from(Span::styled("Filter By Date", Style::default().bold())),
        Line::from("Enter range like 2025-01-01..2025-01-31 (both ends inclusive)"),
        Line::from(""),
        Line::from(Span::styled(
            format!("> {}", state.filter_buffer),
            Style::default().fg(Color::Yellow),
        )),
    ];

    let block = Block::default().borders(Borders::ALL).title("Input");
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true }),
        popup_area,
    );
}

fn render_confirm_modal(frame: &mut ratatui::Frame, area: Rect, id: i64) {
    let popup_area = centered_rect(50, 20, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default().borders(Borders::ALL).title("Confirm Delete");
    frame.render_widget(
        Paragraph::new(format!(
            "Are you sure you want to delete Transaction ID: {}? (y/n)",
            id
        ))
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true }),
        popup_area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
