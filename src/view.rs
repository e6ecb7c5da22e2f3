//! Plain-text rendering of the form for the terminal front end.

use crate::form::{Action, FormState, RatioRow, Row, Ticker, UiStatus};

/// Editable table with 1-based row numbers, as typed in commands.
pub fn render_rows(rows: &[Row]) -> String {
    let name_width = column_width("Name", rows.iter().map(|r| r.name.chars().count()));
    let email_width = column_width("Email", rows.iter().map(|r| r.email.chars().count()));

    let mut out = String::new();
    out.push_str(&format!(
        "{:>3}  {:<name_width$}  {:<email_width$}  {}\n",
        "#", "Name", "Email", "Age"
    ));
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}  {:<name_width$}  {:<email_width$}  {}\n",
            i + 1,
            row.name,
            row.email,
            row.age
        ));
    }
    if rows.is_empty() {
        out.push_str("     (no rows)\n");
    }
    out
}

fn column_width(header: &str, cells: impl Iterator<Item = usize>) -> usize {
    cells.fold(header.len(), usize::max)
}

/// Ratio table with the ticker heading, one `year | ratio` line per row.
pub fn render_ratios(ticker: &Ticker, ratios: &[RatioRow]) -> String {
    let mut out = format!("Debt-to-Equity Ratio: {ticker}\nYear | Debt-to-Equity\n");
    for ratio in ratios {
        out.push_str(&format!("{} | {}\n", ratio.year, ratio.debt_to_equity));
    }
    out
}

/// Status line: the pending action's label while loading, then the error if
/// any.
pub fn render_status(status: &UiStatus, pending: Option<Action>) -> Option<String> {
    if status.loading {
        let label = pending.map_or("Loading...", |action| action.loading_label());
        Some(label.to_string())
    } else if !status.error.is_empty() {
        Some(format!("Error: {}", status.error))
    } else {
        None
    }
}

pub fn render_form(form: &FormState) -> String {
    let mut out = render_rows(form.rows());
    if let Some(ticker) = form.ratio_ticker() {
        out.push('\n');
        out.push_str(&render_ratios(ticker, form.ratios()));
    }
    if let Some(status) = render_status(form.status(), form.pending()) {
        out.push('\n');
        out.push_str(&status);
        out.push('\n');
    }
    out
}
