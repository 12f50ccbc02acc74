use crate::api::Mode;
use crate::commands::{connect, Out};
use crate::dashboard::{Dashboard, DashboardState};
use crate::model::Month;
use crate::{Config, Result};
use std::fmt::Write;

/// Loads the dashboard for `month`, or the current month.
pub async fn dashboard(
    config: Config,
    mode: Mode,
    month: Option<Month>,
) -> Result<Out<DashboardState>> {
    let (session, api) = connect(&config, mode).await?;
    let mut dashboard = Dashboard::new(
        api,
        session,
        month.unwrap_or_default(),
        config.category_concurrency(),
    );
    dashboard.load().await?;
    let state = dashboard.into_state();
    Ok(Out::new(render(&state), state))
}

/// The dashboard as text.
pub(super) fn render(state: &DashboardState) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "Dashboard for {}", state.month);
    let lines = [
        ("Total income", state.total_income.with_commas()),
        ("Total expense", state.total_expense.with_commas()),
        ("Cash in hand", state.cash_in_hand().with_commas()),
        ("Transactions", state.no_of_transactions.to_string()),
        ("Budget", state.budget.with_commas()),
    ];
    for (label, value) in lines {
        let _ = writeln!(s, "  {label:<16}{value:>16}");
    }
    if state.category_summary.is_empty() {
        let _ = write!(s, "  No spending by category");
    } else {
        let _ = write!(s, "  Spending by category:");
        for category in &state.category_summary {
            let _ = write!(
                s,
                "\n    {:<14}{:>16}",
                category.name,
                category.amount.with_commas()
            );
        }
    }
    if state.is_error {
        let _ = write!(s, "\n  Some totals could not be loaded, see the log for details");
    }
    s
}
