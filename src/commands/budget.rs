use crate::api::Mode;
use crate::commands::{connect, Out};
use crate::dashboard::{Dashboard, DashboardState};
use crate::model::{Amount, Month};
use crate::{Config, Result};
use anyhow::bail;

/// Sets the budget for the current month and reloads the dashboard so the new budget shows next
/// to the month's spending.
pub async fn budget_set(config: Config, mode: Mode, amount: Amount) -> Result<Out<DashboardState>> {
    let (session, api) = connect(&config, mode).await?;
    let mut dashboard = Dashboard::new(
        api,
        session,
        Month::current(),
        config.category_concurrency(),
    );
    dashboard.save_budget(amount).await?;
    if dashboard.state().is_error {
        bail!("The budget could not be saved, see the log for details");
    }
    dashboard.load().await?;
    let state = dashboard.into_state();
    let message = format!(
        "Budget for {} set to {}\n{}",
        state.month,
        state.budget.with_commas(),
        super::dashboard::render(&state)
    );
    Ok(Out::new(message, state))
}
