//! These structs provide the CLI interface for the pockit CLI.

use crate::api::{SortDirection, TransactionQuery, TypeFilter, DEFAULT_SORT_FIELD};
use crate::export::ExportFormat;
use crate::model::{Amount, Month};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// pockit: A command-line client for the MyPockit expense tracker.
///
/// Shows the monthly dashboard (income, expense, cash in hand, spending by category and budget),
/// lists transactions page by page and exports the complete, filtered transaction history to PDF
/// or Excel.
///
/// Run `pockit init --api-url <URL>` once, then `pockit login` with the id, email and token of
/// your MyPockit account.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and initialize the configuration file.
    ///
    /// This is the first command you should run. By default the home directory is $HOME/pockit,
    /// pass --pockit-home if you want it somewhere else.
    Init(InitArgs),
    /// Store the session of your MyPockit account.
    Login(LoginArgs),
    /// Forget the stored session.
    Logout,
    /// Show totals, cash in hand, spending by category and the budget for a month.
    Dashboard(DashboardArgs),
    /// Manage the monthly budget.
    Budget(BudgetArgs),
    /// List one page of transactions.
    Transactions(ListArgs),
    /// Export every transaction matching the filters to a PDF or Excel file.
    Export(ExportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the pockit configuration and session are held. Defaults to ~/pockit
    #[arg(long, env = "POCKIT_HOME", default_value_t = default_pockit_home())]
    pockit_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, pockit_home: PathBuf) -> Self {
        Self {
            log_level,
            pockit_home: pockit_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn pockit_home(&self) -> &DisplayPath {
        &self.pockit_home
    }
}

/// (Not shown): Args for the `pockit init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The base URL of the MyPockit backend, e.g. http://localhost:8080
    #[arg(long)]
    api_url: String,
}

impl InitArgs {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// (Not shown): Args for the `pockit login` command.
#[derive(Debug, Parser, Clone)]
pub struct LoginArgs {
    /// Your MyPockit user id.
    #[arg(long)]
    id: i64,

    /// The email address of your MyPockit account.
    #[arg(long)]
    email: String,

    /// The bearer token issued when you signed in to MyPockit.
    #[arg(long, env = "POCKIT_TOKEN", hide_env_values = true)]
    token: String,
}

impl LoginArgs {
    pub fn new(id: i64, email: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            token: token.into(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// (Not shown): Args for the `pockit dashboard` command.
#[derive(Debug, Parser, Clone)]
pub struct DashboardArgs {
    /// The month to show, e.g. 2025-10. Defaults to the current month.
    #[arg(long)]
    month: Option<Month>,
}

impl DashboardArgs {
    pub fn new(month: Option<Month>) -> Self {
        Self { month }
    }

    pub fn month(&self) -> Option<Month> {
        self.month
    }
}

/// (Not shown): Args for the `pockit budget` command.
#[derive(Debug, Parser, Clone)]
pub struct BudgetArgs {
    #[command(subcommand)]
    command: BudgetCommand,
}

impl BudgetArgs {
    pub fn new(command: BudgetCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &BudgetCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum BudgetCommand {
    /// Set the budget for the current month.
    Set(BudgetSetArgs),
}

/// (Not shown): Args for the `pockit budget set` command.
#[derive(Debug, Parser, Clone)]
pub struct BudgetSetArgs {
    /// The amount, e.g. 25000 or 25,000.00
    amount: Amount,
}

impl BudgetSetArgs {
    pub fn new(amount: Amount) -> Self {
        Self { amount }
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }
}

/// Filters and sort order shared by `pockit transactions` and `pockit export`.
#[derive(Debug, Parser, Clone, Default)]
pub struct FilterArgs {
    /// Only show transactions whose description or category contains this text.
    #[arg(long)]
    search: Option<String>,

    /// The field to sort by, e.g. date, amount or description.
    #[arg(long, default_value = DEFAULT_SORT_FIELD)]
    sort_field: String,

    /// The sort direction.
    #[arg(long, value_enum, default_value_t = SortDirection::Desc)]
    sort_dir: SortDirection,

    /// Only show one type of transaction.
    #[arg(long = "type", value_enum, default_value_t = TypeFilter::All)]
    type_filter: TypeFilter,
}

impl FilterArgs {
    pub fn new(
        search: Option<String>,
        sort_field: impl Into<String>,
        sort_dir: SortDirection,
        type_filter: TypeFilter,
    ) -> Self {
        Self {
            search,
            sort_field: sort_field.into(),
            sort_dir,
            type_filter,
        }
    }

    /// A query for page 1 with these filters.
    pub fn query(&self, page_size: u32) -> TransactionQuery {
        TransactionQuery {
            search_key: self.search.clone().unwrap_or_default(),
            sort_field: self.sort_field.clone(),
            sort_direction: self.sort_dir,
            type_filter: self.type_filter,
            ..TransactionQuery::new(page_size)
        }
    }
}

/// (Not shown): Args for the `pockit transactions` command.
#[derive(Debug, Parser, Clone)]
pub struct ListArgs {
    /// The page to show, starting at 1.
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Transactions per page. Defaults to page_size in the config file.
    #[arg(long)]
    size: Option<u32>,

    #[clap(flatten)]
    filters: FilterArgs,
}

impl ListArgs {
    pub fn new(page: u32, size: Option<u32>, filters: FilterArgs) -> Self {
        Self {
            page,
            size,
            filters,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> Option<u32> {
        self.size
    }

    pub fn filters(&self) -> &FilterArgs {
        &self.filters
    }
}

/// (Not shown): Args for the `pockit export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    /// The file format: pdf or excel
    #[arg(value_enum)]
    format: ExportFormat,

    #[clap(flatten)]
    filters: FilterArgs,
}

impl ExportArgs {
    pub fn new(format: ExportFormat, filters: FilterArgs) -> Self {
        Self { format, filters }
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    pub fn filters(&self) -> &FilterArgs {
        &self.filters
    }
}

fn default_pockit_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("pockit"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --pockit-home or POCKIT_HOME instead of relying on the default \
                pockit home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("pockit")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
