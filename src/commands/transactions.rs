use crate::api::{Mode, TransactionPage};
use crate::args::ListArgs;
use crate::commands::{connect, Out};
use crate::export::format_date;
use crate::transactions::TransactionList;
use crate::{Config, Result};
use std::fmt::Write;

/// Shows one page of transactions.
pub async fn transactions(
    config: Config,
    mode: Mode,
    args: ListArgs,
) -> Result<Out<TransactionPage>> {
    let (session, api) = connect(&config, mode).await?;
    let page_size = args.size().unwrap_or_else(|| config.page_size());
    let mut list = TransactionList::new(api, session, page_size, config.export_batch_size())
        .with_query(args.filters().query(page_size));
    list.refresh().await?;
    if args.page() > 1 {
        list.go_to_page(args.page()).await?;
    }
    Ok(Out::new(render(&list), list.page().clone()))
}

fn render(list: &TransactionList) -> String {
    let mut s = list.page_info();
    for group in list.page().data.iter() {
        let _ = write!(s, "\n{}", format_date(group.label()));
        for t in group.transactions() {
            let _ = write!(
                s,
                "\n  {:<8} {:<16} {:<30} {:>14}",
                t.transaction_type.label(),
                t.category_name.as_deref().unwrap_or("N/A"),
                t.description.as_deref().unwrap_or("N/A"),
                t.amount.rupees()
            );
        }
    }
    let _ = write!(
        s,
        "\nPage {} of {}",
        list.page_number(),
        list.total_pages().max(1)
    );
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{SortDirection, TypeFilter};
    use crate::args::FilterArgs;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_transactions_command() {
        let env = TestEnv::new().await;
        let args = ListArgs::new(2, Some(5), FilterArgs::default());
        let out = transactions(env.config(), Mode::Test, args).await.unwrap();
        assert!(out.message().starts_with("Showing 6-10 of 16"));
        assert!(out.message().ends_with("Page 2 of 4"));
        assert_eq!(out.structure().unwrap().data.record_count(), 5);
    }

    #[tokio::test]
    async fn test_transactions_filtered() {
        let env = TestEnv::new().await;
        let filters = FilterArgs::new(None, "amount", SortDirection::Desc, TypeFilter::Income);
        let out = transactions(env.config(), Mode::Test, ListArgs::new(1, None, filters))
            .await
            .unwrap();
        assert!(out.message().starts_with("Showing 1-3 of 3"));
        assert!(out.message().contains("1 October 2025"));
        assert!(out.message().contains("Rs. 250000.00"));
    }

    #[tokio::test]
    async fn test_page_out_of_range() {
        let env = TestEnv::new().await;
        let args = ListArgs::new(9, Some(5), FilterArgs::default());
        assert!(transactions(env.config(), Mode::Test, args).await.is_err());
    }
}
