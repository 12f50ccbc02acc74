use crate::api::Mode;
use crate::args::ExportArgs;
use crate::commands::{connect, Out};
use crate::export::{Exported, NOTHING_TO_EXPORT};
use crate::transactions::TransactionList;
use crate::{Config, Result};
use tracing::warn;

/// Exports every transaction matching the filters into the configured export directory.
///
/// Pressing Ctrl-C stops the export after the page being fetched; nothing is written in that
/// case.
pub async fn export(config: Config, mode: Mode, args: ExportArgs) -> Result<Out<Exported>> {
    let (session, api) = connect(&config, mode).await?;
    let list = TransactionList::new(
        api,
        session,
        config.page_size(),
        config.export_batch_size(),
    )
    .with_query(args.filters().query(config.page_size()));

    let job = list.start_export(args.format())?;
    let cancel = job.cancel_handle();
    let dir = config.export_dir();
    let run = job.run(&dir);
    tokio::pin!(run);

    let exported = tokio::select! {
        result = &mut run => result?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Cancelling the export");
            cancel.cancel();
            run.await?
        }
    };

    let message = match &exported {
        Exported::Written(path) => format!("Exported transactions to {}", path.display()),
        Exported::NothingToExport => NOTHING_TO_EXPORT.to_string(),
    };
    Ok(Out::new(message, exported))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{SortDirection, TypeFilter};
    use crate::args::FilterArgs;
    use crate::export::ExportFormat;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_export_pdf() {
        let env = TestEnv::new().await;
        let args = ExportArgs::new(ExportFormat::Pdf, FilterArgs::default());
        let out = export(env.config(), Mode::Test, args).await.unwrap();
        let Some(Exported::Written(path)) = out.structure() else {
            panic!("expected a file, got {:?}", out.structure());
        };
        assert!(path.starts_with(env.config().export_dir()));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("transactions_history_"));
    }

    #[tokio::test]
    async fn test_export_nothing() {
        let env = TestEnv::new().await;
        let filters = FilterArgs::new(
            Some("no such thing".to_string()),
            "date",
            SortDirection::Desc,
            TypeFilter::All,
        );
        let args = ExportArgs::new(ExportFormat::Excel, filters);
        let out = export(env.config(), Mode::Test, args).await.unwrap();
        assert_eq!(out.message(), "No transactions to export");
        assert!(!env.config().export_dir().exists());
    }
}
