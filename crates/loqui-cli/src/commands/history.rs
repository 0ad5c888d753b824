use loqui_sync::features::history::state;
use loqui_sync::{StoreHandle, TtsApi};

use crate::cli::{HistoryClearArgs, HistoryDeleteArgs, HistoryListArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_history;

pub(crate) async fn handle_history_list(
    ctx: &AppContext,
    args: HistoryListArgs,
    format: OutputFormat,
) -> CliResult<()> {
    if args.limit == 0 {
        return Err(CliError::validation("--limit must be greater than zero"));
    }
    let page = ctx.api.history(args.limit, args.offset).await?;
    ctx.store
        .reduce(|store| state::set_page(&mut store.history, page.items, page.total));
    let history = ctx.store.read(|store| store.history.clone());
    render_history(&history, args.offset, format)
}

pub(crate) async fn handle_history_delete(
    ctx: &AppContext,
    args: HistoryDeleteArgs,
) -> CliResult<()> {
    let id = args.id.trim();
    if id.is_empty() {
        return Err(CliError::validation("id must not be empty"));
    }
    ctx.history().delete_entry(id).await?;
    println!("Deleted {id}");
    Ok(())
}

pub(crate) async fn handle_history_clear(
    ctx: &AppContext,
    args: HistoryClearArgs,
) -> CliResult<()> {
    if !args.yes {
        return Err(CliError::validation(
            "clearing history cannot be undone; pass --yes to confirm",
        ));
    }
    let deleted = ctx.history().clear_all().await?;
    println!("Deleted {deleted} generation(s)");
    Ok(())
}
