use std::cell::RefCell;
use std::rc::Rc;

use anyhow::anyhow;
use futures_util::future;
use loqui_sync::StoreHandle;
use loqui_sync::push::listener::PushListener;
use tracing::{info, warn};

use crate::cli::WatchArgs;
use crate::client::{AppContext, CliError, CliResult, SocketConnector, TokioTimer, timestamp_now_ms};
use crate::output::describe_changes;

/// Print model and connection changes until interrupted.
pub(crate) async fn handle_watch(ctx: &AppContext, args: WatchArgs) -> CliResult<()> {
    let url = ctx.push_url()?;

    let previous = Rc::new(RefCell::new(ctx.store.snapshot()));
    let seen = Rc::clone(&previous);
    ctx.store.subscribe(move |next| {
        let mut prev = seen.borrow_mut();
        for line in describe_changes(&prev, next) {
            println!("{line}");
        }
        *prev = next.clone();
    });

    let models = ctx.models();
    if let Err(err) = models.refresh(timestamp_now_ms()).await {
        warn!(error = %err, "initial model refresh failed");
    }

    let listener = PushListener::new(
        SocketConnector::new(url.clone()),
        TokioTimer,
        ctx.store.clone(),
        ctx.config.reconnect,
    );
    let (handle, listen) = listener.start();
    info!(%url, poll = args.poll, "watching model status");

    let polling = async {
        if args.poll {
            models.run_polling(&TokioTimer).await;
        } else {
            future::pending::<()>().await;
        }
    };

    let outcome = tokio::select! {
        () = listen => Ok(()),
        () = polling => Ok(()),
        signal = tokio::signal::ctrl_c() => signal
            .map_err(|err| CliError::failure(anyhow!("failed to listen for ctrl-c: {err}"))),
    };
    handle.close();
    outcome
}
