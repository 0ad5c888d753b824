//! App shell: wiring, background loops, and layout.
//!
//! # Design
//! - One API client, one store handle, and one push listener per boot.
//! - Poll loops and the listener are abortable and stop when the shell unmounts.
//! - Components reach controllers through [`UiCtx`] and read state with
//!   `use_selector` so unrelated updates do not re-render them.

mod api;
mod preferences;
mod push;
mod timer;

use crate::components::generate::GeneratePanel;
use crate::components::header::Header;
use crate::components::history::HistoryPanel;
use crate::components::models::ModelPanel;
use crate::components::stats::StatsPanel;
use crate::components::toast::ToastHost;
use crate::models::{Panel, ToastKind, ToastQueue};
use crate::store::DispatchHandle;
pub(crate) use api::GlooApi;
use futures_util::future::{AbortHandle, abortable};
use gloo::console;
use loqui_sync::features::generation::GenerationController;
use loqui_sync::features::history::HistorySync;
use loqui_sync::features::models::ModelSync;
use loqui_sync::features::system::SystemSync;
use loqui_sync::push::listener::PushListener;
use loqui_sync::{SyncConfig, Timer};
use push::WsConnector;
use std::rc::Rc;
pub(crate) use timer::BrowserTimer;
use yew::prelude::*;

/// Controllers and notification hook shared with every component.
#[derive(Clone)]
pub(crate) struct UiCtx {
    pub(crate) api: Rc<GlooApi>,
    pub(crate) store: DispatchHandle,
    pub(crate) config: SyncConfig,
    notify: Callback<(ToastKind, String)>,
}

impl PartialEq for UiCtx {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.api, &other.api)
            && self.config == other.config
            && self.notify == other.notify
    }
}

impl UiCtx {
    pub(crate) fn models(&self) -> ModelSync<GlooApi, DispatchHandle> {
        ModelSync::new(Rc::clone(&self.api), self.store.clone(), &self.config)
    }

    pub(crate) fn history(&self) -> HistorySync<GlooApi, DispatchHandle> {
        HistorySync::new(
            Rc::clone(&self.api),
            self.store.clone(),
            self.config.history_page_size,
        )
    }

    pub(crate) fn generation(&self) -> GenerationController<GlooApi, DispatchHandle> {
        GenerationController::new(Rc::clone(&self.api), self.store.clone(), self.history())
    }

    pub(crate) fn system(&self) -> SystemSync<GlooApi, DispatchHandle> {
        SystemSync::new(
            Rc::clone(&self.api),
            self.store.clone(),
            self.config.system_poll_interval_ms,
        )
    }

    pub(crate) fn now_ms(&self) -> u64 {
        BrowserTimer.now_ms()
    }

    pub(crate) fn toast(&self, kind: ToastKind, message: impl Into<String>) {
        self.notify.emit((kind, message.into()));
    }

    pub(crate) fn error(&self, message: impl Into<String>) {
        self.toast(ToastKind::Error, message);
    }
}

/// Messages for the toast reducer.
pub(crate) enum ToastAction {
    Push(ToastKind, String),
    Dismiss(u64),
}

impl Reducible for ToastQueue {
    type Action = ToastAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            ToastAction::Push(kind, message) => {
                next.push(kind, message);
            }
            ToastAction::Dismiss(id) => next.dismiss(id),
        }
        Rc::new(next)
    }
}

/// Mount the app into the document body.
pub fn run_app() {
    console_error_panic_hook::set_once();
    yew::Renderer::<LoquiApp>::new().render();
}

#[function_component(LoquiApp)]
fn loqui_app() -> Html {
    let toasts = use_reducer(ToastQueue::default);
    let panel = use_state(Panel::default);
    let ctx = {
        let dispatcher = toasts.dispatcher();
        use_memo(
            move |()| {
                let mut config = SyncConfig::default();
                config.api_base = preferences::api_base_url();
                UiCtx {
                    api: Rc::new(GlooApi::new(config.api_base.clone())),
                    store: DispatchHandle::new(),
                    config,
                    notify: Callback::from(move |(kind, message)| {
                        dispatcher.dispatch(ToastAction::Push(kind, message));
                    }),
                }
            },
            (),
        )
    };

    {
        let ctx = (*ctx).clone();
        use_effect_with_deps(
            move |()| {
                let history = ctx.history();
                let notify = ctx.clone();
                yew::platform::spawn_local(async move {
                    if let Err(err) = history.refresh().await {
                        notify.error(format!("Could not load history: {err}"));
                    }
                });

                let models = ctx.models();
                let system = ctx.system();
                let loops = [
                    spawn_abortable(async move { models.run_polling(&BrowserTimer).await }),
                    spawn_abortable(async move { system.run_polling(&BrowserTimer).await }),
                ];

                let push_url = preferences::push_url(&ctx.config.api_base);
                console::log!(format!("push channel: {push_url}"));
                let (listener, run) = PushListener::new(
                    WsConnector::new(push_url),
                    BrowserTimer,
                    ctx.store.clone(),
                    ctx.config.reconnect,
                )
                .start();
                yew::platform::spawn_local(run);

                move || {
                    listener.close();
                    for handle in loops {
                        handle.abort();
                    }
                }
            },
            (),
        );
    }

    let on_dismiss = {
        let dispatcher = toasts.dispatcher();
        Callback::from(move |id: u64| dispatcher.dispatch(ToastAction::Dismiss(id)))
    };

    let tabs = Panel::all().into_iter().map(|tab| {
        let panel = panel.clone();
        let active = *panel == tab;
        let onclick = Callback::from(move |_| panel.set(tab));
        html! {
            <button class={classes!("tab", active.then_some("active"))} {onclick}>{tab.label()}</button>
        }
    });

    let body = match *panel {
        Panel::Generate => html! { <GeneratePanel /> },
        Panel::History => html! { <HistoryPanel /> },
        Panel::Stats => html! { <StatsPanel /> },
    };

    html! {
        <ContextProvider<UiCtx> context={(*ctx).clone()}>
            <div class="loqui">
                <Header />
                <main class="layout">
                    <aside class="sidebar"><ModelPanel /></aside>
                    <section class="content">
                        <nav class="tabs">{for tabs}</nav>
                        {body}
                    </section>
                </main>
                <ToastHost toasts={toasts.items().to_vec()} {on_dismiss} />
            </div>
        </ContextProvider<UiCtx>>
    }
}

fn spawn_abortable<F>(task: F) -> AbortHandle
where
    F: std::future::Future<Output = ()> + 'static,
{
    let (task, handle) = abortable(task);
    yew::platform::spawn_local(async move {
        let _ = task.await;
    });
    handle
}
