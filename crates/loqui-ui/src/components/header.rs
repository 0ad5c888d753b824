use crate::logic::connection_badge;
use crate::store::UiStore;
use yew::prelude::*;
use yewdux::prelude::use_selector;

#[function_component(Header)]
pub(crate) fn header() -> Html {
    let device = use_selector(|store: &UiStore| store.app.device.clone());
    let connection = use_selector(|store: &UiStore| store.app.connection.clone());
    let (class, label) = connection_badge(&connection);
    let title = connection.last_error.clone().unwrap_or_default();

    html! {
        <header class="app-header">
            <h1>{"Loqui"}</h1>
            <div class="header-meta">
                {(*device).as_ref().map_or_else(Html::default, |device| html! {
                    <span class="badge device" title={device.name.clone()}>{device.label.clone()}</span>
                })}
                <span class={classes!("badge", class)} {title}>{label}</span>
            </div>
        </header>
    }
}
