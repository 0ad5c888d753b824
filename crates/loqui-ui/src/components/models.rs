use crate::app::UiCtx;
use crate::logic::{can_load, status_badge};
use crate::store::UiStore;
use loqui_api_models::{ModelState, ModelStatus, ModelVariant};
use loqui_sync::catalog;
use loqui_sync::features::models::state::{loaded_variant, ordered};
use yew::prelude::*;
use yewdux::prelude::use_selector;

#[function_component(ModelPanel)]
pub(crate) fn model_panel() -> Html {
    let ctx = use_context::<UiCtx>();
    let models = use_selector(|store: &UiStore| store.app.models.clone());
    let Some(ctx) = ctx else {
        return Html::default();
    };

    let on_load = {
        let ctx = ctx.clone();
        Callback::from(move |variant: ModelVariant| {
            let ctx = ctx.clone();
            yew::platform::spawn_local(async move {
                let label = catalog::variant_label(&variant);
                if let Err(err) = ctx.models().select_and_load(&variant, ctx.now_ms()).await {
                    ctx.error(format!("Could not load {label}: {err}"));
                }
            });
        })
    };
    let on_select = {
        let ctx = ctx.clone();
        Callback::from(move |variant: ModelVariant| ctx.models().select(&variant))
    };
    let on_unload = {
        let ctx = ctx.clone();
        Callback::from(move |_| {
            let ctx = ctx.clone();
            yew::platform::spawn_local(async move {
                if let Err(err) = ctx.models().shutdown(ctx.now_ms()).await {
                    ctx.error(format!("Could not unload the model: {err}"));
                }
            });
        })
    };

    let any_loaded = loaded_variant(&models).is_some();
    html! {
        <div class="model-panel">
            <h2>{"Models"}</h2>
            <ul class="model-list">
                {for ordered(&models).into_iter().map(|model| {
                    render_model(model, model.variant == models.selected, &on_load, &on_select)
                })}
            </ul>
            if any_loaded {
                <button class="ghost" onclick={on_unload}>{"Unload model"}</button>
            }
        </div>
    }
}

fn render_model(
    model: &ModelState,
    selected: bool,
    on_load: &Callback<ModelVariant>,
    on_select: &Callback<ModelVariant>,
) -> Html {
    let info = catalog::variant_info(&model.variant);
    let (badge_class, badge_label) = status_badge(model);
    let select = {
        let on_select = on_select.clone();
        let variant = model.variant.clone();
        Callback::from(move |_| on_select.emit(variant.clone()))
    };
    let load = {
        let on_load = on_load.clone();
        let variant = model.variant.clone();
        Callback::from(move |event: MouseEvent| {
            event.stop_propagation();
            on_load.emit(variant.clone());
        })
    };
    let downloading = model.status == ModelStatus::Downloading && model.download_progress > 0.0;

    html! {
        <li class={classes!("model", selected.then_some("selected"))} onclick={select}>
            <div class="model-head">
                <strong>{catalog::variant_label(&model.variant)}</strong>
                <span class={classes!("badge", badge_class)}>{badge_label}</span>
            </div>
            {info.map_or_else(Html::default, |info| html! {
                <p class="muted">{format!("{} · {}", info.description, info.size)}</p>
            })}
            if downloading {
                <progress max="1" value={model.download_progress.clamp(0.0, 1.0).to_string()} />
            }
            {model.error.as_ref().map_or_else(Html::default, |error| html! {
                <p class="error-text">{error.clone()}</p>
            })}
            if can_load(model) {
                <button onclick={load}>{"Load"}</button>
            }
        </li>
    }
}
