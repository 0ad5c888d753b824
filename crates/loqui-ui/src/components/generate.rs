use crate::app::UiCtx;
use crate::logic::{audio_src, char_counter, generate_hint};
use crate::models::ToastKind;
use crate::store::UiStore;
use gloo::file::File;
use loqui_api_models::ReferenceAudio;
use loqui_sync::catalog::{self, LANGUAGES};
use loqui_sync::features::generation::state::{
    self as form, CFG_WEIGHT_RANGE, EXAGGERATION_RANGE, SPEED_RANGE, TEMPERATURE_RANGE,
};
use loqui_sync::features::generation::GenerateError;
use loqui_sync::format::{format_duration, format_stat_time};
use loqui_sync::StoreHandle;
use web_sys::{HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};
use yew::prelude::*;
use yewdux::prelude::use_selector;

#[derive(Properties, PartialEq)]
struct SliderProps {
    label: AttrValue,
    value: f64,
    range: (f64, f64),
    step: f64,
    on_change: Callback<f64>,
}

#[function_component(Slider)]
fn slider(props: &SliderProps) -> Html {
    let oninput = {
        let on_change = props.on_change.clone();
        Callback::from(move |event: InputEvent| {
            let input: HtmlInputElement = event.target_unchecked_into();
            if let Ok(value) = input.value().parse::<f64>() {
                on_change.emit(value);
            }
        })
    };
    html! {
        <label class="slider">
            <span>{props.label.clone()}</span>
            <input
                type="range"
                min={props.range.0.to_string()}
                max={props.range.1.to_string()}
                step={props.step.to_string()}
                value={props.value.to_string()}
                {oninput}
            />
            <span class="value">{format!("{:.2}", props.value)}</span>
        </label>
    }
}

#[function_component(GeneratePanel)]
pub(crate) fn generate_panel() -> Html {
    let ctx = use_context::<UiCtx>();
    let inputs = use_selector(|store: &UiStore| store.app.form.clone());
    let generation = use_selector(|store: &UiStore| store.app.generation.clone());
    let selected = use_selector(|store: &UiStore| store.app.models.selected.clone());
    let hint = use_selector(|store: &UiStore| generate_hint(&store.app));
    let Some(ctx) = ctx else {
        return Html::default();
    };

    let update = |apply: fn(&mut form::GenerationForm, f64)| {
        let store = ctx.store.clone();
        Callback::from(move |value: f64| store.reduce(|app| apply(&mut app.form, value)))
    };

    let on_text = {
        let store = ctx.store.clone();
        Callback::from(move |event: InputEvent| {
            let area: HtmlTextAreaElement = event.target_unchecked_into();
            let text = area.value();
            store.reduce(|app| form::set_text(&mut app.form, text));
        })
    };
    let on_language = {
        let store = ctx.store.clone();
        Callback::from(move |event: Event| {
            let select: HtmlSelectElement = event.target_unchecked_into();
            let code = select.value();
            store.reduce(|app| form::set_language(&mut app.form, code));
        })
    };
    let on_reference = {
        let ctx = ctx.clone();
        Callback::from(move |event: Event| {
            let input: HtmlInputElement = event.target_unchecked_into();
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                return;
            };
            let file = File::from(file);
            let file_name = file.name();
            let mime = file.raw_mime_type();
            let content_type = (!mime.is_empty()).then_some(mime);
            if !form::is_audio_file(&file_name, content_type.as_deref()) {
                ctx.toast(ToastKind::Error, format!("{file_name} is not an audio file"));
                return;
            }
            let ctx = ctx.clone();
            yew::platform::spawn_local(async move {
                match gloo::file::futures::read_as_bytes(&file).await {
                    Ok(bytes) => ctx.store.reduce(|app| {
                        form::set_reference(
                            &mut app.form,
                            Some(ReferenceAudio {
                                file_name,
                                content_type,
                                bytes,
                            }),
                        );
                    }),
                    Err(err) => ctx.error(format!("Could not read {file_name}: {err}")),
                }
            });
        })
    };
    let on_clear_reference = {
        let store = ctx.store.clone();
        Callback::from(move |_| store.reduce(|app| form::set_reference(&mut app.form, None)))
    };
    let on_ref_text = {
        let store = ctx.store.clone();
        Callback::from(move |event: InputEvent| {
            let input: HtmlInputElement = event.target_unchecked_into();
            let text = input.value();
            store.reduce(|app| form::set_ref_text(&mut app.form, text));
        })
    };
    let on_generate = {
        let ctx = ctx.clone();
        Callback::from(move |_| {
            let ctx = ctx.clone();
            yew::platform::spawn_local(async move {
                match ctx.generation().submit().await {
                    Ok(response) => ctx.toast(
                        ToastKind::Success,
                        format!("Generated {} of audio", format_duration(response.duration_seconds)),
                    ),
                    Err(GenerateError::Blocked(reason)) => ctx.toast(ToastKind::Info, reason.to_string()),
                    Err(GenerateError::Api(err)) => ctx.error(err.to_string()),
                }
            });
        })
    };
    let on_clear = {
        let ctx = ctx.clone();
        Callback::from(move |_| ctx.generation().clear_generation())
    };
    let on_reset = {
        let ctx = ctx.clone();
        Callback::from(move |_| ctx.generation().reset_form())
    };

    let (counter, over_limit) = char_counter(&inputs.text);
    let needs_reference = catalog::requires_reference(&selected);
    let busy = generation.in_flight;
    let disabled = busy || hint.is_some();

    html! {
        <div class="generate-panel">
            <label class="text-input">
                <textarea
                    placeholder="Type something to say..."
                    value={inputs.text.clone()}
                    oninput={on_text}
                    disabled={busy}
                />
                <span class={classes!("counter", over_limit.then_some("error-text"))}>{counter}</span>
            </label>

            if catalog::supports_language(&selected) {
                <label class="select">
                    <span>{"Language"}</span>
                    <select onchange={on_language}>
                        {for LANGUAGES.iter().map(|(code, name)| html! {
                            <option value={*code} selected={inputs.language == *code}>{*name}</option>
                        })}
                    </select>
                </label>
            }

            <fieldset class="reference">
                <legend>
                    {"Reference voice"}
                    if needs_reference { <span class="required">{" (required)"}</span> }
                </legend>
                {inputs.reference.as_ref().map_or_else(
                    || html! { <input type="file" accept="audio/*" onchange={on_reference} /> },
                    |reference| html! {
                        <div class="reference-file">
                            <span>{reference.file_name.clone()}</span>
                            <button class="ghost" onclick={on_clear_reference}>{"Remove"}</button>
                        </div>
                    },
                )}
                if inputs.reference.is_some() {
                    <input
                        type="text"
                        placeholder="Transcript of the clip (optional)"
                        value={inputs.ref_text.clone()}
                        oninput={on_ref_text}
                    />
                }
            </fieldset>

            <div class="sliders">
                <Slider label="Exaggeration" value={inputs.exaggeration} range={EXAGGERATION_RANGE} step={0.05} on_change={update(form::set_exaggeration)} />
                <Slider label="CFG weight" value={inputs.cfg_weight} range={CFG_WEIGHT_RANGE} step={0.05} on_change={update(form::set_cfg_weight)} />
                <Slider label="Temperature" value={inputs.temperature} range={TEMPERATURE_RANGE} step={0.05} on_change={update(form::set_temperature)} />
                <Slider label="Speed" value={inputs.speed} range={SPEED_RANGE} step={0.05} on_change={update(form::set_speed)} />
            </div>

            <div class="actions">
                <button class="primary" onclick={on_generate} {disabled} title={(*hint).clone().unwrap_or_default()}>
                    {if busy { "Generating..." } else { "Generate" }}
                </button>
                <button class="ghost" onclick={on_reset} disabled={busy}>{"Reset"}</button>
            </div>

            {generation.error.as_ref().map_or_else(Html::default, |error| html! {
                <p class="error-text">{error.clone()}</p>
            })}

            {generation.last.as_ref().map_or_else(Html::default, |last| html! {
                <div class="result">
                    <audio controls=true autoplay=true src={audio_src(&ctx.config.api_base, &last.audio_url)} />
                    <p class="muted">
                        {format!(
                            "{} · {} audio in {}",
                            catalog::variant_label(&last.model_variant),
                            format_duration(last.duration_seconds),
                            format_stat_time(last.generation_time_seconds),
                        )}
                    </p>
                    <button class="ghost" onclick={on_clear}>{"Clear"}</button>
                </div>
            })}
        </div>
    }
}
