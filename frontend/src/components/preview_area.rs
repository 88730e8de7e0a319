use super::super::{FileData, MAX_IMAGES, Model, Msg};
use super::utils::{debounce, truncate_name};
use yew::prelude::*;

pub fn render_preview_area(model: &Model, ctx: &Context<Model>) -> Html {
    if model.files.is_empty() {
        return html! {};
    }

    let mut files: Vec<&FileData> = model.files.values().collect();
    files.sort_by_key(|fd| fd.id);
    let located = files.iter().filter(|fd| model.results.contains_key(&fd.id)).count();

    html! {
        <section class="preview-strip">
            <header class="preview-strip-header">
                <span>{ format!("{} / {} images, {} located", files.len(), MAX_IMAGES, located) }</span>
                { render_actions(model, ctx) }
            </header>
            <ul class="thumbnails">
                { for files.into_iter().map(|fd| render_thumbnail(model, ctx, fd)) }
            </ul>
        </section>
    }
}

fn render_actions(model: &Model, ctx: &Context<Model>) -> Html {
    let link = ctx.link().clone();
    let send = move |msg: fn() -> Msg| {
        let link = link.clone();
        debounce(300, move || link.send_message(msg()))
    };

    let selected_label = model
        .selected_file_id
        .and_then(|id| model.files.get(&id))
        .map(|fd| format!("Locate \"{}\"", truncate_name(&fd.file.name(), 20)))
        .unwrap_or_else(|| "Locate selected".to_string());

    html! {
        <div class="button-container">
            <button
                class="analyze-btn"
                disabled={model.loading || model.selected_file_id.is_none()}
                onclick={send(|| Msg::LocateSelected)}
            >
                if model.loading {
                    <i class="fa-solid fa-spinner fa-spin"></i>{" Locating..."}
                } else {
                    <i class="fa-solid fa-location-crosshairs"></i>{ format!(" {}", selected_label) }
                }
            </button>
            <button class="analyze-btn" disabled={model.loading} onclick={send(|| Msg::LocateAll)}>
                <i class="fa-solid fa-earth-europe"></i>{" Locate all"}
            </button>
            <button id="clear-all-btn" class="analyze-btn" onclick={send(|| Msg::ClearAllFiles)}>
                <i class="fa-solid fa-trash"></i>{" Clear"}
            </button>
        </div>
    }
}

fn render_thumbnail(model: &Model, ctx: &Context<Model>, file_data: &FileData) -> Html {
    let id = file_data.id;
    let name = file_data.file.name();
    let link = ctx.link();
    let selected = model.selected_file_id == Some(id);
    let badge = model
        .results
        .get(&id)
        .map(|r| format!("{:.2}, {:.2}", r.latitude, r.longitude));

    html! {
        <li
            key={id.to_string()}
            class={classes!("preview-item", selected.then_some("selected"), badge.is_some().then_some("located"))}
            title={name.clone()}
            onclick={link.callback(move |_| Msg::SelectFile(id))}
        >
            if let Some(url) = &file_data.preview_url {
                <img src={url.to_string()} alt={name.clone()} />
            } else {
                <div class="preview-placeholder">{"..."}</div>
            }
            if let Some(coords) = &badge {
                <span class="coord-badge">{ coords.clone() }</span>
            }
            <button
                class="remove-btn"
                title="Remove"
                onclick={link.callback(move |e: MouseEvent| {
                    e.stop_propagation();
                    Msg::RemoveFile(id)
                })}
            >
                <i class="fa-solid fa-times"></i>
            </button>
        </li>
    }
}
