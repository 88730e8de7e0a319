use super::super::{MAX_IMAGES, Model, Msg};
use super::utils::extract_image_files;
use web_sys::{DragEvent, HtmlInputElement};
use yew::prelude::*;

/// Drop zone doubling as the file picker. Hidden once the image limit is reached.
pub fn render_upload_section(model: &Model, ctx: &Context<Model>) -> Html {
    let remaining = MAX_IMAGES.saturating_sub(model.files.len());
    if remaining == 0 {
        return html! {
            <p class="limit-reached">{ format!("Image limit reached ({}). Remove one to add more.", MAX_IMAGES) }</p>
        };
    }

    let link = ctx.link();
    let input_ref = model.file_input.clone();

    let on_pick = link.batch_callback(|e: Event| {
        let input: HtmlInputElement = e.target_unchecked_into();
        let picked = input.files().map(|list| extract_image_files(&list)).unwrap_or_default();
        input.set_value("");
        (!picked.is_empty()).then_some(Msg::FilesAdded(picked))
    });
    let on_drag = link.callback(|e: DragEvent| {
        e.prevent_default();
        Msg::SetDragging(e.type_() != "dragleave")
    });
    let open_picker = Callback::from(move |_: MouseEvent| {
        if let Some(input) = input_ref.cast::<HtmlInputElement>() {
            input.click();
        }
    });

    html! {
        <section
            class={classes!("upload-area", model.is_dragging.then_some("drag-over"))}
            ondragover={on_drag.clone()}
            ondragleave={on_drag}
            ondrop={link.callback(Msg::HandleDrop)}
            onclick={open_picker}
        >
            <input
                ref={model.file_input.clone()}
                type="file"
                accept="image/*"
                multiple=true
                hidden=true
                onchange={on_pick}
            />
            <i class="fa-solid fa-map-location-dot"></i>
            <p>{"Drop, paste or click to add street-level photos"}</p>
            <p class="file-types">{ format!("{} more allowed", remaining) }</p>
        </section>
    }
}
