use super::super::Msg;
use super::super::{FileData, MAX_IMAGES, Model};
use super::theme_toggle::{apply_theme, store_theme};
use super::utils::generate_id;
use gloo_file::{File as GlooFile, ObjectUrl};
use gloo_net::http::Request;
use shared::{ErrorResponse, PredictionResponse, UPLOAD_FIELD};
use wasm_bindgen_futures::spawn_local;
use web_sys::{ClipboardEvent, DragEvent, FileList};
use yew::prelude::*;

const PREDICT_URL: &str = "/predict";

pub fn handle_files_added(model: &mut Model, ctx: &Context<Model>, files: Vec<GlooFile>) -> bool {
    let available_slots = MAX_IMAGES.saturating_sub(model.files.len());

    if files.len() > available_slots {
        model.error = Some(format!(
            "Upload limit exceeded. You can only add {} more images.",
            available_slots
        ));
        return true;
    }

    model.error = None;
    let mut new_selection = None;

    for file in files.into_iter() {
        let id = generate_id();
        let file_data = FileData {
            id,
            file: file.clone(),
            preview_url: None,
        };
        model.files.insert(id, file_data);

        let preview_url = ObjectUrl::from(file);
        ctx.link().send_message(Msg::AddPreview(id, preview_url));

        new_selection = Some(id);
    }

    if let Some(id) = new_selection {
        model.selected_file_id = Some(id);
    }

    true
}

pub fn handle_add_preview(model: &mut Model, id: u64, url: ObjectUrl) -> bool {
    if let Some(file_data) = model.files.get_mut(&id) {
        file_data.preview_url = Some(url);
        true
    } else {
        false
    }
}

pub fn handle_remove_file(model: &mut Model, id: u64) -> bool {
    if model.files.remove(&id).is_none() {
        return false;
    }
    model.results.remove(&id);

    if model.selected_file_id == Some(id) {
        model.selected_file_id = None;
    }

    if model.files.is_empty() {
        model.results.clear();
        model.error = None;
    } else if model.selected_file_id.is_none() {
        model.selected_file_id = model.files.keys().max().copied();
    }

    true
}

pub fn handle_select_file(model: &mut Model, id: u64) -> bool {
    if model.selected_file_id == Some(id) || !model.files.contains_key(&id) {
        return false;
    }
    model.selected_file_id = Some(id);
    model.error = None;
    true
}

pub fn handle_clear_all_files(model: &mut Model) -> bool {
    model.files.clear();
    model.selected_file_id = None;
    model.results.clear();
    model.error = None;
    true
}

pub fn handle_locate_selected(model: &mut Model, ctx: &Context<Model>) -> bool {
    let Some((file_id, file)) = model
        .selected_file_id
        .and_then(|id| model.files.get(&id))
        .map(|fd| (fd.id, fd.file.clone()))
    else {
        ctx.link()
            .send_message(Msg::SetError(Some("No image selected.".into())));
        return false;
    };

    model.loading = true;
    model.error = None;
    model.pending_requests = 1;
    send_prediction_request(ctx, file_id, file);
    true
}

pub fn handle_locate_all(model: &mut Model, ctx: &Context<Model>) -> bool {
    if model.files.is_empty() {
        return false;
    }

    model.loading = true;
    model.error = None;
    model.pending_requests = model.files.len();

    for file_data in model.files.values() {
        send_prediction_request(ctx, file_data.id, file_data.file.clone());
    }

    true
}

pub fn handle_prediction_result(
    model: &mut Model,
    file_id: u64,
    response: PredictionResponse,
) -> bool {
    // The image may have been removed while its request was in flight.
    if model.files.contains_key(&file_id) {
        model.results.insert(file_id, response);
    }
    finish_request(model);
    true
}

pub fn handle_prediction_failed(model: &mut Model, file_id: u64, message: String) -> bool {
    let name = model
        .files
        .get(&file_id)
        .map(|fd| fd.file.name())
        .unwrap_or_else(|| "image".to_string());
    log::error!("Prediction for {} failed: {}", name, message);
    model.error = Some(format!("{}: {}", name, message));
    finish_request(model);
    true
}

fn finish_request(model: &mut Model) {
    model.pending_requests = model.pending_requests.saturating_sub(1);
    if model.pending_requests == 0 {
        model.loading = false;
    }
}

pub fn handle_toggle_theme(model: &mut Model) -> bool {
    model.theme = if model.theme == "light" {
        "dark".to_string()
    } else {
        "light".to_string()
    };
    apply_theme(&model.theme);
    store_theme(&model.theme);
    true
}

pub fn handle_drop(model: &mut Model, ctx: &Context<Model>, event: DragEvent) -> bool {
    event.prevent_default();
    model.is_dragging = false;

    if let Some(file_list) = event.data_transfer().and_then(|dt| dt.files()) {
        process_file_list(ctx, file_list);
    }

    true
}

pub fn handle_paste(ctx: &Context<Model>, event: ClipboardEvent) -> bool {
    if let Some(file_list) = event.clipboard_data().and_then(|dt| dt.files()) {
        if file_list.length() > 0 {
            event.prevent_default();
            process_file_list(ctx, file_list);
            return true;
        }
    }
    false
}

pub fn process_file_list(ctx: &Context<Model>, file_list: FileList) {
    let mut files_to_process = Vec::new();

    for i in 0..file_list.length() {
        if let Some(file) = file_list.item(i) {
            if file.type_().starts_with("image/") {
                files_to_process.push(GlooFile::from(file));
            } else {
                log::warn!("Skipping non-image file: {}", file.name());
                ctx.link().send_message(Msg::SetError(Some(format!(
                    "Skipped non-image file: {}",
                    file.name()
                ))));
            }
        }
    }

    if !files_to_process.is_empty() {
        ctx.link().send_message(Msg::FilesAdded(files_to_process));
    }
}

pub fn send_prediction_request(ctx: &Context<Model>, file_id: u64, file: GlooFile) {
    let link = ctx.link().clone();

    spawn_local(async move {
        let msg = match request_prediction(&file).await {
            Ok(response) => Msg::PredictionResult(file_id, response),
            Err(message) => Msg::PredictionFailed(file_id, message),
        };
        link.send_message(msg);
    });
}

async fn request_prediction(file: &GlooFile) -> Result<PredictionResponse, String> {
    let form_data =
        web_sys::FormData::new().map_err(|_| "Could not create form data".to_string())?;
    form_data
        .append_with_blob_and_filename(UPLOAD_FIELD, file.as_ref(), &file.name())
        .map_err(|_| "Could not attach image".to_string())?;

    let response = Request::post(PREDICT_URL)
        .body(form_data)
        .map_err(|e| format!("Failed to build request: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if response.ok() {
        return response
            .json::<PredictionResponse>()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e));
    }

    let status = response.status();
    let detail = match response.json::<ErrorResponse>().await {
        Ok(body) => body.detail,
        Err(_) => "unexpected response".to_string(),
    };
    Err(format!("Server error: {} - {}", status, detail))
}
