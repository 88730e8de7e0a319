use super::super::Model;
use super::utils::{osm_embed_url, osm_link};
use yew::prelude::*;

pub fn render_results(model: &Model) -> Html {
    let Some(selected_id) = model.selected_file_id else {
        return html! {};
    };

    let Some(result) = model.results.get(&selected_id) else {
        return html! { <p class="no-results-message">{"No prediction yet for the selected image."}</p> };
    };

    let located_filename = model
        .files
        .get(&selected_id)
        .map_or_else(|| "Located Image".to_string(), |fd| fd.file.name());
    let confidence = result.confidence * 100.0;

    html! {
        <div class="results-container">
            <div class="result-header">
                <h2 title={format!("Prediction for: {}", located_filename)}>
                    <i class="fa-solid fa-location-dot"></i>{" Predicted Location"}
                    <span class="analyzed-filename-display">{format!("({})", located_filename)}</span>
                </h2>
                <div class="coordinates">
                    <div class="coord">
                        <span class="label">{"Latitude:"}</span>
                        <span class="value">{ format!("{:.6}", result.latitude) }</span>
                    </div>
                    <div class="coord">
                        <span class="label">{"Longitude:"}</span>
                        <span class="value">{ format!("{:.6}", result.longitude) }</span>
                    </div>
                    // A zero confidence means the model did not report one.
                    if result.confidence > 0.0 {
                        <div class="confidence-meter">
                            <div class="meter-label">{"Confidence:"}</div>
                            <div class="meter">
                                <div class="meter-fill" style={format!("width: {:.1}%", confidence.min(100.0))}></div>
                            </div>
                            <div class="meter-value">{format!("{:.1}%", confidence)}</div>
                        </div>
                    }
                </div>
            </div>
            <div class="map-container">
                <iframe
                    title="Predicted location map"
                    src={osm_embed_url(result.latitude, result.longitude)}
                    width="100%"
                    height="400"
                    style="border: 0;"
                    loading="lazy"
                />
                <a href={osm_link(result.latitude, result.longitude)} target="_blank" rel="noopener noreferrer">
                    {"View larger map"}
                </a>
            </div>
        </div>
    }
}
