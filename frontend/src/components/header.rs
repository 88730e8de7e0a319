use yew::prelude::*;

/// Renders the application header
pub fn render_header() -> Html {
    html! {
        <header class="app-header">
            <h1><i class="fa-solid fa-earth-americas"></i> {" Image Geolocation"}</h1>
            <p class="subtitle">{"Upload a photo and predict where it was taken"}</p>
        </header>
    }
}
