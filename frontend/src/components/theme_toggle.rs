use super::super::Model;
use super::super::Msg;
use gloo_storage::{LocalStorage, Storage};
use yew::html::Scope;
use yew::prelude::*;

const THEME_KEY: &str = "geolocation-theme";
const DARK_CLASS: &str = "dark-mode";

pub fn stored_theme() -> String {
    match LocalStorage::get::<String>(THEME_KEY) {
        Ok(theme) if theme == "dark" => theme,
        _ => "light".to_string(),
    }
}

pub fn store_theme(theme: &str) {
    if let Err(e) = LocalStorage::set(THEME_KEY, theme) {
        log::warn!("Could not persist theme: {}", e);
    }
}

pub fn apply_theme(theme: &str) {
    let Some(body) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
    else {
        return;
    };

    let classes = body.class_list();
    let result = if theme == "dark" {
        classes.add_1(DARK_CLASS)
    } else {
        classes.remove_1(DARK_CLASS)
    };
    if result.is_err() {
        log::warn!("Could not apply {} theme", theme);
    }
}

pub fn render_theme_toggle(theme: &str, link: &Scope<Model>) -> Html {
    html! {
        <button
            id="theme-toggle"
            class="theme-toggle"
            onclick={link.callback(|_| Msg::ToggleTheme)}
            title={ if theme == "light" { "Switch to Dark Mode" } else { "Switch to Light Mode" } }
        >
            { if theme == "light" {
                html! { <img src="https://cdnjs.cloudflare.com/ajax/libs/twemoji/14.0.2/svg/2600.svg" alt="Sun Icon" class="toggle-icon" /> }
            } else {
                html! { <img src="https://cdnjs.cloudflare.com/ajax/libs/twemoji/14.0.2/svg/1f319.svg" alt="Moon Icon" class="toggle-icon" /> }
            }}
        </button>
    }
}
