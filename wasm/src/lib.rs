use feature_diagram::layout_dump::LayoutDump;
use feature_diagram::persist::PersistedState;
use feature_diagram::surface::HeadlessSurface;
use feature_diagram::theme::Theme;
use feature_diagram::{Config, LayoutMode, OrderMode, Session};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogLayoutOptions {
    theme: Option<String>,
    layout_mode: Option<LayoutMode>,
    order_mode: Option<OrderMode>,
    show_containment: Option<bool>,
    /// Previously saved state; positions are reused when they cover every node.
    state: Option<PersistedState>,
}

fn layout_json(document: &str, options: CatalogLayoutOptions) -> Result<String, String> {
    let mut config = Config::default();
    if let Some(theme) = options.theme.as_deref().and_then(Theme::from_name) {
        config.theme = theme;
    }
    let mut session = Session::from_text(document, config).map_err(|error| error.to_string())?;
    if let Some(state) = options.state {
        session.restore(state);
    }
    let mut changed = false;
    if let Some(mode) = options.layout_mode {
        changed |= mode != session.layout_mode();
        session.set_layout_mode(mode);
    }
    if let Some(order) = options.order_mode {
        changed |= order != session.order_mode();
        session.set_order_mode(order);
    }
    // Restored positions belong to the saved mode and order.
    if changed {
        session.reset_positions();
    }
    if let Some(show) = options.show_containment {
        session.set_show_containment(show);
    }
    if session.needs_layout() {
        session
            .run_layout_blocking(&mut HeadlessSurface::new())
            .map_err(|error| error.to_string())?;
    }
    serde_json::to_string(&LayoutDump::from_session(&session)).map_err(|error| error.to_string())
}

fn edit_json(document: &str, node_id: &str, label: &str) -> Result<String, String> {
    let mut session =
        Session::from_text(document, Config::default()).map_err(|error| error.to_string())?;
    session
        .edit_label(node_id, label)
        .map_err(|error| error.to_string())?;
    Ok(session.document().to_pretty_json())
}

#[wasm_bindgen]
pub fn layout_catalog(document: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<CatalogLayoutOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        CatalogLayoutOptions::default()
    };
    layout_json(document, options).map_err(|error| JsValue::from_str(&error))
}

#[wasm_bindgen]
pub fn edit_catalog_label(document: &str, node_id: &str, label: &str) -> Result<String, JsValue> {
    edit_json(document, node_id, label).map_err(|error| JsValue::from_str(&error))
}
