//! Embedded browser front end: the form page, its script and stylesheet

use crate::guide::MAX_STEPS;

const INDEX_TEMPLATE: &str = include_str!("../static/index.html");
pub const APP_JS: &str = include_str!("../static/app.js");
pub const STYLE_CSS: &str = include_str!("../static/style.css");

/// Fill the page template's placeholders
pub fn render_index(default_steps: u32) -> String {
    INDEX_TEMPLATE
        .replace("{{ default_steps }}", &default_steps.clamp(1, MAX_STEPS).to_string())
        .replace("{{ max_steps }}", &MAX_STEPS.to_string())
}
