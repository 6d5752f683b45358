//! Server-rendered HTML wizard under `/ui`.
//!
//! The pages walk a user through the same delegates as the JSON API: read a document, review the
//! recognized text, review the extracted fields, then start a signing session. There is no
//! server-side session; every page carries the earlier steps' results forward as hidden form
//! fields. Validation problems are rendered inline with status 200 instead of as JSON errors.

pub mod handlers;

use minijinja::Environment;

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../../templates/layout.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("ocr.html", include_str!("../../templates/ocr.html")),
    ("prefill.html", include_str!("../../templates/prefill.html")),
    ("esign.html", include_str!("../../templates/esign.html")),
    ("chat.html", include_str!("../../templates/chat.html")),
];

/// Build the template environment with every page compiled in.
pub fn templates() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    for (name, source) in TEMPLATES {
        env.add_template(name, source)?;
    }
    Ok(env)
}
