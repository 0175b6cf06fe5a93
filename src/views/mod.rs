//! Server-rendered markup.

use std::sync::LazyLock;

use minijinja::Environment;

pub mod history;
pub mod page;

static TEMPLATES: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    // Both templates are compiled into the binary; a syntax error here is a
    // build defect caught by the view tests.
    for (name, source) in [
        ("history.html", include_str!("templates/history.html")),
        ("page.html", include_str!("templates/page.html")),
    ] {
        if let Err(e) = env.add_template(name, source) {
            tracing::error!("❌ Template {} failed to compile: {}", name, e);
        }
    }
    env
});

/// The shared template environment. `.html` templates are auto-escaped.
pub(crate) fn templates() -> &'static Environment<'static> {
    &TEMPLATES
}
