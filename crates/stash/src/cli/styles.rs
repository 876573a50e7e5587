//! Terminal styles for the stash CLI.
//!
//! Renderers refer to styles by meaning (an id, a timestamp, a warning), never
//! by color, so the palette can change in one place. `console` drops the
//! escape codes on its own when stdout is not a terminal or `NO_COLOR` is set.
use console::Style;
use once_cell::sync::Lazy;

pub static TITLE: Lazy<Style> = Lazy::new(|| Style::new().bold());
pub static MUTED: Lazy<Style> = Lazy::new(|| Style::new().color256(245));
pub static FAINT: Lazy<Style> = Lazy::new(|| Style::new().color256(240));
pub static ID: Lazy<Style> = Lazy::new(|| Style::new().color256(178));
pub static TIME: Lazy<Style> = Lazy::new(|| Style::new().color256(245).italic());
pub static TAG: Lazy<Style> = Lazy::new(|| Style::new().cyan());
pub static STAR: Lazy<Style> = Lazy::new(|| Style::new().yellow().bold());
pub static SUCCESS: Lazy<Style> = Lazy::new(|| Style::new().green());
pub static INFO: Lazy<Style> = Lazy::new(|| Style::new().color256(245));
pub static WARNING: Lazy<Style> = Lazy::new(|| Style::new().yellow().bold());
pub static ERROR: Lazy<Style> = Lazy::new(|| Style::new().red().bold());

/// Style for a media status label.
pub fn status(status: &str) -> &'static Style {
    match status {
        "approved" => &*SUCCESS,
        "review" => &*WARNING,
        "archived" => &*FAINT,
        _ => &*MUTED,
    }
}
