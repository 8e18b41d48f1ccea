//! Rendering: the saved figure (`figure`) and the terminal preview (`ascii`).

pub mod ascii;
pub mod figure;

pub use ascii::render_ascii_plot;
pub use figure::render_figure;
