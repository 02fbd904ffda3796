pub mod detail_panel;
pub mod graph_canvas;
pub mod toolbar;
