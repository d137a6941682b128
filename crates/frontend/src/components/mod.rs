pub mod draw_controls;
pub mod map_panel;
