pub mod config;
pub mod panel;
pub mod scene;
pub mod widget;
