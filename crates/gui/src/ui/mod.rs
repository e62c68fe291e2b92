pub mod sidebar;
pub mod startup;
pub mod status_bar;
pub mod toasts;
