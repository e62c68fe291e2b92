//! Application style configuration

use eframe::egui::{self, Color32, CornerRadius, FontId, TextStyle};

const ACCENT: Color32 = Color32::from_rgb(64, 132, 214);
const PANEL: Color32 = Color32::from_rgb(27, 28, 31);

/// Dark theme with a blue accent
pub fn configure_styles(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();
    visuals.panel_fill = PANEL;
    visuals.window_fill = PANEL.gamma_multiply(1.1);
    visuals.extreme_bg_color = Color32::from_rgb(18, 18, 20);
    visuals.selection.bg_fill = ACCENT.gamma_multiply(0.6);
    visuals.selection.stroke.color = ACCENT;
    visuals.hyperlink_color = ACCENT;
    visuals.window_corner_radius = CornerRadius::same(4);
    visuals.menu_corner_radius = CornerRadius::same(4);
    for widget in [
        &mut visuals.widgets.inactive,
        &mut visuals.widgets.hovered,
        &mut visuals.widgets.active,
    ] {
        widget.corner_radius = CornerRadius::same(2);
    }

    ctx.style_mut(|style| {
        style.visuals = visuals;
        style.spacing.item_spacing = egui::vec2(6.0, 5.0);
        style.spacing.slider_width = 140.0;
        style.spacing.combo_width = 120.0;
        style.text_styles.insert(TextStyle::Small, FontId::proportional(10.5));
        style.text_styles.insert(TextStyle::Heading, FontId::proportional(20.0));
        style.interaction.tooltip_delay = 0.4;
    });
}
