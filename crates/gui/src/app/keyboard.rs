//! Keyboard shortcut handling

use eframe::egui;
use exhibit_lib::navigation::{OrbitDirection, ViewPreset};
use exhibit_lib::session::Session;
use shared::SettingKey;

/// Actions that need more than the session to carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Open,
    SaveImage,
    Quit,
}

/// What an arrow key does to the camera
#[derive(Debug, Clone, Copy, PartialEq)]
enum ArrowCommand {
    Orbit(OrbitDirection),
    Pan(f64, f64, f64),
}

fn arrow_command(key: egui::Key, modifiers: egui::Modifiers) -> Option<ArrowCommand> {
    let (direction, [dx, dy]) = match key {
        egui::Key::ArrowLeft => (OrbitDirection::Left, [-1.0, 0.0]),
        egui::Key::ArrowRight => (OrbitDirection::Right, [1.0, 0.0]),
        egui::Key::ArrowUp => (OrbitDirection::Up, [0.0, 1.0]),
        egui::Key::ArrowDown => (OrbitDirection::Down, [0.0, -1.0]),
        _ => return None,
    };
    Some(if modifiers.command {
        ArrowCommand::Pan(dx, dy, 0.0)
    } else if modifiers.shift && dy != 0.0 {
        // Shift+Up/Down moves along the view direction
        ArrowCommand::Pan(0.0, 0.0, dy)
    } else {
        ArrowCommand::Orbit(direction)
    })
}

fn command_shortcut(key: egui::Key, modifiers: egui::Modifiers) -> Option<ShortcutAction> {
    if key == egui::Key::F12 {
        return Some(ShortcutAction::SaveImage);
    }
    if !modifiers.command {
        return None;
    }
    match key {
        egui::Key::O => Some(ShortcutAction::Open),
        egui::Key::S => Some(ShortcutAction::SaveImage),
        egui::Key::Q => Some(ShortcutAction::Quit),
        _ => None,
    }
}

/// Handle keyboard shortcuts for the application
pub fn handle_keyboard(ctx: &egui::Context, session: &mut Session) -> Option<ShortcutAction> {
    // Don't handle shortcuts when a text field is focused
    if ctx.memory(|m| m.focused().is_some()) {
        return None;
    }

    let (pressed, modifiers): (Vec<egui::Key>, egui::Modifiers) = ctx.input(|i| {
        let pressed = i
            .events
            .iter()
            .filter_map(|e| match e {
                egui::Event::Key {
                    key, pressed: true, ..
                } => Some(*key),
                _ => None,
            })
            .collect();
        (pressed, i.modifiers)
    });

    let mut action = None;
    for key in pressed {
        match arrow_command(key, modifiers) {
            Some(ArrowCommand::Orbit(direction)) => session.viewer.orbit(direction),
            Some(ArrowCommand::Pan(dx, dy, dz)) => session.viewer.pan(dx, dy, dz),
            None => {}
        }

        let view = match key {
            egui::Key::Num1 => Some(ViewPreset::Front),
            egui::Key::Num3 => Some(ViewPreset::Right),
            egui::Key::Num7 => Some(ViewPreset::Top),
            egui::Key::Num9 => Some(ViewPreset::Isometric),
            _ => None,
        };
        if let Some(preset) = view.filter(|_| !modifiers.command) {
            session.viewer.view(preset);
        }

        match key {
            egui::Key::Enter => session.viewer.reset_to_bounds(),
            egui::Key::R if modifiers.command => session.request_reload(),
            egui::Key::G if modifiers.command => {
                let grid = session.registry.bool(SettingKey::Grid);
                session.set(SettingKey::Grid, !grid);
            }
            _ => {}
        }

        if let Some(a) = command_shortcut(key, modifiers) {
            action = Some(a);
        }
    }
    action
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHIFT: egui::Modifiers = egui::Modifiers::SHIFT;
    const CTRL: egui::Modifiers = egui::Modifiers::COMMAND;

    #[test]
    fn test_plain_arrows_orbit() {
        assert_eq!(
            arrow_command(egui::Key::ArrowLeft, egui::Modifiers::NONE),
            Some(ArrowCommand::Orbit(OrbitDirection::Left))
        );
    }

    #[test]
    fn test_shift_left_right_still_orbit() {
        assert_eq!(
            arrow_command(egui::Key::ArrowLeft, SHIFT),
            Some(ArrowCommand::Orbit(OrbitDirection::Left))
        );
        assert_eq!(
            arrow_command(egui::Key::ArrowRight, SHIFT),
            Some(ArrowCommand::Orbit(OrbitDirection::Right))
        );
    }

    #[test]
    fn test_shift_up_down_dolly() {
        assert_eq!(
            arrow_command(egui::Key::ArrowUp, SHIFT),
            Some(ArrowCommand::Pan(0.0, 0.0, 1.0))
        );
        assert_eq!(
            arrow_command(egui::Key::ArrowDown, SHIFT),
            Some(ArrowCommand::Pan(0.0, 0.0, -1.0))
        );
    }

    #[test]
    fn test_ctrl_arrows_pan() {
        assert_eq!(
            arrow_command(egui::Key::ArrowRight, CTRL),
            Some(ArrowCommand::Pan(1.0, 0.0, 0.0))
        );
        assert_eq!(arrow_command(egui::Key::A, CTRL), None);
    }

    #[test]
    fn test_command_shortcuts() {
        assert_eq!(command_shortcut(egui::Key::S, CTRL), Some(ShortcutAction::SaveImage));
        assert_eq!(command_shortcut(egui::Key::Q, CTRL), Some(ShortcutAction::Quit));
        assert_eq!(command_shortcut(egui::Key::O, CTRL), Some(ShortcutAction::Open));
        assert_eq!(
            command_shortcut(egui::Key::F12, egui::Modifiers::NONE),
            Some(ShortcutAction::SaveImage)
        );
        assert_eq!(command_shortcut(egui::Key::S, egui::Modifiers::NONE), None);
    }
}
