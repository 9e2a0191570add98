//! Keyboard and gamepad samplers.
//!
//! Each device fills its own slot of [`InputSources`]; the vehicle plugin
//! merges the slots into one `ControlInput` before stepping.
//!
//! Keyboard layout:
//! - A/D swing, W/S stick, J/L bucket, I/K boom
//! - U/O thumb open/close, R/F blade up/down
//! - Q/E left/right tread forward, Z/C left/right tread reverse
//! - Backspace resets the vehicle

use bevy::prelude::*;
use excavator_core::ControlInput;
use excavator_physics::{InputSources, ResetVehicle};

fn key_axis(keys: &ButtonInput<KeyCode>, positive: KeyCode, negative: KeyCode) -> f32 {
    let mut value = 0.0;
    if keys.pressed(positive) {
        value += 1.0;
    }
    if keys.pressed(negative) {
        value -= 1.0;
    }
    value
}

fn key_trigger(keys: &ButtonInput<KeyCode>, key: KeyCode) -> f32 {
    if keys.pressed(key) {
        1.0
    } else {
        0.0
    }
}

pub fn keyboard_input(keys: Res<ButtonInput<KeyCode>>, mut sources: ResMut<InputSources>) {
    sources.keyboard = ControlInput {
        axis_x: key_axis(&keys, KeyCode::KeyD, KeyCode::KeyA),
        axis_y: key_axis(&keys, KeyCode::KeyW, KeyCode::KeyS),
        axis_x2: key_axis(&keys, KeyCode::KeyL, KeyCode::KeyJ),
        axis_y2: key_axis(&keys, KeyCode::KeyI, KeyCode::KeyK),
        trigger_l: key_trigger(&keys, KeyCode::KeyQ),
        trigger_r: key_trigger(&keys, KeyCode::KeyE),
        bumper_l: keys.pressed(KeyCode::KeyZ),
        bumper_r: keys.pressed(KeyCode::KeyC),
        dpad_up: keys.pressed(KeyCode::KeyR),
        dpad_down: keys.pressed(KeyCode::KeyF),
        button_y: keys.pressed(KeyCode::KeyU),
        button_a: keys.pressed(KeyCode::KeyO),
    };
}

/// Sum of all connected gamepads; nothing connected leaves the slot neutral.
pub fn gamepad_input(gamepads: Query<&Gamepad>, mut sources: ResMut<InputSources>) {
    let sampled: Vec<ControlInput> = gamepads
        .iter()
        .map(|gamepad| {
            let axis = |axis: GamepadAxis| gamepad.get(axis).unwrap_or(0.0);
            let trigger = |button: GamepadButton| gamepad.get(button).unwrap_or(0.0);

            ControlInput {
                axis_x: axis(GamepadAxis::LeftStickX),
                axis_y: axis(GamepadAxis::LeftStickY),
                axis_x2: axis(GamepadAxis::RightStickX),
                axis_y2: axis(GamepadAxis::RightStickY),
                trigger_l: trigger(GamepadButton::LeftTrigger2),
                trigger_r: trigger(GamepadButton::RightTrigger2),
                bumper_l: gamepad.pressed(GamepadButton::LeftTrigger),
                bumper_r: gamepad.pressed(GamepadButton::RightTrigger),
                dpad_up: gamepad.pressed(GamepadButton::DPadUp),
                dpad_down: gamepad.pressed(GamepadButton::DPadDown),
                button_y: gamepad.pressed(GamepadButton::North),
                button_a: gamepad.pressed(GamepadButton::South),
            }
        })
        .collect();

    sources.gamepad = ControlInput::merge_all(&sampled);
}

pub fn reset_key(keys: Res<ButtonInput<KeyCode>>, mut reset: MessageWriter<ResetVehicle>) {
    if keys.just_pressed(KeyCode::Backspace) {
        reset.write(ResetVehicle);
    }
}
