use bevy::prelude::*;
use bevy_mod_imgui::prelude::*;
use imgui::{ProgressBar, TreeNodeFlags};

use excavator_core::{ContactEvent, ContactSource};
use excavator_physics::{JointReading, ResetVehicle, TelemetrySnapshot};

const LIMIT_COLOR: [f32; 4] = [1.0, 0.35, 0.25, 1.0];
const ACTIVE_COLOR: [f32; 4] = [0.4, 1.0, 0.4, 1.0];
const IDLE_COLOR: [f32; 4] = [0.6, 0.6, 0.6, 1.0];

/// Read-only telemetry window plus a reset button.
pub struct TelemetryUiPlugin;

impl Plugin for TelemetryUiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(bevy_mod_imgui::ImguiPlugin::default())
            .add_systems(Update, telemetry_window);
    }
}

/// One joint row, e.g. `boom    0.300 [-0.500, 1.100]`.
pub fn joint_line(reading: &JointReading) -> String {
    let unit = if reading.id.is_linear() { "m" } else { "rad" };
    format!(
        "{:<7} {:>7.3} {} [{:.2}, {:.2}]",
        reading.name(),
        reading.value,
        unit,
        reading.min,
        reading.max
    )
}

/// One ledger row with the contact age relative to `now`.
pub fn contact_line(event: &ContactEvent, now: f64) -> String {
    let source = match event.source {
        ContactSource::Ground => "ground",
        ContactSource::Solver => "solver",
    };
    format!(
        "{:<7} {:<6} |F| {:>7.0} N  n ({:.2}, {:.2}, {:.2})  {:.2}s ago",
        event.part_name(),
        source,
        event.force.length(),
        event.normal.x,
        event.normal.y,
        event.normal.z,
        (now - event.timestamp).max(0.0)
    )
}

fn telemetry_window(
    mut context: NonSendMut<ImguiContext>,
    telemetry: Res<TelemetrySnapshot>,
    mut reset: MessageWriter<ResetVehicle>,
) {
    let ui = context.ui();

    ui.window("Excavator")
        .size([460.0, 520.0], Condition::FirstUseEver)
        .build(|| {
            ui.text(format!(
                "t = {:.2}s  steps {}",
                telemetry.clock, telemetry.total_steps
            ));
            if ui.button("Reset") {
                reset.write(ResetVehicle);
            }
            ui.separator();

            if telemetry.any_joint_at_limit() {
                ui.text_colored(LIMIT_COLOR, "Joints (at limit)");
            } else {
                ui.text("Joints");
            }
            for reading in &telemetry.joints {
                let line = joint_line(reading);
                if reading.at_limit {
                    ui.text_colored(LIMIT_COLOR, format!("{}  LIMIT", line));
                } else {
                    ui.text(line);
                }
                ProgressBar::new(reading.fraction())
                    .size([-1.0, 4.0])
                    .build(ui);
            }
            ui.separator();

            let (left, right) = telemetry.tread_forces;
            ui.text(format!(
                "Treads  L {:+.2} ({:.0} N)  R {:+.2} ({:.0} N)",
                telemetry.tread.left, left, telemetry.tread.right, right
            ));
            let p = telemetry.chassis_position;
            ui.text(format!(
                "Position ({:.2}, {:.2}, {:.2})  heading {:.1} deg",
                p.x,
                p.y,
                p.z,
                telemetry.heading.to_degrees()
            ));
            let v = telemetry.linear_velocity;
            let w = telemetry.angular_velocity;
            ui.text(format!(
                "Velocity ({:.2}, {:.2}, {:.2})  speed {:.2} m/s",
                v.x,
                v.y,
                v.z,
                telemetry.ground_speed()
            ));
            ui.text(format!("Spin ({:.2}, {:.2}, {:.2}) rad/s", w.x, w.y, w.z));
            ui.separator();

            if ui.collapsing_header("Contacts", TreeNodeFlags::DEFAULT_OPEN) {
                ui.text(format!(
                    "total {}  this frame {}  active {}  overlapping {}",
                    telemetry.total_collisions,
                    telemetry.frame_collisions,
                    telemetry.active_contacts().count(),
                    telemetry.overlapping_contacts
                ));
                for event in &telemetry.contacts {
                    let color = if event.active { ACTIVE_COLOR } else { IDLE_COLOR };
                    ui.text_colored(color, contact_line(event, telemetry.clock));
                }
            }
        });
}
