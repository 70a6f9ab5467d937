//! Renders the live configuration as replayable command text, grouped by
//! subsystem. This is a wholly separate serialization path from the binary
//! codec: no checksum, no versioning, no shared code. Feeding the output
//! back through the command interface reproduces the same configuration.

use crate::machine::{Axis, Machine};
use crate::schema;
use alloc::format;
use alloc::string::String;

fn heading(out: &mut String, replay: bool, text: &str) {
    if !replay {
        out.push_str("; ");
        out.push_str(text);
        out.push('\n');
    }
}

fn axis_f32_line(out: &mut String, cmd: &str, values: &[f32]) {
    out.push_str(cmd);
    for (axis, value) in Axis::ALL.iter().zip(values) {
        out.push_str(&format!(" {axis}{value:.2}"));
    }
    out.push('\n');
}

pub(crate) fn report(machine: &Machine, replay: bool) -> String {
    let mut out = String::new();
    let m = &machine.motion;

    heading(&mut out, replay, "Steps per unit:");
    axis_f32_line(&mut out, "M92", &m.steps_per_mm);

    heading(&mut out, replay, "Maximum feedrates (units/s):");
    axis_f32_line(&mut out, "M203", &m.max_feedrate);

    heading(&mut out, replay, "Maximum acceleration (units/s2):");
    out.push_str("M201");
    for (axis, value) in Axis::ALL.iter().zip(&m.max_acceleration) {
        out.push_str(&format!(" {axis}{value}"));
    }
    out.push('\n');

    heading(
        &mut out,
        replay,
        "Acceleration (units/s2): P<print> R<retract> T<travel>",
    );
    out.push_str(&format!(
        "M204 P{:.2} R{:.2} T{:.2}\n",
        m.acceleration, m.retract_acceleration, m.travel_acceleration
    ));

    heading(
        &mut out,
        replay,
        "Advanced: B<min_segment_time_us> S<min_feedrate> T<min_travel_feedrate>",
    );
    out.push_str(&format!(
        "M205 B{} S{:.2} T{:.2}",
        m.min_segment_time_us, m.min_feedrate, m.min_travel_feedrate
    ));
    if schema::HAS_CLASSIC_JERK {
        for (axis, value) in Axis::ALL.iter().zip(&m.max_jerk) {
            out.push_str(&format!(" {axis}{value:.2}"));
        }
    } else {
        out.push_str(&format!(" J{:.3}", m.junction_deviation_mm));
    }
    out.push('\n');

    heading(&mut out, replay, "Home offset:");
    axis_f32_line(&mut out, "M206", &machine.home_offset);

    if schema::HAS_RUNOUT {
        heading(&mut out, replay, "Filament runout sensor:");
        out.push_str(&format!(
            "M412 S{} D{:.2}\n",
            machine.runout.enabled as u8, machine.runout.distance_mm
        ));
    }

    if schema::HAS_LEVELING {
        heading(&mut out, replay, "Bed leveling:");
        out.push_str(&format!(
            "M420 Z{:.2} O{:.3}\n",
            machine.leveling.fade_height, machine.leveling.z_offset
        ));
    }

    heading(&mut out, replay, "Probe offset:");
    axis_f32_line(&mut out, "M851", &machine.probe.offset);

    if schema::HAS_VOLUMETRICS {
        heading(&mut out, replay, "Filament settings:");
        out.push_str(&format!("M200 D{:.2}\n", machine.filament.diameter_mm));
    }

    if schema::HAS_PID {
        heading(&mut out, replay, "Hotend PID:");
        out.push_str(&format!(
            "M301 P{:.2} I{:.2} D{:.2}\n",
            machine.pid.p, machine.pid.i, machine.pid.d
        ));
    }

    if schema::HAS_CASE_LIGHT {
        heading(&mut out, replay, "Case light brightness:");
        out.push_str(&format!("M355 P{}\n", machine.case_light_brightness));
    }

    out
}
