//! Defaulting engine: compiled default values and the policies that fill
//! provider slots the stream could not, either because a feature is disabled,
//! an array grew since the blob was stored, or a grid went stale.

use crate::machine::{
    DISTINCT_AXES, Filament, Grid, HotendPid, Leveling, Machine, Motion, Probe, Runout,
};

// Indexed default tables for the per-axis groups. An image compiled with
// more axes than a table has entries clamps to the final entry, so a single
// extruder default covers any number of added extruder steppers.
pub(crate) const DEFAULT_MAX_ACCELERATION: &[u32] = &[3000, 3000, 100, 10_000];
pub(crate) const DEFAULT_STEPS_PER_MM: &[f32] = &[80.0, 80.0, 400.0, 500.0];
pub(crate) const DEFAULT_MAX_FEEDRATE: &[f32] = &[300.0, 300.0, 5.0, 25.0];
pub(crate) const DEFAULT_MAX_JERK: [f32; DISTINCT_AXES] = [10.0, 10.0, 0.3, 5.0];

pub(crate) const DEFAULT_MIN_SEGMENT_TIME_US: u32 = 20_000;
pub(crate) const DEFAULT_ACCELERATION: f32 = 3000.0;
pub(crate) const DEFAULT_RETRACT_ACCELERATION: f32 = 3000.0;
pub(crate) const DEFAULT_TRAVEL_ACCELERATION: f32 = 3000.0;
pub(crate) const DEFAULT_MIN_FEEDRATE: f32 = 0.0;
pub(crate) const DEFAULT_MIN_TRAVEL_FEEDRATE: f32 = 0.0;
pub(crate) const DEFAULT_JUNCTION_DEVIATION_MM: f32 = 0.013;
pub(crate) const DEFAULT_RUNOUT_DISTANCE_MM: f32 = 25.0;
pub(crate) const DEFAULT_FILAMENT_DIAMETER_MM: f32 = 1.75;
pub(crate) const DEFAULT_PROBE_OFFSET: [f32; 3] = [10.0, 10.0, 0.0];
pub(crate) const DEFAULT_HOTEND_PID: HotendPid = HotendPid {
    p: 22.2,
    i: 1.08,
    d: 114.0,
};
pub(crate) const DEFAULT_CASE_LIGHT_BRIGHTNESS: u8 = 255;

/// Indexed lookup clamped to the table's final entry.
pub(crate) fn axis_default<T: Copy>(table: &[T], index: usize) -> T {
    table[index.min(table.len() - 1)]
}

/// Back-fill one per-axis cell the stored blob had no entry for.
pub(crate) fn default_axis_cell(m: &mut Machine, lane: usize, axis: usize) {
    match lane {
        0 => m.motion.max_acceleration[axis] = axis_default(DEFAULT_MAX_ACCELERATION, axis),
        1 => m.motion.steps_per_mm[axis] = axis_default(DEFAULT_STEPS_PER_MM, axis),
        _ => m.motion.max_feedrate[axis] = axis_default(DEFAULT_MAX_FEEDRATE, axis),
    }
}

pub(crate) fn machine_defaults() -> Machine {
    let mut motion = Motion {
        max_acceleration: [0; DISTINCT_AXES],
        steps_per_mm: [0.0; DISTINCT_AXES],
        max_feedrate: [0.0; DISTINCT_AXES],
        min_segment_time_us: DEFAULT_MIN_SEGMENT_TIME_US,
        acceleration: DEFAULT_ACCELERATION,
        retract_acceleration: DEFAULT_RETRACT_ACCELERATION,
        travel_acceleration: DEFAULT_TRAVEL_ACCELERATION,
        min_feedrate: DEFAULT_MIN_FEEDRATE,
        min_travel_feedrate: DEFAULT_MIN_TRAVEL_FEEDRATE,
        max_jerk: DEFAULT_MAX_JERK,
        junction_deviation_mm: DEFAULT_JUNCTION_DEVIATION_MM,
        steps_to_mm: [0.0; DISTINCT_AXES],
    };
    for i in 0..DISTINCT_AXES {
        motion.max_acceleration[i] = axis_default(DEFAULT_MAX_ACCELERATION, i);
        motion.steps_per_mm[i] = axis_default(DEFAULT_STEPS_PER_MM, i);
        motion.max_feedrate[i] = axis_default(DEFAULT_MAX_FEEDRATE, i);
        motion.steps_to_mm[i] = 1.0 / motion.steps_per_mm[i];
    }

    Machine {
        motion,
        home_offset: [0.0; 3],
        runout: Runout {
            enabled: true,
            distance_mm: DEFAULT_RUNOUT_DISTANCE_MM,
        },
        leveling: Leveling {
            fade_height: 0.0,
            z_offset: 0.0,
            grid: Grid::default(),
        },
        probe: Probe {
            offset: DEFAULT_PROBE_OFFSET,
        },
        filament: Filament {
            diameter_mm: DEFAULT_FILAMENT_DIAMETER_MM,
        },
        pid: DEFAULT_HOTEND_PID,
        case_light_brightness: DEFAULT_CASE_LIGHT_BRIGHTNESS,
    }
}
