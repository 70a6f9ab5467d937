use crate::defaults;

/// Cartesian axes ahead of the extruder steppers.
pub const AXES: usize = 3;
/// Extruder stepper count compiled into this image. The stored count may
/// differ; the defaulting engine reconciles the two on load.
pub const E_STEPPERS: usize = 1;
/// Entries in each per-axis settings array.
pub const DISTINCT_AXES: usize = AXES + E_STEPPERS;

pub const GRID_X: usize = 5;
pub const GRID_Y: usize = 5;
pub(crate) const GRID_BYTES: usize = GRID_X * GRID_Y * 4;

#[derive(strum::Display, strum::FromRepr, Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Axis {
    X,
    Y,
    Z,
    E,
}

impl Axis {
    pub const ALL: [Axis; DISTINCT_AXES] = [Axis::X, Axis::Y, Axis::Z, Axis::E];
}

/// Motion profile limits, the largest settings group. The per-axis arrays
/// are stored count-prefixed so an image compiled with a different
/// `E_STEPPERS` can still restore them.
#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    pub max_acceleration: [u32; DISTINCT_AXES],
    pub steps_per_mm: [f32; DISTINCT_AXES],
    pub max_feedrate: [f32; DISTINCT_AXES],
    pub min_segment_time_us: u32,
    pub acceleration: f32,
    pub retract_acceleration: f32,
    pub travel_acceleration: f32,
    pub min_feedrate: f32,
    pub min_travel_feedrate: f32,
    pub max_jerk: [f32; DISTINCT_AXES],
    pub junction_deviation_mm: f32,
    /// Derived from `steps_per_mm` by `postprocess`, never persisted.
    pub steps_to_mm: [f32; DISTINCT_AXES],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Runout {
    pub enabled: bool,
    pub distance_mm: f32,
}

/// Bed leveling state. The small grid travels inside the blob; full
/// calibration grids are kept in the slot region instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Leveling {
    pub fade_height: f32,
    pub z_offset: f32,
    pub grid: Grid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub z_values: [[f32; GRID_X]; GRID_Y],
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            z_values: [[0.0; GRID_X]; GRID_Y],
        }
    }
}

impl Grid {
    pub(crate) fn to_bytes(&self) -> [u8; GRID_BYTES] {
        let mut out = [0u8; GRID_BYTES];
        for (cell, chunk) in self
            .z_values
            .iter()
            .flatten()
            .zip(out.chunks_exact_mut(4))
        {
            chunk.copy_from_slice(&cell.to_le_bytes());
        }
        out
    }

    pub(crate) fn from_bytes(bytes: &[u8; GRID_BYTES]) -> Self {
        let mut grid = Grid::default();
        for (cell, chunk) in grid
            .z_values
            .iter_mut()
            .flatten()
            .zip(bytes.chunks_exact(4))
        {
            *cell = f32_le(chunk);
        }
        grid
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub offset: [f32; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filament {
    pub diameter_mm: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HotendPid {
    pub p: f32,
    pub i: f32,
    pub d: f32,
}

/// Owner of every live configuration value the schema binds to. The real
/// firmware spreads these across its subsystems; bundling them keeps the
/// engine decoupled from globals and testable on the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    pub motion: Motion,
    pub home_offset: [f32; 3],
    pub runout: Runout,
    pub leveling: Leveling,
    pub probe: Probe,
    pub filament: Filament,
    pub pid: HotendPid,
    pub case_light_brightness: u8,
}

impl Default for Machine {
    fn default() -> Self {
        defaults::machine_defaults()
    }
}

impl Machine {
    /// Recompute values derived from freshly loaded base values. Runs
    /// exactly once, after a successful commit pass or after a reset, never
    /// during a validate-only pass.
    pub fn postprocess(&mut self) {
        for i in 0..DISTINCT_AXES {
            self.motion.steps_to_mm[i] = 1.0 / self.motion.steps_per_mm[i];
        }
        self.leveling.fade_height = self.leveling.fade_height.clamp(0.0, 100.0);
    }
}

#[inline]
pub(crate) fn f32_le(bytes: &[u8]) -> f32 {
    f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[inline]
pub(crate) fn u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

// Provider bindings referenced by the schema table. Each pair reads the
// current bytes of one settings slice and applies restored bytes back.

macro_rules! f32_provider {
    ($read:ident, $apply:ident, $($field:ident).+) => {
        pub(crate) fn $read(m: &Machine, out: &mut [u8]) {
            out.copy_from_slice(&m.$($field).+.to_le_bytes());
        }
        pub(crate) fn $apply(m: &mut Machine, bytes: &[u8]) {
            m.$($field).+ = f32_le(bytes);
        }
    };
}

macro_rules! f32_array_provider {
    ($read:ident, $apply:ident, $($field:ident).+) => {
        pub(crate) fn $read(m: &Machine, out: &mut [u8]) {
            for (i, chunk) in out.chunks_exact_mut(4).enumerate() {
                chunk.copy_from_slice(&m.$($field).+[i].to_le_bytes());
            }
        }
        pub(crate) fn $apply(m: &mut Machine, bytes: &[u8]) {
            for (i, chunk) in bytes.chunks_exact(4).enumerate() {
                m.$($field).+[i] = f32_le(chunk);
            }
        }
    };
}

f32_provider!(read_acceleration, apply_acceleration, motion.acceleration);
f32_provider!(
    read_retract_acceleration,
    apply_retract_acceleration,
    motion.retract_acceleration
);
f32_provider!(
    read_travel_acceleration,
    apply_travel_acceleration,
    motion.travel_acceleration
);
f32_provider!(read_min_feedrate, apply_min_feedrate, motion.min_feedrate);
f32_provider!(
    read_min_travel_feedrate,
    apply_min_travel_feedrate,
    motion.min_travel_feedrate
);
f32_provider!(
    read_junction_deviation,
    apply_junction_deviation,
    motion.junction_deviation_mm
);
f32_provider!(read_runout_distance, apply_runout_distance, runout.distance_mm);
f32_provider!(read_fade_height, apply_fade_height, leveling.fade_height);
f32_provider!(read_level_z_offset, apply_level_z_offset, leveling.z_offset);
f32_provider!(
    read_filament_diameter,
    apply_filament_diameter,
    filament.diameter_mm
);

f32_array_provider!(read_max_jerk, apply_max_jerk, motion.max_jerk);
f32_array_provider!(read_home_offset, apply_home_offset, home_offset);
f32_array_provider!(read_probe_offset, apply_probe_offset, probe.offset);

pub(crate) fn read_min_segment_time(m: &Machine, out: &mut [u8]) {
    out.copy_from_slice(&m.motion.min_segment_time_us.to_le_bytes());
}

pub(crate) fn apply_min_segment_time(m: &mut Machine, bytes: &[u8]) {
    m.motion.min_segment_time_us = u32_le(bytes);
}

pub(crate) fn read_runout_enabled(m: &Machine, out: &mut [u8]) {
    out[0] = m.runout.enabled as u8;
}

pub(crate) fn apply_runout_enabled(m: &mut Machine, bytes: &[u8]) {
    m.runout.enabled = bytes[0] != 0;
}

pub(crate) fn read_hotend_pid(m: &Machine, out: &mut [u8]) {
    out[0..4].copy_from_slice(&m.pid.p.to_le_bytes());
    out[4..8].copy_from_slice(&m.pid.i.to_le_bytes());
    out[8..12].copy_from_slice(&m.pid.d.to_le_bytes());
}

pub(crate) fn apply_hotend_pid(m: &mut Machine, bytes: &[u8]) {
    m.pid.p = f32_le(&bytes[0..4]);
    m.pid.i = f32_le(&bytes[4..8]);
    m.pid.d = f32_le(&bytes[8..12]);
}

pub(crate) fn read_case_light(m: &Machine, out: &mut [u8]) {
    out[0] = m.case_light_brightness;
}

pub(crate) fn apply_case_light(m: &mut Machine, bytes: &[u8]) {
    m.case_light_brightness = bytes[0];
}

/// One 4-byte cell of the count-prefixed per-axis group. Lane 0 carries the
/// acceleration limits, lane 1 the steps-per-mm table, lane 2 the feedrate
/// limits.
pub(crate) fn read_axis_cell(m: &Machine, lane: usize, axis: usize) -> [u8; 4] {
    match lane {
        0 => m.motion.max_acceleration[axis].to_le_bytes(),
        1 => m.motion.steps_per_mm[axis].to_le_bytes(),
        _ => m.motion.max_feedrate[axis].to_le_bytes(),
    }
}

pub(crate) fn apply_axis_cell(m: &mut Machine, lane: usize, axis: usize, bytes: [u8; 4]) {
    match lane {
        0 => m.motion.max_acceleration[axis] = u32::from_le_bytes(bytes),
        1 => m.motion.steps_per_mm[axis] = f32::from_le_bytes(bytes),
        _ => m.motion.max_feedrate[axis] = f32::from_le_bytes(bytes),
    }
}

pub(crate) fn read_grid_cell(m: &Machine, x: usize, y: usize) -> [u8; 4] {
    m.leveling.grid.z_values[y][x].to_le_bytes()
}

pub(crate) fn apply_grid_cell(m: &mut Machine, x: usize, y: usize, bytes: [u8; 4]) {
    m.leveling.grid.z_values[y][x] = f32::from_le_bytes(bytes);
}

pub(crate) fn reset_grid(m: &mut Machine) {
    m.leveling.grid = Grid::default();
}
