//! The build-time-fixed schema: one descriptor per settings slice, walked in
//! table order by both the encode and decode passes. The table order IS the
//! wire contract; any change to it, to a width, or to a presence flag has to
//! come with a new [`VERSION_TAG`].

use crate::defaults;
use crate::machine::{self, DISTINCT_AXES, GRID_X, GRID_Y, Machine};

pub(crate) const VERSION_TAG: [u8; 4] = *b"V04\0";
/// Parked in the version slot while a save is in flight, so a torn write
/// surfaces as a version mismatch on the next load.
pub(crate) const TORN_TAG: [u8; 4] = *b"ERR\0";

/// Version tag plus the 16-bit payload checksum.
pub(crate) const HEADER_SIZE: usize = 6;

pub(crate) const HAS_CLASSIC_JERK: bool = cfg!(feature = "classic-jerk");
pub(crate) const HAS_RUNOUT: bool = cfg!(feature = "runout");
pub(crate) const HAS_LEVELING: bool = cfg!(feature = "leveling");
pub(crate) const HAS_PID: bool = cfg!(feature = "pid");
pub(crate) const HAS_CASE_LIGHT: bool = cfg!(feature = "case-light");
pub(crate) const HAS_VOLUMETRICS: bool = cfg!(feature = "volumetrics");

/// Lanes of the count-prefixed per-axis group: acceleration, steps-per-mm,
/// feedrate. Every lane entry is 4 bytes wide.
pub(crate) const AXIS_LANES: usize = 3;
pub(crate) const AXIS_CELL: usize = 4;

type ReadFn = fn(&Machine, &mut [u8]);
type ApplyFn = fn(&mut Machine, &[u8]);
type CellReadFn = fn(&Machine, usize, usize) -> [u8; 4];
type CellApplyFn = fn(&mut Machine, usize, usize, [u8; 4]);

#[cfg_attr(feature = "debug-logs", derive(Debug))]
pub(crate) enum Payload {
    /// Fixed-width value owned by a single provider.
    Scalar { read: ReadFn, apply: ApplyFn },
    /// Count-prefixed per-axis arrays. The stored entry count may differ
    /// from the compiled one; `fallback` back-fills what the stream lacks.
    AxisGroup {
        read: CellReadFn,
        apply: CellApplyFn,
        fallback: fn(&mut Machine, usize, usize),
    },
    /// Two-dimensional calibration grid preceded by its stored dimensions.
    /// A dimension mismatch discards the stored cells and resets the grid.
    Grid {
        read: CellReadFn,
        apply: CellApplyFn,
        reset: fn(&mut Machine),
    },
}

#[cfg_attr(feature = "debug-logs", derive(Debug))]
pub(crate) struct Descriptor {
    pub(crate) name: &'static str,
    /// Compiled byte width, count/dimension prefixes included.
    pub(crate) width: usize,
    /// Presence predicate, resolved once per build. Absent descriptors keep
    /// their slot: encode emits a placeholder, decode discards the bytes.
    pub(crate) present: bool,
    pub(crate) payload: Payload,
}

pub(crate) const DESCRIPTORS: &[Descriptor] = &[
    Descriptor {
        name: "motion_axis_limits",
        width: 1 + AXIS_LANES * AXIS_CELL * DISTINCT_AXES,
        present: true,
        payload: Payload::AxisGroup {
            read: machine::read_axis_cell,
            apply: machine::apply_axis_cell,
            fallback: defaults::default_axis_cell,
        },
    },
    Descriptor {
        name: "min_segment_time_us",
        width: 4,
        present: true,
        payload: Payload::Scalar {
            read: machine::read_min_segment_time,
            apply: machine::apply_min_segment_time,
        },
    },
    Descriptor {
        name: "acceleration",
        width: 4,
        present: true,
        payload: Payload::Scalar {
            read: machine::read_acceleration,
            apply: machine::apply_acceleration,
        },
    },
    Descriptor {
        name: "retract_acceleration",
        width: 4,
        present: true,
        payload: Payload::Scalar {
            read: machine::read_retract_acceleration,
            apply: machine::apply_retract_acceleration,
        },
    },
    Descriptor {
        name: "travel_acceleration",
        width: 4,
        present: true,
        payload: Payload::Scalar {
            read: machine::read_travel_acceleration,
            apply: machine::apply_travel_acceleration,
        },
    },
    Descriptor {
        name: "min_feedrate",
        width: 4,
        present: true,
        payload: Payload::Scalar {
            read: machine::read_min_feedrate,
            apply: machine::apply_min_feedrate,
        },
    },
    Descriptor {
        name: "min_travel_feedrate",
        width: 4,
        present: true,
        payload: Payload::Scalar {
            read: machine::read_min_travel_feedrate,
            apply: machine::apply_min_travel_feedrate,
        },
    },
    Descriptor {
        name: "max_jerk",
        width: AXIS_CELL * DISTINCT_AXES,
        present: HAS_CLASSIC_JERK,
        payload: Payload::Scalar {
            read: machine::read_max_jerk,
            apply: machine::apply_max_jerk,
        },
    },
    Descriptor {
        name: "junction_deviation_mm",
        width: 4,
        present: !HAS_CLASSIC_JERK,
        payload: Payload::Scalar {
            read: machine::read_junction_deviation,
            apply: machine::apply_junction_deviation,
        },
    },
    Descriptor {
        name: "home_offset",
        width: 12,
        present: true,
        payload: Payload::Scalar {
            read: machine::read_home_offset,
            apply: machine::apply_home_offset,
        },
    },
    Descriptor {
        name: "runout_enabled",
        width: 1,
        present: HAS_RUNOUT,
        payload: Payload::Scalar {
            read: machine::read_runout_enabled,
            apply: machine::apply_runout_enabled,
        },
    },
    Descriptor {
        name: "runout_distance_mm",
        width: 4,
        present: HAS_RUNOUT,
        payload: Payload::Scalar {
            read: machine::read_runout_distance,
            apply: machine::apply_runout_distance,
        },
    },
    Descriptor {
        name: "fade_height",
        width: 4,
        present: HAS_LEVELING,
        payload: Payload::Scalar {
            read: machine::read_fade_height,
            apply: machine::apply_fade_height,
        },
    },
    Descriptor {
        name: "level_z_offset",
        width: 4,
        present: HAS_LEVELING,
        payload: Payload::Scalar {
            read: machine::read_level_z_offset,
            apply: machine::apply_level_z_offset,
        },
    },
    Descriptor {
        name: "level_grid",
        width: 2 + AXIS_CELL * GRID_X * GRID_Y,
        present: HAS_LEVELING,
        payload: Payload::Grid {
            read: machine::read_grid_cell,
            apply: machine::apply_grid_cell,
            reset: machine::reset_grid,
        },
    },
    Descriptor {
        name: "probe_offset",
        width: 12,
        present: true,
        payload: Payload::Scalar {
            read: machine::read_probe_offset,
            apply: machine::apply_probe_offset,
        },
    },
    Descriptor {
        name: "filament_diameter_mm",
        width: 4,
        present: HAS_VOLUMETRICS,
        payload: Payload::Scalar {
            read: machine::read_filament_diameter,
            apply: machine::apply_filament_diameter,
        },
    },
    Descriptor {
        name: "hotend_pid",
        width: 12,
        present: HAS_PID,
        payload: Payload::Scalar {
            read: machine::read_hotend_pid,
            apply: machine::apply_hotend_pid,
        },
    },
    Descriptor {
        name: "case_light_brightness",
        width: 1,
        present: HAS_CASE_LIGHT,
        payload: Payload::Scalar {
            read: machine::read_case_light,
            apply: machine::apply_case_light,
        },
    },
];

pub(crate) const fn payload_size() -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < DESCRIPTORS.len() {
        total += DESCRIPTORS[i].width;
        i += 1;
    }
    total
}

pub(crate) const PAYLOAD_SIZE: usize = payload_size();
pub(crate) const DATA_SIZE: usize = HEADER_SIZE + PAYLOAD_SIZE;

// Wire contract for tag V04. Any schema edit that trips this assertion must
// ship with a new VERSION_TAG and an updated size here.
const _: () = assert!(PAYLOAD_SIZE == 249, "schema layout changed without a version bump");

/// Scratch buffer bound for scalar descriptors.
pub(crate) const MAX_SCALAR_WIDTH: usize = 16;

const fn scalars_fit_scratch() -> bool {
    let mut i = 0;
    while i < DESCRIPTORS.len() {
        match &DESCRIPTORS[i].payload {
            Payload::Scalar { .. } if DESCRIPTORS[i].width > MAX_SCALAR_WIDTH => return false,
            _ => {}
        }
        i += 1;
    }
    true
}

const _: () = assert!(scalars_fit_scratch(), "scalar wider than the codec scratch buffer");
