mod common;

use common::{BLOB_OFFSET, Eeprom};
use pretty_assertions::assert_eq;
use settings_store::{Machine, Settings};

#[test]
fn replay_mode_emits_commands_only() {
    let store = Settings::new(BLOB_OFFSET, Eeprom::new());
    let out = store.report(&Machine::default(), true);

    assert!(!out.is_empty());
    for line in out.lines() {
        assert!(
            !line.starts_with(';'),
            "comment in replay output: {line:?}"
        );
        assert!(line.starts_with('M'), "non-command line: {line:?}");
    }
}

#[test]
fn full_report_interleaves_headings() {
    let store = Settings::new(BLOB_OFFSET, Eeprom::new());
    let out = store.report(&Machine::default(), false);

    assert!(out.contains("; Steps per unit:\n"));
    assert!(out.contains("; Maximum feedrates (units/s):\n"));
    assert!(out.contains("; Hotend PID:\n"));

    // Stripping the headings yields exactly the replay rendition.
    let commands: String = out
        .lines()
        .filter(|line| !line.starts_with(';'))
        .flat_map(|line| [line, "\n"])
        .collect();
    assert_eq!(commands, store.report(&Machine::default(), true));
}

#[test]
fn report_reflects_live_values() {
    let store = Settings::new(BLOB_OFFSET, Eeprom::new());
    let mut machine = Machine::default();
    machine.motion.steps_per_mm = [100.0, 100.0, 410.0, 120.0];
    machine.motion.acceleration = 2500.0;
    machine.pid.p = 18.0;
    machine.case_light_brightness = 128;

    let out = store.report(&machine, true);

    assert!(out.contains("M92 X100.00 Y100.00 Z410.00 E120.00\n"));
    assert!(out.contains("M201 X3000 Y3000 Z100 E10000\n"));
    assert!(out.contains("M204 P2500.00 R3000.00 T3000.00\n"));
    assert!(out.contains("M301 P18.00 I1.08 D114.00\n"));
    assert!(out.contains("M355 P128\n"));
}

#[test]
fn report_is_deterministic() {
    let store = Settings::new(BLOB_OFFSET, Eeprom::new());
    let machine = Machine::default();
    assert_eq!(store.report(&machine, false), store.report(&machine, false));
}
