mod common;

use common::{BLOB_OFFSET, Eeprom};
use pretty_assertions::assert_eq;
use settings_store::{Error, GRID_X, GRID_Y, Grid, Machine, Settings};

fn sample_grid(seed: f32) -> Grid {
    let mut grid = Grid::default();
    for y in 0..GRID_Y {
        for x in 0..GRID_X {
            grid.z_values[y][x] = seed + (y * GRID_X + x) as f32 * 0.01;
        }
    }
    grid
}

#[test]
fn count_follows_geometry() {
    // Blob at 100, 255 data bytes, 32 bytes margin, aligned up to 392;
    // (4096 - 392) / 128 leaves 28 whole records.
    let store = Settings::new(BLOB_OFFSET, Eeprom::new());
    assert_eq!(store.slot_count(), 28);

    let store = Settings::new(BLOB_OFFSET, Eeprom::with_size(600));
    assert_eq!(store.slot_count(), 1);

    // Not enough tail for even one record.
    let store = Settings::new(BLOB_OFFSET, Eeprom::with_size(400));
    assert_eq!(store.slot_count(), 0);
}

#[test]
fn round_trip_first_and_last_slot() {
    let mut store = Settings::new(BLOB_OFFSET, Eeprom::new());
    let first = sample_grid(-0.5);
    let last = sample_grid(2.0);

    store.store_slot(0, &first).unwrap();
    store.store_slot(27, &last).unwrap();

    let mut restored = Grid::default();
    store.load_slot(0, &mut restored).unwrap();
    assert_eq!(restored, first);
    store.load_slot(27, &mut restored).unwrap();
    assert_eq!(restored, last);
}

#[test]
fn out_of_range_index_performs_no_io() {
    let mut store = Settings::new(BLOB_OFFSET, Eeprom::new());

    let result = store.store_slot(28, &sample_grid(0.0));
    assert_eq!(
        result,
        Err(Error::SlotIndexOutOfRange {
            index: 28,
            count: 28
        })
    );

    let mut grid = Grid::default();
    let result = store.load_slot(255, &mut grid);
    assert_eq!(
        result,
        Err(Error::SlotIndexOutOfRange {
            index: 255,
            count: 28
        })
    );

    assert!(store.into_inner().operations.is_empty());
}

#[test]
fn slots_and_blob_do_not_interfere() {
    let mut store = Settings::new(BLOB_OFFSET, Eeprom::new());
    let mut machine = Machine::default();
    machine.motion.acceleration = 1800.0;
    store.save(&machine).unwrap();

    store.store_slot(0, &sample_grid(1.0)).unwrap();
    store.store_slot(27, &sample_grid(-1.0)).unwrap();

    // The blob still validates after slot traffic on the same medium.
    let mut restored = Machine::default();
    store.load(&mut restored).unwrap();
    assert_eq!(restored, machine);

    let mut grid = Grid::default();
    store.load_slot(0, &mut grid).unwrap();
    assert_eq!(grid, sample_grid(1.0));
}

#[test]
fn slot_fault_is_local_to_the_slot() {
    let mut store = Settings::new(BLOB_OFFSET, Eeprom::new());
    let machine = Machine::default();
    store.save(&machine).unwrap();

    let mut eeprom = store.into_inner();
    // The next session opens fine but its first transfer faults.
    eeprom.fail_after_operation = eeprom.operations.len() + 1;
    let mut store = Settings::new(BLOB_OFFSET, eeprom);

    assert_eq!(
        store.store_slot(3, &sample_grid(0.5)),
        Err(Error::SlotIoFailure)
    );

    let mut eeprom = store.into_inner();
    eeprom.disable_faults();
    let mut store = Settings::new(BLOB_OFFSET, eeprom);
    let mut restored = Machine::default();
    store.validate(&mut restored).unwrap();
}
