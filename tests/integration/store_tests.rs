//! Integration tests for the configuration store against the RAM region:
//! first boot, power cycles, torn writes and idempotent saves.

use dumpload::adapters::region::MemoryRegion;
use dumpload::app::commands::ConfigUpdate;
use dumpload::app::ports::{ConfigError, StoragePort};
use dumpload::config::RegulatorConfig;
use dumpload::store::record::{self, RECORD_LEN};
use dumpload::store::{ConfigStore, LoadOutcome, RECORD_OFFSET, REGION_SIZE};

fn power_cycle(store: ConfigStore<MemoryRegion>) -> ConfigStore<MemoryRegion> {
    let mut region = store.storage().clone();
    region.reboot();
    let mut next = ConfigStore::new(region);
    next.load();
    next
}

// ── Scenario E: first boot ────────────────────────────────────

#[test]
fn erased_region_loads_defaults_not_garbage() {
    let mut store = ConfigStore::new(MemoryRegion::erased(REGION_SIZE));
    assert_eq!(store.load(), LoadOutcome::Defaults(ConfigError::NotFound));

    let c = store.config();
    assert_eq!(*c, RegulatorConfig::default());
    assert!(c.hysteresis >= 0.0);
    assert!(c.absorption_voltage > 0.0);
}

#[test]
fn random_garbage_loads_defaults() {
    let garbage: Vec<u8> = (0..REGION_SIZE).map(|i| (i * 37 + 11) as u8).collect();
    let mut store = ConfigStore::new(MemoryRegion::from_bytes(garbage));
    assert_eq!(store.load(), LoadOutcome::Defaults(ConfigError::Corrupted));
    assert_eq!(*store.config(), RegulatorConfig::default());
}

// ── Power cycles ──────────────────────────────────────────────

#[test]
fn saved_config_survives_power_cycle() {
    let mut store = ConfigStore::new(MemoryRegion::erased(REGION_SIZE));
    store.load();
    store.apply(&ConfigUpdate {
        absorption_voltage: Some(14.4),
        float_voltage: Some(13.6),
        hysteresis: Some(0.2),
        manual_override: true,
        manual_dump_load: false,
    });
    store.save().unwrap();
    let expected = *store.config();

    let store = power_cycle(store);
    assert_eq!(*store.config(), expected);
}

#[test]
fn unsaved_changes_are_lost_on_power_cycle() {
    let mut store = ConfigStore::new(MemoryRegion::erased(REGION_SIZE));
    store.load();
    store.apply(&ConfigUpdate {
        hysteresis: Some(2.0),
        ..ConfigUpdate::default()
    });
    let store = power_cycle(store);
    assert_eq!(*store.config(), RegulatorConfig::default());
}

#[test]
fn failed_commit_does_not_reach_the_medium() {
    let mut store = ConfigStore::new(MemoryRegion::erased(REGION_SIZE));
    store.load();
    store.apply(&ConfigUpdate {
        absorption_voltage: Some(29.0),
        ..ConfigUpdate::default()
    });
    store.storage_mut().fail_commits(true);
    assert!(store.save().is_err());

    let store = power_cycle(store);
    assert_eq!(*store.config(), RegulatorConfig::default());
}

// ── Torn writes ───────────────────────────────────────────────

#[test]
fn torn_record_is_rejected_after_power_loss() {
    let mut store = ConfigStore::new(MemoryRegion::erased(REGION_SIZE));
    store.load();
    store.save().unwrap();

    // Power lost with only the first 10 bytes of a new record written.
    let newer = record::encode(&RegulatorConfig {
        absorption_voltage: 60.0,
        float_voltage: 55.0,
        ..Default::default()
    })
    .unwrap();
    let mut region = store.storage().clone();
    region.corrupt(RECORD_OFFSET, &newer[..10]);

    let mut store = ConfigStore::new(region);
    assert_eq!(store.load(), LoadOutcome::Defaults(ConfigError::Corrupted));
    assert_eq!(*store.config(), RegulatorConfig::default());
}

// ── Idempotence ───────────────────────────────────────────────

#[test]
fn resaving_same_config_leaves_bytes_unchanged() {
    let mut store = ConfigStore::new(MemoryRegion::erased(REGION_SIZE));
    store.load();
    store.save().unwrap();
    let first = store.storage().durable().to_vec();

    let report = store.apply(&ConfigUpdate::restating(&RegulatorConfig::default()));
    assert!(!report.changed);
    store.save().unwrap();
    assert_eq!(store.storage().durable(), &first[..]);
}

#[test]
fn record_occupies_only_its_slot() {
    let mut store = ConfigStore::new(MemoryRegion::erased(REGION_SIZE));
    store.load();
    store.save().unwrap();

    let mut tail = [0u8; REGION_SIZE - RECORD_LEN];
    store.storage().read(RECORD_LEN, &mut tail).unwrap();
    assert!(tail.iter().all(|&b| b == 0xFF));
}
