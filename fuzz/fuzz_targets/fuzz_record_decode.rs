//! Fuzz target: persisted config record decoder
//!
//! Feeds arbitrary region contents to `ConfigStore::load` and verifies:
//! - No panics under arbitrary byte inputs
//! - The live configuration afterwards always passes validation
//! - Any record `decode` accepts re-encodes to identical bytes
//!
//! cargo fuzz run fuzz_record_decode

#![no_main]

use dumpload::adapters::region::MemoryRegion;
use dumpload::store::record::{self, RECORD_LEN};
use dumpload::store::{ConfigStore, REGION_SIZE};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut region = vec![0xFF; REGION_SIZE];
    let n = data.len().min(REGION_SIZE);
    region[..n].copy_from_slice(&data[..n]);

    if let Ok(cfg) = record::decode(&region[..RECORD_LEN]) {
        let again = record::encode(&cfg).expect("decoded config must re-encode");
        assert_eq!(&again[..], &region[..RECORD_LEN]);
    }

    let mut store = ConfigStore::new(MemoryRegion::from_bytes(region));
    store.load();
    assert!(store.config().validate().is_ok());
});
