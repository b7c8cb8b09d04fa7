//! Fuzz target: config form decoder and POST route
//!
//! Drives arbitrary bodies through `parse_config_form` and the full
//! `POST /api/config` route, verifying:
//! - No panics under arbitrary byte inputs
//! - The live configuration always stays within its validated ranges
//! - Any body within the size limit decodes
//! - The route only ever answers 303, 413 or 422
//!
//! cargo fuzz run fuzz_form_parse

#![no_main]

use dumpload::adapters::region::MemoryRegion;
use dumpload::app::events::AppEvent;
use dumpload::app::ports::EventSink;
use dumpload::app::service::RegulatorService;
use dumpload::store::{ConfigStore, REGION_SIZE};
use dumpload::surface::form::{MAX_FORM_LEN, parse_config_form};
use dumpload::surface::handler::{Method, route};
use libfuzzer_sys::fuzz_target;

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let parsed = parse_config_form(data);
    assert_eq!(parsed.is_ok(), data.len() <= MAX_FORM_LEN);

    let mut store = ConfigStore::new(MemoryRegion::erased(REGION_SIZE));
    store.load();
    let mut svc = RegulatorService::new(store);
    let resp = route(&mut svc, Method::Post, "/api/config", data, &mut NullSink);

    assert!(matches!(resp.status(), 303 | 413 | 422));
    assert!(svc.config().validate().is_ok());
});
