#![no_main]

use libfuzzer_sys::fuzz_target;
use kuma_accesslog_streamer::PipeRecord;

fuzz_target!(|data: &[u8]| {
    if let Some(record) = PipeRecord::parse(data) {
        assert!(!record.address.is_empty());
        assert_eq!(record.address, record.address.trim());
    }
});
