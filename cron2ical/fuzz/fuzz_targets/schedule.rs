#![no_main]
use chrono::NaiveDate;
use cron2ical::Cron;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(cron) = s.parse::<Cron>() {
            let start = NaiveDate::from_ymd_opt(2024, 9, 2)
                .and_then(|day| day.and_hms_opt(0, 0, 0))
                .unwrap();
            if let Some(next) = cron.next_from(start) {
                assert!(next >= start);
                assert!(cron.contains(next), "{:?} doesn't contain {}", cron, next);
                if let Some(after) = cron.next_after(next) {
                    assert!(after > next);
                }
            }
        }
    }
});
