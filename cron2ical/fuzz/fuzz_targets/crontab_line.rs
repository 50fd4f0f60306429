#![no_main]
use cron2ical::crontab::{parse_line, FilterList};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let filters = FilterList::new(vec!["sudo ", "> /dev/null"]);
        if let Ok(Some(entry)) = parse_line(1, s, &filters) {
            assert!(filters.iter().all(|filter| !entry.command().contains(filter)));
            assert_eq!(entry.command(), entry.command().trim());
        }
    }
});
