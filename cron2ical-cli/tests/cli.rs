use std::fs;
use std::process::{Command, Output};

fn cron2ical(args: &[&std::ffi::OsStr]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cron2ical"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run cron2ical")
}

#[test]
fn converts_a_crontab() {
    let dir = tempfile::tempdir().unwrap();
    let crontab = dir.path().join("crontab");
    let ical = dir.path().join("cron.ics");
    fs::write(&crontab, "0 9 * * 1 backup.sh\n").unwrap();

    let output = cron2ical(&[crontab.as_os_str(), ical.as_os_str(), "02-09-2024".as_ref()]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout,
        format!(
            "    1 events for backup.sh\nDone! Saving file ...\nSaved 1 events to {}!\n",
            ical.display()
        )
    );
    assert!(fs::read_to_string(&ical).unwrap().contains("SUMMARY:backup.sh\r\n"));
}

#[test]
fn errors_exit_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let crontab = dir.path().join("missing");
    let ical = dir.path().join("cron.ics");

    let output = cron2ical(&[crontab.as_os_str(), ical.as_os_str(), "02-09-2024".as_ref()]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("error: given crontab file is not a file"), "{}", stderr);
    assert_eq!(stderr.lines().count(), 1);
    assert!(!ical.exists());
}

#[test]
fn options() {
    let dir = tempfile::tempdir().unwrap();
    let crontab = dir.path().join("crontab");
    let filters = dir.path().join("filters");
    let ical = dir.path().join("cron.ics");
    fs::write(&crontab, "0 0 * * * sudo reboot\n").unwrap();
    fs::write(&filters, "sudo \n").unwrap();

    let output = cron2ical(&[
        crontab.as_os_str(),
        ical.as_os_str(),
        "02-09-2024".as_ref(),
        filters.as_os_str(),
        "--tzid".as_ref(),
        "UTC".as_ref(),
        "--name".as_ref(),
        "Servers".as_ref(),
    ]);
    assert!(output.status.success());

    let calendar = fs::read_to_string(&ical).unwrap();
    assert!(calendar.contains("SUMMARY:reboot\r\n"));
    assert!(calendar.contains("DTSTART;TZID=UTC:20240902T000000\r\n"));
    assert!(calendar.contains("X-WR-CALNAME:Servers\r\n"));
}
