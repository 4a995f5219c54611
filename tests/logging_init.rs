//! File logging init. Lives in its own test binary because it installs the
//! process-wide subscriber.

use polling::logging;
use polling::Poll;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn poll_events_land_in_log_file() {
    let dir = tempdir().unwrap();
    let path = logging::init_logging_at(dir.path()).unwrap();
    assert_eq!(path, dir.path().join("polling.log"));

    Poll::new(Duration::ZERO)
        .max_tries(1)
        .name("log_file_probe")
        .run(|| -> Result<bool, ()> { Ok(true) })
        .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("polling logging initialized"));
    assert!(contents.contains("Begin poll(target=log_file_probe"));

    // A second global subscriber is refused instead of panicking.
    assert!(logging::init_logging_stderr().is_err());
}
