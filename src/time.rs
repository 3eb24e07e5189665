use std::time::{SystemTime, UNIX_EPOCH};

// The sink takes microsecond timestamps, so that is what points traffic in
// internally.

pub fn unix_now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System time precedes epoch")
        .as_micros() as u64
}

#[test]
pub fn test_unix_now_micros() {
    // 2020-01-01T00:00:00Z in microseconds; a clock this far off indicates
    // some kind of bug.
    let t = unix_now_micros();
    assert!(t > 1_577_836_800_000_000);
}
