use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use engine::TimeMachine;
use engine::regression::{history_hashes, state_sha256_hex};

fn unique_temp_json_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("cryptris_engine_test_{tag}_{nanos}.json"))
}

#[test]
fn timemachine_save_and_load_roundtrips_history_and_frame() {
    let mut tm = TimeMachine::new(vec![3, 0, -1]);
    tm.record(vec![2, 0, -1]);
    tm.record(vec![1, 0, -1]);

    // Branch after a rewind so the truncated history is what gets saved.
    tm.rewind(1);
    tm.record(vec![0, 0, 0]);

    let out = unique_temp_json_path("roundtrip");
    tm.save_json_file(&out).expect("save timemachine json");

    let loaded = TimeMachine::<Vec<i32>>::load_json_file(&out).expect("load timemachine json");
    assert_eq!(loaded.frame(), tm.frame());
    assert_eq!(loaded.history(), tm.history());
    assert_eq!(
        history_hashes(&loaded).unwrap(),
        history_hashes(&tm).unwrap()
    );
    assert_eq!(
        state_sha256_hex(loaded.state()).unwrap(),
        state_sha256_hex(&vec![0, 0, 0]).unwrap()
    );

    let _ = fs::remove_file(out);
}

#[test]
fn loading_garbage_is_invalid_data() {
    let out = unique_temp_json_path("garbage");
    fs::write(&out, b"{not json").unwrap();

    let err = TimeMachine::<i32>::load_json_file(&out).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);

    let _ = fs::remove_file(out);
}
