#![allow(dead_code)]

use std::{fs, path::PathBuf};

use rtls_capture_lib::{
    config::MalformedPolicy,
    receiver::CaptureSession,
    sample_assembler::LegacyAssembler,
    sample_log::{Durability, SampleLog},
};

/// A fresh, not yet existing log file under the system temp directory.
pub fn temp_log_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rtls-capture-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{name}.txt"));
    let _ = fs::remove_file(&path);
    return path;
}

/// A legacy dgram as sent by a tag: two filler bytes, then the value.
pub fn tag_payload(text: &str) -> Vec<u8> {
    return format!("::{text}").into_bytes();
}

pub fn legacy_session(name: &str, policy: MalformedPolicy) -> (CaptureSession, PathBuf) {
    let path = temp_log_path(name);
    let log = SampleLog::open(&path, Durability::PerWrite).unwrap();
    let session = CaptureSession::new(Box::new(LegacyAssembler::new()), log, policy);
    return (session, path);
}

pub fn read_log(path: &PathBuf) -> String {
    return fs::read_to_string(path).unwrap();
}
