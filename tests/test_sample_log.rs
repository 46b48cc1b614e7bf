use std::{fs, io::Cursor};

use assert_matches::assert_matches;
use rtls_capture_lib::incoming_message_parser::Sample;
use rtls_capture_lib::sample_assembler::Assembled;
use rtls_capture_lib::sample_log::{
    format_line, format_x, format_y, read_samples, read_samples_from, Durability, SampleLog,
};
use rtls_capture_lib::Error;
use proptest::prelude::*;

mod common;
use common::{read_log, temp_log_path};

#[test]
fn natural_x_and_three_decimal_y() {
    assert_eq!(format_x(100.0), "100.0");
    assert_eq!(format_x(1234.5), "1234.5");
    assert_eq!(format_y(200.5), "200.500");
    assert_eq!(format_y(12.3456), "12.346");
    assert_eq!(format_line(&Sample::new(100.0, 200.5)), "100.0 200.500\n");
}

#[test]
fn pending_x_opens_a_line() {
    let path = temp_log_path("pending_x_opens_a_line");
    let mut log = SampleLog::open(&path, Durability::PerWrite).unwrap();

    log.record(&Assembled::Pending(100.0)).unwrap();
    assert_eq!(read_log(&path), "100.0 ");

    log.record(&Assembled::Complete(Sample::new(100.0, 200.5))).unwrap();
    assert_eq!(read_log(&path), "100.0 200.500\n");

    log.record(&Assembled::Pending(50.25)).unwrap();
    assert_eq!(read_log(&path), "100.0 200.500\n50.25 ");
}

#[test]
fn complete_sample_without_pending_x_writes_whole_line() {
    let path = temp_log_path("complete_sample_writes_whole_line");
    let mut log = SampleLog::open(&path, Durability::PerWrite).unwrap();
    log.record(&Assembled::Complete(Sample::new(1.5, 2.0))).unwrap();
    log.record(&Assembled::Complete(Sample::new(3.0, 4.25))).unwrap();
    assert_eq!(read_log(&path), "1.5 2.000\n3.0 4.250\n");
}

#[test]
fn flush_mode_writes_through() {
    let path = temp_log_path("flush_mode_writes_through");
    let mut log = SampleLog::open(&path, Durability::Flush).unwrap();
    assert_eq!(log.durability(), Durability::Flush);

    log.record(&Assembled::Pending(-4.0)).unwrap();
    // Visible before the log is dropped
    assert_eq!(read_log(&path), "-4.0 ");
    log.record(&Assembled::Complete(Sample::new(-4.0, 9.0))).unwrap();
    assert_eq!(read_log(&path), "-4.0 9.000\n");
}

#[test]
fn per_write_mode_reopens_for_every_write() {
    let path = temp_log_path("per_write_mode_reopens");
    let mut log = SampleLog::open(&path, Durability::PerWrite).unwrap();
    assert_eq!(log.durability(), Durability::PerWrite);

    log.record(&Assembled::Complete(Sample::new(1.0, 2.0))).unwrap();
    fs::remove_file(&path).unwrap();
    log.record(&Assembled::Complete(Sample::new(3.0, 4.0))).unwrap();
    assert_eq!(read_log(&path), "3.0 4.000\n");
}

#[test]
fn appends_to_existing_log() {
    let path = temp_log_path("appends_to_existing_log");
    fs::write(&path, "1.0 2.000\n").unwrap();

    for durability in [Durability::PerWrite, Durability::Flush] {
        let mut log = SampleLog::open(&path, durability).unwrap();
        log.record(&Assembled::Complete(Sample::new(3.0, 4.0))).unwrap();
    }
    assert_eq!(read_log(&path), "1.0 2.000\n3.0 4.000\n3.0 4.000\n");
}

#[test]
fn missing_directory_fails_at_open() {
    let path = temp_log_path("missing").with_file_name("no/such/dir/log.txt");
    assert_matches!(
        SampleLog::open(&path, Durability::PerWrite),
        Err(Error::Io(_))
    );
}

#[test]
fn reads_back_complete_samples() {
    let text = "100.0 200.500\n\n1234.5 12.340\n50.25 ";
    let samples = read_samples(Cursor::new(text)).unwrap();
    assert_eq!(
        samples,
        [Sample::new(100.0, 200.5), Sample::new(1234.5, 12.34)]
    );
}

#[test]
fn unfinished_line_must_be_last() {
    let text = "1.0 2.000\n3.0\n4.0 5.000\n";
    assert_matches!(
        read_samples(Cursor::new(text)),
        Err(Error::MalformedLog { line: 2, .. })
    );
}

#[test]
fn three_tokens_on_a_line_is_malformed() {
    // A second capture appended to a log the first left mid-line
    let text = "1.0 2.000\n3.0 7.0 8.000\n";
    assert_matches!(
        read_samples(Cursor::new(text)),
        Err(Error::MalformedLog { line: 2, token }) if token == "8.000"
    );
}

#[test]
fn non_numeric_token_is_malformed() {
    assert_matches!(
        read_samples(Cursor::new("x y\n")),
        Err(Error::MalformedLog { line: 1, token }) if token == "x"
    );
}

#[test]
fn reads_from_file() {
    let path = temp_log_path("reads_from_file");
    fs::write(&path, "0.5 0.250\n").unwrap();
    assert_eq!(read_samples_from(&path).unwrap(), [Sample::new(0.5, 0.25)]);
}

proptest! {
    #[test]
    fn one_line_per_sample(
        samples in prop::collection::vec((-1.0e5f64..1.0e5, -1.0e5f64..1.0e5), 0..30)
    ) {
        let path = temp_log_path("one_line_per_sample");
        let mut log = SampleLog::open(&path, Durability::PerWrite).unwrap();
        for (x, y) in &samples {
            log.record(&Assembled::Pending(*x)).unwrap();
            log.record(&Assembled::Complete(Sample::new(*x, *y))).unwrap();
        }

        let text = read_log(&path);
        let lines: Vec<&str> = text.split_terminator('\n').collect();
        prop_assert_eq!(lines.len(), samples.len());
        prop_assert!(text.is_empty() || text.ends_with('\n'));
        for (line, (x, y)) in lines.iter().zip(&samples) {
            prop_assert_eq!(*line, format!("{} {}", format_x(*x), format_y(*y)));
        }
    }

    #[test]
    fn rereading_a_log_is_stable(
        samples in prop::collection::vec((-1.0e5f64..1.0e5, -1.0e5f64..1.0e5), 0..30)
    ) {
        let text: String = samples
            .iter()
            .map(|(x, y)| format_line(&Sample::new(*x, *y)))
            .collect();

        let first = read_samples(Cursor::new(&text)).unwrap();
        let second = read_samples(Cursor::new(&text)).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), samples.len());

        // x survives exactly, y as written
        for (read, (x, y)) in first.iter().zip(&samples) {
            prop_assert_eq!(read.x, *x);
            prop_assert_eq!(format_y(read.y), format_y(*y));
        }

        let rewritten: String = first.iter().map(format_line).collect();
        prop_assert_eq!(rewritten, text);
    }
}
