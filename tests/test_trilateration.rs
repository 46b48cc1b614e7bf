use std::{fs, io::Cursor};

use assert_matches::assert_matches;
use rtls_capture_lib::incoming_message_parser::Sample;
use rtls_capture_lib::trilateration::{
    locate_all, read_ranges, read_ranges_from, trilaterate, Anchor, Ranges, DEFAULT_ANCHORS,
};
use rtls_capture_lib::Error;
use proptest::prelude::*;

mod common;
use common::temp_log_path;

const SQUARE: [Anchor; 3] = [
    Anchor::new(0.0, 0.0),
    Anchor::new(10.0, 0.0),
    Anchor::new(0.0, 10.0),
];

fn ranges_to(anchors: &[Anchor; 3], x: f64, y: f64) -> Ranges {
    return anchors.map(|anchor| (anchor.x - x).hypot(anchor.y - y));
}

fn assert_close(sample: Sample, x: f64, y: f64) {
    assert!((sample.x - x).abs() < 1e-9, "x was {}, wanted {x}", sample.x);
    assert!((sample.y - y).abs() < 1e-9, "y was {}, wanted {y}", sample.y);
}

#[test]
fn locates_point_inside_square() {
    let ranges = [5.0, 65f64.sqrt(), 45f64.sqrt()];
    assert_close(trilaterate(&SQUARE, &ranges).unwrap(), 3.0, 4.0);
}

#[test]
fn locates_with_hall_anchors() {
    let ranges = ranges_to(&DEFAULT_ANCHORS, 4.0, 3.0);
    assert_close(trilaterate(&DEFAULT_ANCHORS, &ranges).unwrap(), 4.0, 3.0);
}

#[test]
fn collinear_anchors_have_no_fix() {
    let line = [
        Anchor::new(0.0, 0.0),
        Anchor::new(5.0, 5.0),
        Anchor::new(10.0, 10.0),
    ];
    assert_eq!(trilaterate(&line, &[1.0, 2.0, 3.0]), None);
}

#[test]
fn unset_ranges_have_no_fix() {
    assert_eq!(trilaterate(&SQUARE, &[0.0, 5.0, 5.0]), None);
    assert_eq!(trilaterate(&SQUARE, &[5.0, -1.0, 5.0]), None);
    assert_eq!(trilaterate(&SQUARE, &[5.0, 5.0, f64::NAN]), None);
}

#[test]
fn reads_range_lines() {
    let text = "5 8.06 6.7\n\n  1.5\t2.5 3.5  \n";
    let all = read_ranges(Cursor::new(text)).unwrap();
    assert_eq!(all, vec![[5.0, 8.06, 6.7], [1.5, 2.5, 3.5]]);
}

#[test]
fn range_line_with_two_values_is_malformed() {
    let result = read_ranges(Cursor::new("1 2 3\n4 5\n"));
    assert_matches!(result, Err(Error::MalformedLog { line: 2, .. }));
}

#[test]
fn range_line_with_text_is_malformed() {
    let result = read_ranges(Cursor::new("1 two 3\n"));
    assert_matches!(result, Err(Error::MalformedLog { line: 1, token }) if token == "two");
}

#[test]
fn reads_ranges_from_file() {
    let path = temp_log_path("ranges_from_file");
    fs::write(&path, "5 8 6\n").unwrap();
    assert_eq!(read_ranges_from(&path).unwrap(), vec![[5.0, 8.0, 6.0]]);
}

#[test]
fn locate_all_skips_rows_without_fix() {
    let all = [
        ranges_to(&SQUARE, 3.0, 4.0),
        [0.0, 1.0, 1.0],
        ranges_to(&SQUARE, 7.5, 2.0),
    ];
    let samples = locate_all(&SQUARE, &all);
    assert_eq!(samples.len(), 2);
    assert_close(samples[0], 3.0, 4.0);
    assert_close(samples[1], 7.5, 2.0);
}

proptest! {
    #[test]
    fn recovers_points_in_hall(x in -50.0f64..50.0, y in -50.0f64..50.0) {
        let ranges = ranges_to(&DEFAULT_ANCHORS, x, y);
        prop_assume!(ranges.iter().all(|range| *range > 1e-6));
        let sample = trilaterate(&DEFAULT_ANCHORS, &ranges).unwrap();
        prop_assert!((sample.x - x).abs() < 1e-6);
        prop_assert!((sample.y - y).abs() < 1e-6);
    }
}
