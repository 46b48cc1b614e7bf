// Copyright 2024 the rtls-capture contributors
// SPDX-License-Identifier: MPL-2.0

//! Command line configuration for the capture, replay and send programs.

use std::{ffi::OsString, net::SocketAddr, path::PathBuf, time::Duration};

use clap::{builder::RangedU64ValueParser, value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::error::{Error, Result};
use crate::playback::FloorPlan;
use crate::sample_assembler::{LegacyAssembler, SampleDecoder, TaggedDecoder};
use crate::sample_log::Durability;
use crate::trilateration::{Anchor, DEFAULT_ANCHORS};
use crate::{DEFAULT_PORT, DEFAULT_SAMPLE_LIMIT};

pub const DEFAULT_BIND_IP: &str = "0.0.0.0";
pub const DEFAULT_LOG_PATH: &str = "rtls_log/log.txt";

/// How samples are laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// An X dgram followed by a Y dgram, both with prefix noise.
    Legacy,
    /// One `v1 <x> <y>` dgram per sample.
    Tagged,
}

impl WireFormat {
    pub fn decoder(&self) -> Box<dyn SampleDecoder> {
        match self {
            WireFormat::Legacy => Box::new(LegacyAssembler::new()),
            WireFormat::Tagged => Box::new(TaggedDecoder),
        }
    }

    fn from_arg(value: &str) -> Result<WireFormat> {
        match value {
            "legacy" => Ok(WireFormat::Legacy),
            "tagged" => Ok(WireFormat::Tagged),
            other => Err(Error::Config(format!("unknown wire format {other:?}"))),
        }
    }
}

/// What the receiver does with a dgram it can't use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Stop the capture with an error.
    Abort,
    /// Log a warning and wait for the next dgram. The cursor doesn't move,
    /// so if the sender meant the dropped dgram as one half of a pair,
    /// every sample after it has X and Y swapped.
    Skip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiverConfig {
    pub bind_ip: String,
    pub port: u16,
    pub log_path: PathBuf,
    /// `None` captures until the process is killed.
    pub sample_limit: Option<u64>,
    pub wire_format: WireFormat,
    pub on_malformed: MalformedPolicy,
    pub durability: Durability,
    pub idle_timeout: Option<Duration>,
    pub stop_when_idle: bool,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        ReceiverConfig {
            bind_ip: DEFAULT_BIND_IP.to_string(),
            port: DEFAULT_PORT,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            sample_limit: Some(DEFAULT_SAMPLE_LIMIT),
            wire_format: WireFormat::Legacy,
            on_malformed: MalformedPolicy::Abort,
            durability: Durability::PerWrite,
            idle_timeout: None,
            stop_when_idle: false,
        }
    }
}

fn log_arg(help: &'static str) -> Arg {
    Arg::new("log")
        .short('l')
        .long("log")
        .value_name("PATH")
        .help(help)
        .value_parser(value_parser!(PathBuf))
        .default_value(DEFAULT_LOG_PATH)
}

fn format_arg() -> Arg {
    Arg::new("format")
        .long("format")
        .value_name("FORMAT")
        .help("Wire format of the sample dgrams")
        .value_parser(["legacy", "tagged"])
        .default_value("legacy")
}

fn seconds(value: f64, name: &str) -> Result<Duration> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::Config(format!("{name} must be a positive number of seconds")));
    }
    return Duration::try_from_secs_f64(value)
        .map_err(|err| Error::Config(format!("{name}: {err}")));
}

fn try_matches<I, T>(command: Command, args: I) -> Result<ArgMatches>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    return command
        .try_get_matches_from(args)
        .map_err(|err| Error::Config(err.to_string()));
}

pub fn receiver_command() -> Command {
    Command::new("rtls-capture")
        .about("Collect tag positions sent over UDP into a sample log")
        .arg(
            Arg::new("bind")
                .short('b')
                .long("bind")
                .value_name("IP")
                .help("Local address to listen on")
                .default_value(DEFAULT_BIND_IP),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .value_parser(value_parser!(u16))
                .default_value("5000"),
        )
        .arg(log_arg("Sample log to append to"))
        .arg(
            Arg::new("samples")
                .short('n')
                .long("samples")
                .value_name("COUNT")
                .help("Completed samples to collect before exiting, 0 for no limit")
                .value_parser(value_parser!(u64))
                .default_value("10001"),
        )
        .arg(format_arg())
        .arg(
            Arg::new("on-malformed")
                .long("on-malformed")
                .value_name("POLICY")
                .help("Abort the capture on a bad dgram, or skip it")
                .value_parser(["abort", "skip"])
                .default_value("abort"),
        )
        .arg(
            Arg::new("durability")
                .long("durability")
                .value_name("MODE")
                .help("Reopen the log for every write, or keep it open and flush")
                .value_parser(["per-write", "flush"])
                .default_value("per-write"),
        )
        .arg(
            Arg::new("idle-timeout")
                .long("idle-timeout")
                .value_name("SECONDS")
                .help("Report when no dgram arrives for this long")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("stop-when-idle")
                .long("stop-when-idle")
                .help("Finish the capture at the first idle timeout")
                .action(ArgAction::SetTrue),
        )
}

impl ReceiverConfig {
    pub fn from_args() -> Result<ReceiverConfig> {
        return Self::from_matches(&receiver_command().get_matches());
    }

    pub fn try_from_args<I, T>(args: I) -> Result<ReceiverConfig>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        return Self::from_matches(&try_matches(receiver_command(), args)?);
    }

    fn from_matches(matches: &ArgMatches) -> Result<ReceiverConfig> {
        let mut config = ReceiverConfig::default();

        if let Some(bind_ip) = matches.get_one::<String>("bind") {
            config.bind_ip = bind_ip.clone();
        }
        if let Some(port) = matches.get_one::<u16>("port") {
            config.port = *port;
        }
        if let Some(path) = matches.get_one::<PathBuf>("log") {
            config.log_path = path.clone();
        }
        if let Some(limit) = matches.get_one::<u64>("samples") {
            config.sample_limit = if *limit == 0 { None } else { Some(*limit) };
        }
        if let Some(format) = matches.get_one::<String>("format") {
            config.wire_format = WireFormat::from_arg(format)?;
        }
        config.on_malformed = match matches.get_one::<String>("on-malformed").map(String::as_str) {
            Some("skip") => MalformedPolicy::Skip,
            _ => MalformedPolicy::Abort,
        };
        config.durability = match matches.get_one::<String>("durability").map(String::as_str) {
            Some("flush") => Durability::Flush,
            _ => Durability::PerWrite,
        };
        if let Some(timeout) = matches.get_one::<f64>("idle-timeout") {
            config.idle_timeout = Some(seconds(*timeout, "--idle-timeout")?);
        }
        config.stop_when_idle = matches.get_flag("stop-when-idle");

        if config.stop_when_idle && config.idle_timeout.is_none() {
            return Err(Error::Config(
                "--stop-when-idle needs --idle-timeout".to_string(),
            ));
        }
        return Ok(config);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    pub log_path: PathBuf,
    pub interval: Duration,
    pub columns: usize,
    pub rows: usize,
    pub plan: FloorPlan,
}

pub fn playback_command() -> Command {
    Command::new("replay_samples")
        .about("Replay a sample log as a moving marker over the floor plan")
        .arg(log_arg("Sample log to replay"))
        .arg(
            Arg::new("interval-ms")
                .long("interval-ms")
                .value_name("MS")
                .help("Time between frames")
                .value_parser(value_parser!(u64))
                .default_value("1"),
        )
        .arg(
            Arg::new("columns")
                .long("columns")
                .value_parser(RangedU64ValueParser::<usize>::new().range(2..))
                .default_value("60"),
        )
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_parser(RangedU64ValueParser::<usize>::new().range(2..))
                .default_value("30"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .help("Floor plan width in log units")
                .value_parser(value_parser!(f64))
                .default_value("1323"),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .help("Floor plan height in log units")
                .value_parser(value_parser!(f64))
                .default_value("1335"),
        )
}

impl PlaybackConfig {
    pub fn from_args() -> Result<PlaybackConfig> {
        return Self::from_matches(&playback_command().get_matches());
    }

    pub fn try_from_args<I, T>(args: I) -> Result<PlaybackConfig>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        return Self::from_matches(&try_matches(playback_command(), args)?);
    }

    fn from_matches(matches: &ArgMatches) -> Result<PlaybackConfig> {
        let required = |name: &str| Error::Config(format!("missing --{name}"));

        let log_path = matches.get_one::<PathBuf>("log").ok_or_else(|| required("log"))?;
        let interval = matches
            .get_one::<u64>("interval-ms")
            .ok_or_else(|| required("interval-ms"))?;
        let columns = matches.get_one::<usize>("columns").ok_or_else(|| required("columns"))?;
        let rows = matches.get_one::<usize>("rows").ok_or_else(|| required("rows"))?;
        let width = matches.get_one::<f64>("width").ok_or_else(|| required("width"))?;
        let height = matches.get_one::<f64>("height").ok_or_else(|| required("height"))?;

        return Ok(PlaybackConfig {
            log_path: log_path.clone(),
            interval: Duration::from_millis(*interval),
            columns: *columns,
            rows: *rows,
            plan: FloorPlan::new(*width, *height)?,
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SenderConfig {
    pub log_path: PathBuf,
    pub target: SocketAddr,
    pub delay: Duration,
    pub wire_format: WireFormat,
    /// When set, positions are trilaterated from this file of anchor
    /// ranges instead of read from the log.
    pub ranges_path: Option<PathBuf>,
    pub anchors: [Anchor; 3],
}

pub fn sender_command() -> Command {
    Command::new("send_samples")
        .about("Send the samples of a log to a receiver, the way a tag would")
        .arg(log_arg("Sample log to send"))
        .arg(
            Arg::new("target")
                .short('t')
                .long("target")
                .value_name("IP:PORT")
                .value_parser(value_parser!(SocketAddr))
                .default_value("127.0.0.1:5000"),
        )
        .arg(
            Arg::new("delay-ms")
                .long("delay-ms")
                .value_name("MS")
                .help("Pause between samples")
                .value_parser(value_parser!(u64))
                .default_value("0"),
        )
        .arg(format_arg())
        .arg(
            Arg::new("ranges")
                .short('r')
                .long("ranges")
                .value_name("PATH")
                .help("Trilaterate positions from anchor ranges, one `r1 r2 r3` line each")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("anchors")
                .long("anchors")
                .value_name("X1,Y1,X2,Y2,X3,Y3")
                .help("Anchor positions used with --ranges")
                .value_parser(value_parser!(f64))
                .value_delimiter(',')
                .allow_negative_numbers(true)
                .default_values(["2", "1", "3", "6", "7", "4"]),
        )
}

fn anchors_from(values: &[f64]) -> Result<[Anchor; 3]> {
    return match values {
        [x1, y1, x2, y2, x3, y3] => Ok([
            Anchor::new(*x1, *y1),
            Anchor::new(*x2, *y2),
            Anchor::new(*x3, *y3),
        ]),
        _ => Err(Error::Config(format!(
            "--anchors needs 6 coordinates, got {}",
            values.len()
        ))),
    };
}

impl SenderConfig {
    pub fn from_args() -> Result<SenderConfig> {
        return Self::from_matches(&sender_command().get_matches());
    }

    pub fn try_from_args<I, T>(args: I) -> Result<SenderConfig>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        return Self::from_matches(&try_matches(sender_command(), args)?);
    }

    fn from_matches(matches: &ArgMatches) -> Result<SenderConfig> {
        let required = |name: &str| Error::Config(format!("missing --{name}"));

        let log_path = matches.get_one::<PathBuf>("log").ok_or_else(|| required("log"))?;
        let target = matches.get_one::<SocketAddr>("target").ok_or_else(|| required("target"))?;
        let delay = matches.get_one::<u64>("delay-ms").ok_or_else(|| required("delay-ms"))?;
        let format = matches.get_one::<String>("format").ok_or_else(|| required("format"))?;
        let anchors = match matches.get_many::<f64>("anchors") {
            Some(values) => anchors_from(&values.copied().collect::<Vec<f64>>())?,
            None => DEFAULT_ANCHORS,
        };

        return Ok(SenderConfig {
            log_path: log_path.clone(),
            target: *target,
            delay: Duration::from_millis(*delay),
            wire_format: WireFormat::from_arg(format)?,
            ranges_path: matches.get_one::<PathBuf>("ranges").cloned(),
            anchors: anchors,
        });
    }
}
