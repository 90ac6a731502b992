use log::{debug, info};

use kiosk_core::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::io;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

use crate::args::Args;
use crate::kiosk::config_reader::*;
use crate::kiosk::io_terminal::run_session;

pub mod config_reader;
pub mod io_terminal;

#[derive(Debug, Snafu)]
pub enum KioskError {
    #[snafu(display("Error opening configuration file {path}"))]
    OpeningConfig { source: io::Error, path: String },
    #[snafu(display("Error parsing configuration file {path}"))]
    ParsingConfig {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error opening the vote store"))]
    OpeningStore { source: StoreError },
    #[snafu(display("Invalid ballot"))]
    InvalidBallot { source: RulesError },
    #[snafu(display("Voting error"))]
    Voting { source: SessionError },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary { source: io::Error, path: String },
    #[snafu(display("Error serializing the summary"))]
    SerializingSummary { source: serde_json::Error },
    #[snafu(display("Error reading from or writing to the terminal"))]
    Terminal { source: io::Error },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type KioskResult<T> = Result<T, KioskError>;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub store: String,
    pub candidates: Vec<String>,
    #[serde(rename = "totalVotes")]
    pub total_votes: String,
}

fn tally_to_json(tally: &TallyResult) -> JSValue {
    let mut counts: JSMap<String, JSValue> = JSMap::new();
    for (name, count) in tally.counts.iter() {
        counts.insert(name.clone(), json!(count.to_string()));
    }
    json!({
        "tally": counts,
        "winner": tally.winner(),
        "tie": tally.outcome == Outcome::Tie,
    })
}

fn build_summary_js(settings: &KioskSettings, tally: &TallyResult) -> JSValue {
    let c = OutputConfig {
        store: settings.store_path.display().to_string(),
        candidates: settings.candidates.clone(),
        total_votes: tally.total().to_string(),
    };
    json!({
        "config": c,
        "results": tally_to_json(tally) })
}

fn write_summary(out: &str, summary: &JSValue) -> KioskResult<()> {
    let pretty_js = serde_json::to_string_pretty(summary).context(SerializingSummarySnafu {})?;
    match out {
        "stdout" => {
            println!("{}", pretty_js);
        }
        path => {
            info!("Writing summary to {:?}", path);
            fs::write(path, pretty_js).context(WritingSummarySnafu { path })?;
        }
    }
    Ok(())
}

fn open_session(settings: &KioskSettings, ignore_corrupt_store: bool) -> KioskResult<VotingSession> {
    let rules = KioskRules::new(&settings.candidates, settings.admin_code.clone())
        .context(InvalidBallotSnafu {})?;
    let store = if ignore_corrupt_store {
        VoteStore::open_or_empty(&settings.store_path)
    } else {
        VoteStore::open(&settings.store_path).context(OpeningStoreSnafu {})?
    };
    Ok(VotingSession::new(store, rules))
}

pub fn run_kiosk(args: &Args) -> KioskResult<()> {
    let config = match &args.config {
        Some(path) => Some(read_config(path)?),
        None => None,
    };
    let settings = resolve_settings(config, args)?;
    info!("settings: {:?}", settings);

    let mut session = open_session(&settings, args.ignore_corrupt_store)?;

    if args.results {
        let tally = session.tally();
        println!("{}", tally);
        if let Some(out) = settings.output_path.as_deref() {
            let summary = build_summary_js(&settings, &tally);
            write_summary(out, &summary)?;
        }
        return Ok(());
    }

    if settings.output_path.is_some() {
        debug!("run_kiosk: output path is only used with --results");
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    run_session(&mut session, stdin.lock(), stdout.lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings(path: PathBuf) -> KioskSettings {
        KioskSettings {
            store_path: path,
            candidates: vec!["John".to_string(), "Jane".to_string()],
            admin_code: None,
            output_path: None,
        }
    }

    #[test]
    fn summary_json() {
        let tally = TallyResult {
            counts: vec![("John".to_string(), 2), ("Jane".to_string(), 1)],
            outcome: Outcome::Winner("John".to_string()),
        };
        let js = build_summary_js(&settings(PathBuf::from("votes.csv")), &tally);
        assert_eq!(
            js,
            json!({
                "config": {
                    "store": "votes.csv",
                    "candidates": ["John", "Jane"],
                    "totalVotes": "3"
                },
                "results": {
                    "tally": {"John": "2", "Jane": "1"},
                    "winner": "John",
                    "tie": false
                }
            })
        );
    }

    #[test]
    fn summary_json_tie() {
        let tally = TallyResult {
            counts: vec![("John".to_string(), 0), ("Jane".to_string(), 0)],
            outcome: Outcome::Tie,
        };
        let js = build_summary_js(&settings(PathBuf::from("votes.csv")), &tally);
        assert_eq!(js["results"]["winner"], JSValue::Null);
        assert_eq!(js["results"]["tie"], json!(true));
    }

    #[test]
    fn summary_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("summary.json");
        let summary = json!({"results": {"tally": {}}});
        write_summary(out.to_str().unwrap(), &summary).unwrap();
        let read: JSValue = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(read, summary);
    }

    #[test]
    fn corrupt_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("votes.csv");
        fs::write(&path, "11111111\n").unwrap();
        let s = settings(path);
        assert!(matches!(
            open_session(&s, false),
            Err(KioskError::OpeningStore { .. })
        ));
        let session = open_session(&s, true).unwrap();
        assert!(session.store().is_empty());
    }

    #[test]
    fn bad_ballot() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = settings(dir.path().join("votes.csv"));
        s.candidates = vec!["John".to_string(), "John".to_string()];
        assert!(matches!(
            open_session(&s, false),
            Err(KioskError::InvalidBallot { .. })
        ));
    }
}
