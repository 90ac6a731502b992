mod config;
pub mod manual;
mod store;

use log::{debug, info, warn};
use snafu::prelude::*;

pub use crate::config::*;
pub use crate::store::*;

/// One kiosk interaction: voter ID validation, vote casting and tallying.
///
/// The session owns the vote store and an explicit [`SessionState`]:
///
/// ```text
/// Idle --validate_id(accepted)--> IdValidated --cast_vote--> VoteCast --tally/reset--> Idle
/// ```
///
/// ```
/// use kiosk_core::{KioskRules, ValidationResult, VoteStore, VotingSession};
/// # let dir = tempfile::tempdir().unwrap();
/// # let path = dir.path().join("votes.csv");
///
/// let store = VoteStore::open(&path)?;
/// let mut session = VotingSession::new(store, KioskRules::default());
///
/// assert_eq!(session.validate_id("12345678"), ValidationResult::Accepted);
/// session.cast_vote("12345678", "Jane")?;
/// let tally = session.tally();
/// assert_eq!(tally.winner(), Some("Jane"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct VotingSession {
    store: VoteStore,
    rules: KioskRules,
    state: SessionState,
    // The voter ID accepted by the last successful validation.
    validated_id: Option<String>,
}

impl VotingSession {
    pub fn new(store: VoteStore, rules: KioskRules) -> VotingSession {
        info!(
            "New voting session: {} votes in store, candidates: {:?}",
            store.len(),
            rules.candidates()
        );
        if rules.admin_code().is_none() {
            info!("Admin code disabled");
        }
        VotingSession {
            store,
            rules,
            state: SessionState::default(),
            validated_id: None,
        }
    }

    /// Checks a voter ID typed by a voter.
    ///
    /// The admin code is checked first and bypasses all the other rules. Then, in order:
    /// the ID must be made of ASCII digits only, it must have exactly 8 digits, and it
    /// must not be found in the vote store.
    pub fn validate_id(&mut self, raw: &str) -> ValidationResult {
        if self.rules.admin_code() == Some(raw) {
            info!("validate_id: admin code entered");
            return ValidationResult::AdminMode;
        }
        let res = match check_id_format(raw) {
            Err(reason) => ValidationResult::Invalid(reason),
            Ok(()) if self.store.contains_voter(raw) => ValidationResult::AlreadyVoted,
            Ok(()) => {
                self.state.id_validated = true;
                self.validated_id = Some(raw.to_string());
                ValidationResult::Accepted
            }
        };
        debug!("validate_id: {:?} -> {:?}", raw, res);
        res
    }

    /// Records a vote for the given candidate.
    ///
    /// Only one vote may be cast per session, and only for the voter ID accepted by
    /// [`VotingSession::validate_id`]. The voter ID is not checked again against the store
    /// at this point.
    pub fn cast_vote(&mut self, voter_id: &str, candidate: &str) -> Result<(), SessionError> {
        ensure!(!self.state.has_voted, AlreadyCastInSessionSnafu {});
        let validated_id = self.validated_id.as_deref().context(NotValidatedSnafu {})?;
        ensure!(
            validated_id == voter_id,
            IdMismatchSnafu {
                voter_id,
                validated_id,
            }
        );
        ensure!(
            self.rules.is_on_ballot(candidate),
            UnknownCandidateSnafu { name: candidate }
        );
        self.store
            .append(VoteRecord::new(voter_id, candidate))
            .context(StorageSnafu {})?;
        self.state.has_voted = true;
        info!("cast_vote: vote recorded ({} in store)", self.store.len());
        Ok(())
    }

    /// Counts the votes of the whole store.
    ///
    /// The counts are recomputed from the stored records on every call. Showing the
    /// results ends the interaction, so the session goes back to idle.
    pub fn tally(&mut self) -> TallyResult {
        let res = compute_tally(self.store.records(), self.rules.candidates());
        info!("tally: {:?}", res);
        self.reset_session();
        res
    }

    /// Returns to idle without touching the recorded votes.
    pub fn reset_session(&mut self) {
        debug!("reset_session: {:?} -> idle", self.state);
        self.state = SessionState::default();
        self.validated_id = None;
    }

    /// Erases all the recorded votes and returns to idle.
    pub fn reset_all(&mut self) -> Result<(), SessionError> {
        warn!("reset_all: clearing {} votes", self.store.len());
        self.store.clear().context(StorageSnafu {})?;
        self.reset_session();
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn store(&self) -> &VoteStore {
        &self.store
    }

    pub fn rules(&self) -> &KioskRules {
        &self.rules
    }
}

/// Checks the format of a voter ID, without looking at the store.
pub fn check_id_format(raw: &str) -> Result<(), InvalidReason> {
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(InvalidReason::NonNumeric);
    }
    // All ASCII at this point: the byte length is the number of digits.
    if raw.len() != VOTER_ID_LEN {
        return Err(InvalidReason::WrongLength);
    }
    Ok(())
}

/// Counts the records for each candidate of the ballot.
///
/// Records naming someone who is not on the ballot are not counted. The winner is the
/// candidate with strictly more votes than every other one.
pub fn compute_tally(records: &[VoteRecord], candidates: &[String]) -> TallyResult {
    let mut counts: Vec<(String, u64)> = candidates.iter().map(|c| (c.clone(), 0)).collect();
    let mut skipped: usize = 0;
    for r in records.iter() {
        if let Some((_, count)) = counts.iter_mut().find(|(name, _)| name == r.candidate()) {
            *count += 1;
        } else {
            skipped += 1;
        }
    }
    if skipped > 0 {
        warn!(
            "compute_tally: skipped {} votes for candidates not on the ballot",
            skipped
        );
    }

    let max_count = counts.iter().map(|(_, c)| *c).max().unwrap_or(0);
    let leaders: Vec<&String> = counts
        .iter()
        .filter(|(_, c)| *c == max_count)
        .map(|(name, _)| name)
        .collect();
    let outcome = match leaders.as_slice() {
        [winner] => Outcome::Winner((*winner).clone()),
        _ => Outcome::Tie,
    };
    TallyResult { counts, outcome }
}
