// ********* Input data structures ***********

use std::collections::HashSet;
use std::fmt::Display;

use snafu::{prelude::*, Snafu};

use crate::store::StoreError;

/// The number of digits in a valid voter ID.
pub const VOTER_ID_LEN: usize = 8;

/// The administrative code that unlocks the reset path when the default rules are used.
///
/// This value bypasses all the checks on voter IDs. It is kept for compatibility with
/// existing kiosks, and it can be disabled by building rules without an admin code.
pub const DEFAULT_ADMIN_CODE: &str = "1234567891";

/// The candidates on the ballot when nothing else is configured.
pub const DEFAULT_CANDIDATES: [&str; 2] = ["John", "Jane"];

/// One persisted vote: the voter ID and the name of the chosen candidate.
///
/// Records are immutable once created.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct VoteRecord {
    voter_id: String,
    candidate: String,
}

impl VoteRecord {
    pub fn new(voter_id: impl Into<String>, candidate: impl Into<String>) -> VoteRecord {
        VoteRecord {
            voter_id: voter_id.into(),
            candidate: candidate.into(),
        }
    }

    pub fn voter_id(&self) -> &str {
        &self.voter_id
    }

    pub fn candidate(&self) -> &str {
        &self.candidate
    }
}

/// Why a submitted voter ID was refused.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum InvalidReason {
    /// The ID is empty or contains something else than ASCII digits.
    NonNumeric,
    /// The ID is all digits, but does not have exactly 8 of them.
    WrongLength,
}

/// The answer to a voter ID submission.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ValidationResult {
    /// The ID is well formed and has not voted yet: the voter may pick a candidate.
    Accepted,
    /// The ID is well formed but already appears in the vote store.
    AlreadyVoted,
    /// The ID is not well formed.
    Invalid(InvalidReason),
    /// The administrative code was entered. The caller may offer to reset the store.
    AdminMode,
}

/// Transient state of one kiosk interaction.
///
/// Idle is the default value. `id_validated` is set by an accepted voter ID and
/// `has_voted` by a successful vote.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct SessionState {
    pub id_validated: bool,
    pub has_voted: bool,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        *self == SessionState::default()
    }
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Outcome {
    Winner(String),
    Tie,
}

/// Vote counts, in ballot order, and the outcome derived from them.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallyResult {
    pub counts: Vec<(String, u64)>,
    pub outcome: Outcome,
}

impl TallyResult {
    pub fn count(&self, candidate: &str) -> Option<u64> {
        self.counts
            .iter()
            .find(|(name, _)| name == candidate)
            .map(|(_, c)| *c)
    }

    pub fn winner(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Winner(name) => Some(name.as_str()),
            Outcome::Tie => None,
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, c)| c).sum()
    }
}

impl Display for TallyResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, count) in self.counts.iter() {
            writeln!(f, "{}: {} Votes", name, count)?;
        }
        match &self.outcome {
            Outcome::Winner(name) => write!(f, "Winner: {}", name),
            Outcome::Tie => write!(f, "Winner: It's a tie!"),
        }
    }
}

/// Errors returned by the voting session.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SessionError {
    #[snafu(display("A vote has already been cast in this session"))]
    AlreadyCastInSession {},
    #[snafu(display("No voter ID has been accepted in this session"))]
    NotValidated {},
    #[snafu(display("Voter ID {voter_id} was not the one accepted in this session ({validated_id})"))]
    IdMismatch {
        voter_id: String,
        validated_id: String,
    },
    #[snafu(display("{name} is not a candidate on this ballot"))]
    UnknownCandidate { name: String },
    #[snafu(display("The vote store failed"))]
    Storage { source: StoreError },
}

/// Errors raised when building the rules of a kiosk.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RulesError {
    #[snafu(display("The ballot must have at least one candidate"))]
    EmptyBallot {},
    #[snafu(display("Candidate {name} appears more than once on the ballot"))]
    DuplicateCandidate { name: String },
    #[snafu(display("Candidate names may not be blank"))]
    BlankCandidate {},
    #[snafu(display("The admin code may not be empty"))]
    EmptyAdminCode {},
}

// ********* Configuration **********

/// The ballot and the admin code of a kiosk.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct KioskRules {
    candidates: Vec<String>,
    admin_code: Option<String>,
}

impl KioskRules {
    /// Builds the rules, checking that the ballot is usable.
    ///
    /// Candidates keep the order in which they are given. This order is used when
    /// presenting the ballot and the tally.
    pub fn new(candidates: &[String], admin_code: Option<String>) -> Result<KioskRules, RulesError> {
        ensure!(!candidates.is_empty(), EmptyBallotSnafu {});
        let mut seen: HashSet<&str> = HashSet::new();
        for name in candidates.iter() {
            ensure!(!name.trim().is_empty(), BlankCandidateSnafu {});
            ensure!(
                seen.insert(name.as_str()),
                DuplicateCandidateSnafu { name: name.clone() }
            );
        }
        if let Some(code) = admin_code.as_deref() {
            ensure!(!code.is_empty(), EmptyAdminCodeSnafu {});
        }
        Ok(KioskRules {
            candidates: candidates.to_vec(),
            admin_code,
        })
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn admin_code(&self) -> Option<&str> {
        self.admin_code.as_deref()
    }

    pub fn is_on_ballot(&self, name: &str) -> bool {
        self.candidates.iter().any(|c| c == name)
    }
}

impl Default for KioskRules {
    fn default() -> Self {
        KioskRules {
            candidates: DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            admin_code: Some(DEFAULT_ADMIN_CODE.to_string()),
        }
    }
}
