// The terminal front-end of the kiosk: prompts, answers and messages.

use std::fmt::Display;
use std::io::{BufRead, Write};

use crate::kiosk::*;

/// What to do after one voter interaction.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Flow {
    Continue,
    Stop,
}

struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    fn say(&mut self, msg: impl Display) -> KioskResult<()> {
        writeln!(self.output, "{}", msg).context(TerminalSnafu {})
    }

    /// Prints the prompt and reads one answer, without surrounding whitespace.
    /// Returns None at the end of the input.
    fn ask(&mut self, prompt: &str) -> KioskResult<Option<String>> {
        write!(self.output, "{}", prompt).context(TerminalSnafu {})?;
        self.output.flush().context(TerminalSnafu {})?;
        let mut line = String::new();
        let num_read = self.input.read_line(&mut line).context(TerminalSnafu {})?;
        if num_read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn confirm(&mut self, prompt: &str) -> KioskResult<Option<bool>> {
        let answer = self.ask(prompt)?;
        Ok(answer.map(|a| matches!(a.to_lowercase().as_str(), "y" | "yes")))
    }
}

/// Runs the kiosk until the input ends or the operator types `quit`.
pub fn run_session<R: BufRead, W: Write>(
    session: &mut VotingSession,
    input: R,
    output: W,
) -> KioskResult<()> {
    let mut console = Console { input, output };
    console.say(format!(
        "Voting kiosk. Candidates: {}",
        session.rules().candidates().join(", ")
    ))?;
    loop {
        let line = match console.ask("Enter your voter ID: ")? {
            Some(l) => l,
            None => break,
        };
        if matches!(line.as_str(), "quit" | "exit") {
            break;
        }
        let flow = match session.validate_id(&line) {
            ValidationResult::Invalid(InvalidReason::NonNumeric) => {
                console.say("Error: Try entering your ID again. Use only numerical values.")?;
                Flow::Continue
            }
            ValidationResult::Invalid(InvalidReason::WrongLength) => {
                console.say(format!(
                    "Error: Try entering your ID again. The ID must have exactly {} digits.",
                    VOTER_ID_LEN
                ))?;
                Flow::Continue
            }
            ValidationResult::AlreadyVoted => {
                console.say("This ID has already voted.")?;
                offer_results(session, &mut console)?
            }
            ValidationResult::AdminMode => admin_reset(session, &mut console)?,
            ValidationResult::Accepted => vote(session, &mut console, &line)?,
        };
        if flow == Flow::Stop {
            break;
        }
    }
    info!("run_session: done, {} votes in store", session.store().len());
    Ok(())
}

/// Finds the candidate selected by an answer: its number on the ballot, or its name.
fn pick_candidate(candidates: &[String], answer: &str) -> Option<String> {
    if let Ok(idx) = answer.parse::<usize>() {
        return idx
            .checked_sub(1)
            .and_then(|i| candidates.get(i))
            .cloned();
    }
    candidates
        .iter()
        .find(|c| c.as_str() == answer)
        .or_else(|| candidates.iter().find(|c| c.eq_ignore_ascii_case(answer)))
        .cloned()
}

fn vote<R: BufRead, W: Write>(
    session: &mut VotingSession,
    console: &mut Console<R, W>,
    voter_id: &str,
) -> KioskResult<Flow> {
    let candidates: Vec<String> = session.rules().candidates().to_vec();
    console.say("ID accepted. Please choose a candidate (empty answer to cancel):")?;
    for (idx, name) in candidates.iter().enumerate() {
        console.say(format!("  {}) {}", idx + 1, name))?;
    }
    let choice = loop {
        let answer = match console.ask("Your choice: ")? {
            Some(a) => a,
            None => {
                session.reset_session();
                return Ok(Flow::Stop);
            }
        };
        if answer.is_empty() {
            console.say("Vote cancelled.")?;
            session.reset_session();
            return Ok(Flow::Continue);
        }
        match pick_candidate(&candidates, &answer) {
            Some(name) => break name,
            None => console.say("Please choose one of the listed candidates.")?,
        }
    };

    match session.cast_vote(voter_id, &choice) {
        Ok(()) => console.say(format!("Your vote for {} has been recorded.", choice))?,
        Err(SessionError::AlreadyCastInSession {}) => {
            console.say("A vote has already been cast in this session.")?
        }
        Err(e) => return Err(e).context(VotingSnafu {}),
    }
    offer_results(session, console)
}

/// Shows the results if asked to. Either way, the interaction ends here.
fn offer_results<R: BufRead, W: Write>(
    session: &mut VotingSession,
    console: &mut Console<R, W>,
) -> KioskResult<Flow> {
    match console.confirm("Show the results? [y/N] ")? {
        Some(true) => {
            let tally = session.tally();
            console.say(tally)?;
            Ok(Flow::Continue)
        }
        Some(false) => {
            session.reset_session();
            Ok(Flow::Continue)
        }
        None => {
            session.reset_session();
            Ok(Flow::Stop)
        }
    }
}

fn admin_reset<R: BufRead, W: Write>(
    session: &mut VotingSession,
    console: &mut Console<R, W>,
) -> KioskResult<Flow> {
    let num_votes = session.store().len();
    let prompt = format!("Admin mode. Erase all the {} recorded votes? [y/N] ", num_votes);
    match console.confirm(&prompt)? {
        Some(true) => {
            session.reset_all().context(VotingSnafu {})?;
            console.say("All votes have been erased.")?;
            Ok(Flow::Continue)
        }
        Some(false) => {
            console.say("Reset cancelled.")?;
            Ok(Flow::Continue)
        }
        None => Ok(Flow::Stop),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    fn run(store_content: &str, script: &str) -> (String, String, VotingSession) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("votes.csv");
        fs::write(&path, store_content).unwrap();
        let store = VoteStore::open(&path).unwrap();
        let mut session = VotingSession::new(store, KioskRules::default());
        let mut out: Vec<u8> = Vec::new();
        run_session(&mut session, Cursor::new(script.to_string()), &mut out).unwrap();
        let file = fs::read_to_string(&path).unwrap();
        (String::from_utf8(out).unwrap(), file, session)
    }

    #[test]
    fn vote_and_show_results() {
        let (out, file, session) = run(
            "11111111,John\n22222222,Jane\n",
            "33333333\n1\ny\n",
        );
        assert_eq!(file, "11111111,John\n22222222,Jane\n33333333,John\n");
        assert!(out.contains("Your vote for John has been recorded."));
        assert!(out.contains("John: 2 Votes\nJane: 1 Votes\nWinner: John"));
        assert!(session.state().is_idle());
    }

    #[test]
    fn candidate_by_name() {
        let (out, file, _) = run("", "12345678\nbob\njane\nn\n");
        assert!(out.contains("Please choose one of the listed candidates."));
        assert_eq!(file, "12345678,Jane\n");
        assert!(!out.contains("Winner"));
    }

    #[test]
    fn invalid_ids() {
        let (out, file, _) = run("", "12ab5678\n1234\n\nquit\n87654321\n");
        assert!(out.contains("Use only numerical values."));
        assert!(out.contains("The ID must have exactly 8 digits."));
        // Nothing after quit is read.
        assert!(!out.contains("ID accepted"));
        assert_eq!(file, "");
    }

    #[test]
    fn already_voted() {
        let (out, file, _) = run("11111111,Jane\n", "11111111\ny\n");
        assert!(out.contains("This ID has already voted."));
        assert!(out.contains("Winner: Jane"));
        assert_eq!(file, "11111111,Jane\n");
    }

    #[test]
    fn one_vote_per_voter_across_interactions() {
        let (out, file, _) = run("", "12345678\n2\nn\n12345678\nn\n");
        assert_eq!(file, "12345678,Jane\n");
        assert!(out.contains("This ID has already voted."));
    }

    #[test]
    fn cancelled_vote() {
        let (out, file, session) = run("", "12345678\n\n");
        assert!(out.contains("Vote cancelled."));
        assert_eq!(file, "");
        assert!(session.state().is_idle());
    }

    #[test]
    fn admin_reset_erases_votes() {
        let (out, file, session) = run("11111111,John\n22222222,Jane\n", "1234567891\ny\n");
        assert!(out.contains("Erase all the 2 recorded votes?"));
        assert!(out.contains("All votes have been erased."));
        assert_eq!(file, "");
        assert!(session.store().is_empty());

        let (out, file, _) = run("11111111,John\n", "1234567891\nn\n");
        assert!(out.contains("Reset cancelled."));
        assert_eq!(file, "11111111,John\n");
    }

    #[test]
    fn picking_candidates() {
        let c = vec!["John".to_string(), "Jane".to_string()];
        assert_eq!(pick_candidate(&c, "1"), Some("John".to_string()));
        assert_eq!(pick_candidate(&c, "2"), Some("Jane".to_string()));
        assert_eq!(pick_candidate(&c, "0"), None);
        assert_eq!(pick_candidate(&c, "3"), None);
        assert_eq!(pick_candidate(&c, "JANE"), Some("Jane".to_string()));
        assert_eq!(pick_candidate(&c, "Jim"), None);
    }
}
