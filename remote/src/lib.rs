//! `kb-remote`: the shared library behind
//! OpenKneeboard's one-executable-per-`UserAction` remotes. Each
//! binary in this crate is a few lines that call [`run`] with its own
//! fixed [`apievent::UserAction`]; this module owns the actual
//! argument parsing and mailslot write.
use apievent::{APIEvent, UserAction};
use clap::Parser;
use utils::log;

/// Accepts an optional positional `count` (default 1).
#[derive(Parser, Debug)]
#[command(about = "Sends a RemoteUserAction APIEvent to a running OpenKneeboard")]
struct Args {
    /// How many times to repeat the action. A single `RemoteUserAction`
    /// is sent for count == 1; otherwise one `MultiEvent` carrying
    /// `count` copies is sent instead, so they're applied in one
    /// ordered batch rather than racing separate mailslot writes.
    #[arg(default_value_t = 1)]
    count: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("OpenKneeboard's mailslot is not available: {0}")]
    MailslotUnavailable(String),
}

/// Parses `std::env::args`, builds the right `APIEvent` for `action`
/// and `count`, and writes it to the mailslot. Returns the
/// process exit code the binary's `main` should return: `0` on a
/// successful write, non-zero (with an `error!`-level log already
/// emitted) otherwise.
pub fn run(action: UserAction) -> std::process::ExitCode {
    let args = Args::parse();
    let event = build_event(action, args.count);
    match send(&event) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}

/// A single `RemoteUserAction` for `count == 1`; a `MultiEvent` of
/// `count` copies otherwise.
fn build_event(action: UserAction, count: u32) -> APIEvent {
    if count == 1 {
        APIEvent::new("RemoteUserAction", action.name())
    } else {
        apievent::encode_multi_remote_action(action, count)
    }
}

fn send(event: &APIEvent) -> Result<(), RemoteError> {
    apievent::send(event.serialize().as_bytes()).map_err(|e| RemoteError::MailslotUnavailable(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_single_count_sends_a_plain_remote_user_action() {
        let event = build_event(UserAction::NextPage, 1);
        assert_eq!(event.name, "RemoteUserAction");
        assert_eq!(event.value, "NextPage");
    }

    #[test]
    fn a_count_above_one_sends_a_multi_event() {
        let event = build_event(UserAction::PreviousTab, 3);
        assert_eq!(event.name, apievent::EVT_MULTI_EVENT);
        let decoded = apievent::decode_multi_event(&event.value).unwrap();
        assert_eq!(decoded.len(), 3);
        assert!(decoded.iter().all(|e| e.value == "PreviousTab"));
    }
}
