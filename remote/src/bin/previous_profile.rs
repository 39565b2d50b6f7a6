//! CLI remote for `UserAction::PreviousProfile`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::PreviousProfile)
}
