//! CLI remote for `UserAction::PreviousBookmark`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::PreviousBookmark)
}
