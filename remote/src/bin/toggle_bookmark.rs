//! CLI remote for `UserAction::ToggleBookmark`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::ToggleBookmark)
}
