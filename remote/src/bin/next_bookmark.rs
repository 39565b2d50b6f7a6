//! CLI remote for `UserAction::NextBookmark`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::NextBookmark)
}
