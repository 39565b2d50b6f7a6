//! CLI remote for `UserAction::RepaintNow`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::RepaintNow)
}
