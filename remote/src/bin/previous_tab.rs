//! CLI remote for `UserAction::PreviousTab`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::PreviousTab)
}
