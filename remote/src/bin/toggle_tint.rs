//! CLI remote for `UserAction::ToggleTint`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::ToggleTint)
}
