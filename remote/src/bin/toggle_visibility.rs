//! CLI remote for `UserAction::ToggleVisibility`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::ToggleVisibility)
}
