//! CLI remote for `UserAction::EnableTint`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::EnableTint)
}
