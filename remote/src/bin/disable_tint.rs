//! CLI remote for `UserAction::DisableTint`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::DisableTint)
}
