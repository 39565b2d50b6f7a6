//! CLI remote for `UserAction::NextProfile`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::NextProfile)
}
