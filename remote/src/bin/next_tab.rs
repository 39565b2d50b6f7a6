//! CLI remote for `UserAction::NextTab`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::NextTab)
}
