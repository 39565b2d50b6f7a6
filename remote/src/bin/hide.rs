//! CLI remote for `UserAction::Hide`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::Hide)
}
