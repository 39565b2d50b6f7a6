//! CLI remote for `UserAction::Show`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::Show)
}
