//! CLI remote for `UserAction::PreviousPage`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::PreviousPage)
}
