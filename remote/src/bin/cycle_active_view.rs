//! CLI remote for `UserAction::CycleActiveView`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::CycleActiveView)
}
