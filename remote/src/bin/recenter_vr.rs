//! CLI remote for `UserAction::RecenterVR`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::RecenterVR)
}
