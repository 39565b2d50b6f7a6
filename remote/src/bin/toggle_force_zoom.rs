//! CLI remote for `UserAction::ToggleForceZoom`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::ToggleForceZoom)
}
