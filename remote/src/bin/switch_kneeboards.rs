//! CLI remote for `UserAction::SwitchKneeboards`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::SwitchKneeboards)
}
