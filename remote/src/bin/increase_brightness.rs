//! CLI remote for `UserAction::IncreaseBrightness`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::IncreaseBrightness)
}
