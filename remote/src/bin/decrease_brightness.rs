//! CLI remote for `UserAction::DecreaseBrightness`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::DecreaseBrightness)
}
