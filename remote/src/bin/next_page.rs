//! CLI remote for `UserAction::NextPage`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::NextPage)
}
