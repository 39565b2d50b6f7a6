//! CLI remote for `UserAction::SwapFirstTwoViews`.
fn main() -> std::process::ExitCode {
    kb_remote::run(apievent::UserAction::SwapFirstTwoViews)
}
