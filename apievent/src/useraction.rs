//! `UserAction`: the enumerated command set bindings, remotes,
//! and `RemoteUserAction` APIEvents all target. This is the modern,
//! canonical set, including `SwapFirstTwoViews`/`RepaintNow`/tint and
//! brightness actions the original source adds beyond its older enum,
//! so it is kept as-is rather than trimmed to that older subset.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserAction {
    PreviousBookmark,
    NextBookmark,
    ToggleBookmark,
    PreviousTab,
    NextTab,
    PreviousPage,
    NextPage,
    PreviousProfile,
    NextProfile,
    ToggleVisibility,
    ToggleForceZoom,
    SwitchKneeboards,
    RecenterVR,
    Hide,
    Show,
    CycleActiveView,
    SwapFirstTwoViews,
    RepaintNow,
    EnableTint,
    DisableTint,
    ToggleTint,
    IncreaseBrightness,
    DecreaseBrightness,
}

impl UserAction {
    pub const ALL: &'static [UserAction] = &[
        UserAction::PreviousBookmark,
        UserAction::NextBookmark,
        UserAction::ToggleBookmark,
        UserAction::PreviousTab,
        UserAction::NextTab,
        UserAction::PreviousPage,
        UserAction::NextPage,
        UserAction::PreviousProfile,
        UserAction::NextProfile,
        UserAction::ToggleVisibility,
        UserAction::ToggleForceZoom,
        UserAction::SwitchKneeboards,
        UserAction::RecenterVR,
        UserAction::Hide,
        UserAction::Show,
        UserAction::CycleActiveView,
        UserAction::SwapFirstTwoViews,
        UserAction::RepaintNow,
        UserAction::EnableTint,
        UserAction::DisableTint,
        UserAction::ToggleTint,
        UserAction::IncreaseBrightness,
        UserAction::DecreaseBrightness,
    ];

    /// The name used on the wire and
    /// as each CLI remote binary's action identity. Matches the
    /// enum variant's own spelling.
    pub fn name(&self) -> &'static str {
        match self {
            UserAction::PreviousBookmark => "PreviousBookmark",
            UserAction::NextBookmark => "NextBookmark",
            UserAction::ToggleBookmark => "ToggleBookmark",
            UserAction::PreviousTab => "PreviousTab",
            UserAction::NextTab => "NextTab",
            UserAction::PreviousPage => "PreviousPage",
            UserAction::NextPage => "NextPage",
            UserAction::PreviousProfile => "PreviousProfile",
            UserAction::NextProfile => "NextProfile",
            UserAction::ToggleVisibility => "ToggleVisibility",
            UserAction::ToggleForceZoom => "ToggleForceZoom",
            UserAction::SwitchKneeboards => "SwitchKneeboards",
            UserAction::RecenterVR => "RecenterVR",
            UserAction::Hide => "Hide",
            UserAction::Show => "Show",
            UserAction::CycleActiveView => "CycleActiveView",
            UserAction::SwapFirstTwoViews => "SwapFirstTwoViews",
            UserAction::RepaintNow => "RepaintNow",
            UserAction::EnableTint => "EnableTint",
            UserAction::DisableTint => "DisableTint",
            UserAction::ToggleTint => "ToggleTint",
            UserAction::IncreaseBrightness => "IncreaseBrightness",
            UserAction::DecreaseBrightness => "DecreaseBrightness",
        }
    }

    pub fn from_name(name: &str) -> Option<UserAction> {
        Self::ALL.iter().copied().find(|a| a.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_round_trips_through_its_name() {
        for action in UserAction::ALL {
            assert_eq!(UserAction::from_name(action.name()), Some(*action));
        }
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(UserAction::from_name("DoesNotExist"), None);
    }
}
