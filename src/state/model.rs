use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PinState {
    #[default]
    Unpinned,
    Pinned,
}

impl PinState {
    pub const fn is_pinned(self) -> bool {
        matches!(self, Self::Pinned)
    }
}
