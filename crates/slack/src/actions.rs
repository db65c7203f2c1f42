/// Buttons on the worker control panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClockAction {
    ClockIn,
    ClockOut,
    Total,
}

impl ClockAction {
    pub const ALL: [ClockAction; 3] = [Self::ClockIn, Self::ClockOut, Self::Total];

    pub fn action_id(&self) -> &'static str {
        match self {
            Self::ClockIn => "clock.in.v1",
            Self::ClockOut => "clock.out.v1",
            Self::Total => "clock.total.v1",
        }
    }

    pub fn from_action_id(action_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.action_id() == action_id.trim())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ClockIn => "clock_in",
            Self::ClockOut => "clock_out",
            Self::Total => "total",
        }
    }
}
