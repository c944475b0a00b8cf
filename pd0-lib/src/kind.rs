use std::fmt;

use serde::Serialize;

/// Kind of sub-record, identified by the `u16` id at the start of each sub-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataKind {
    FixedLeader,
    VariableLeader,
    Velocity,
    Correlation,
    Echo,
    PercentGood,
    Status,
    BottomTrack,
    Unknown(u16),
}

impl DataKind {
    pub const FIXED_LEADER_IDS: [u16; 2] = [0, 1];
    pub const VARIABLE_LEADER_IDS: [u16; 2] = [128, 129];
    pub const VELOCITY_IDS: [u16; 2] = [256, 257];
    pub const CORRELATION_IDS: [u16; 2] = [512, 513];
    pub const ECHO_IDS: [u16; 2] = [768, 769];
    pub const PERCENT_GOOD_IDS: [u16; 2] = [1024, 1025];
    pub const STATUS_IDS: [u16; 2] = [1280, 1281];
    pub const BOTTOM_TRACK_ID: u16 = 1536;

    #[must_use]
    pub fn from_id(id: u16) -> Self {
        match id {
            0 | 1 => DataKind::FixedLeader,
            128 | 129 => DataKind::VariableLeader,
            256 | 257 => DataKind::Velocity,
            512 | 513 => DataKind::Correlation,
            768 | 769 => DataKind::Echo,
            1024 | 1025 => DataKind::PercentGood,
            1280 | 1281 => DataKind::Status,
            Self::BOTTOM_TRACK_ID => DataKind::BottomTrack,
            other => DataKind::Unknown(other),
        }
    }

    /// Every id recognized for this kind; empty for [DataKind::Unknown].
    #[must_use]
    pub fn ids(self) -> &'static [u16] {
        match self {
            DataKind::FixedLeader => &Self::FIXED_LEADER_IDS,
            DataKind::VariableLeader => &Self::VARIABLE_LEADER_IDS,
            DataKind::Velocity => &Self::VELOCITY_IDS,
            DataKind::Correlation => &Self::CORRELATION_IDS,
            DataKind::Echo => &Self::ECHO_IDS,
            DataKind::PercentGood => &Self::PERCENT_GOOD_IDS,
            DataKind::Status => &Self::STATUS_IDS,
            DataKind::BottomTrack => &[Self::BOTTOM_TRACK_ID],
            DataKind::Unknown(_) => &[],
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            DataKind::FixedLeader => "Fixed Leader",
            DataKind::VariableLeader => "Variable Leader",
            DataKind::Velocity => "Velocity",
            DataKind::Correlation => "Correlation",
            DataKind::Echo => "Echo",
            DataKind::PercentGood => "Percent Good",
            DataKind::Status => "Status",
            DataKind::BottomTrack => "Bottom Track",
            DataKind::Unknown(_) => "ID not Found",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Unknown(id) => write!(f, "{} ({id})", self.name()),
            _ => f.write_str(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, DataKind::FixedLeader)]
    #[test_case(1, DataKind::FixedLeader)]
    #[test_case(128, DataKind::VariableLeader)]
    #[test_case(129, DataKind::VariableLeader)]
    #[test_case(256, DataKind::Velocity)]
    #[test_case(513, DataKind::Correlation)]
    #[test_case(768, DataKind::Echo)]
    #[test_case(1025, DataKind::PercentGood)]
    #[test_case(1280, DataKind::Status)]
    #[test_case(1536, DataKind::BottomTrack)]
    #[test_case(1537, DataKind::Unknown(1537))]
    #[test_case(2, DataKind::Unknown(2))]
    fn kind_from_id(id: u16, expected: DataKind) {
        assert_eq!(DataKind::from_id(id), expected);
    }

    #[test]
    fn ids_map_back_to_kind() {
        for kind in [
            DataKind::FixedLeader,
            DataKind::VariableLeader,
            DataKind::Velocity,
            DataKind::Correlation,
            DataKind::Echo,
            DataKind::PercentGood,
            DataKind::Status,
            DataKind::BottomTrack,
        ] {
            for id in kind.ids() {
                assert_eq!(DataKind::from_id(*id), kind, "id {id}");
            }
        }
    }

    #[test]
    fn display() {
        assert_eq!(DataKind::PercentGood.to_string(), "Percent Good");
        assert_eq!(DataKind::Unknown(7).to_string(), "ID not Found (7)");
    }
}
