use std::fmt;

use serde::{Deserialize, Deserializer};

bitflags::bitflags! {
    /// Scheduling-relevant properties of a node state
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct StateFlags: u8 {
        /// State could not be determined, or the keyword was not recognized
        const UNKNOWN = 0b00001;
        /// Node is draining, drained, or otherwise closed to new jobs
        const NOT_ACCEPTING = 0b00010;
        const DOWN = 0b00100;
        const RESERVED = 0b01000;
        const MAINTENANCE = 0b10000;
    }
}

/// Long and compact (`%t`) state names reported by `sinfo`
const STATES: &[(&str, StateFlags)] = &[
    ("allocated", StateFlags::empty()),
    ("alloc", StateFlags::empty()),
    ("completing", StateFlags::empty()),
    ("comp", StateFlags::empty()),
    ("idle", StateFlags::empty()),
    ("mixed", StateFlags::empty()),
    ("mix", StateFlags::empty()),
    ("planned", StateFlags::empty()),
    ("plnd", StateFlags::empty()),
    ("power_up", StateFlags::empty()),
    ("powering_up", StateFlags::empty()),
    ("pow_up", StateFlags::empty()),
    ("cloud", StateFlags::empty()),
    ("draining", StateFlags::NOT_ACCEPTING),
    ("drng", StateFlags::NOT_ACCEPTING),
    ("failing", StateFlags::NOT_ACCEPTING),
    ("failg", StateFlags::NOT_ACCEPTING),
    ("blocked", StateFlags::NOT_ACCEPTING),
    ("block", StateFlags::NOT_ACCEPTING),
    ("powering_down", StateFlags::NOT_ACCEPTING),
    ("powered_down", StateFlags::NOT_ACCEPTING),
    ("power_down", StateFlags::NOT_ACCEPTING),
    ("pow_dn", StateFlags::NOT_ACCEPTING),
    ("drained", StateFlags::DOWN.union(StateFlags::NOT_ACCEPTING)),
    ("drain", StateFlags::DOWN.union(StateFlags::NOT_ACCEPTING)),
    ("down", StateFlags::DOWN),
    ("fail", StateFlags::DOWN),
    ("future", StateFlags::DOWN),
    ("futr", StateFlags::DOWN),
    ("reserved", StateFlags::RESERVED),
    ("resv", StateFlags::RESERVED),
    ("maint", StateFlags::MAINTENANCE),
    ("unknown", StateFlags::UNKNOWN),
    ("unk", StateFlags::UNKNOWN),
];

/// Parses a state such as `idle`, `drain*`, or `mixed+drain$` into flags.
/// Compound states joined by `+` combine the flags of each part.
pub fn parse_state(value: &str) -> StateFlags {
    let value = value.trim().to_ascii_lowercase();

    let (value, mut flags) = match value.chars().last() {
        Some('*' | '$') => (&value[..value.len() - 1], StateFlags::NOT_ACCEPTING),
        Some('#' | '~') => (&value[..value.len() - 1], StateFlags::empty()),
        _ => (value.as_str(), StateFlags::empty()),
    };

    for keyword in value.split('+') {
        flags |= STATES
            .iter()
            .find(|(name, _)| *name == keyword)
            .map(|(_, flags)| *flags)
            .unwrap_or(StateFlags::UNKNOWN);
    }

    flags
}

/// State of a node as reported by `sinfo`
#[derive(Clone, Debug, PartialEq)]
pub struct NodeState {
    /// State exactly as reported
    pub raw: String,
    pub flags: StateFlags,
}

impl NodeState {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            flags: parse_state(raw),
        }
    }

    pub fn from_str<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: &str = Deserialize::deserialize(deserializer)?;

        Ok(Self::new(value))
    }

    /// Returns true if new jobs may be scheduled on the node
    pub fn is_accepting(&self) -> bool {
        !self.flags.contains(StateFlags::NOT_ACCEPTING)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}
