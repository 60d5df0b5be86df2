use serde::{Deserialize, Serialize};

/// A visitor segment. Every page and API route that is scoped to an audience
/// takes one of these from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessGroup {
    Bride,
    Groom,
    Friends,
    Invitees,
    Guests,
}

/// Lookup order used when a per-group text has no entry for the requested group.
pub const FALLBACK_ORDER: [AccessGroup; 5] = [
    AccessGroup::Friends,
    AccessGroup::Bride,
    AccessGroup::Groom,
    AccessGroup::Invitees,
    AccessGroup::Guests,
];

impl AccessGroup {
    pub const ALL: [AccessGroup; 5] = [
        AccessGroup::Bride,
        AccessGroup::Groom,
        AccessGroup::Friends,
        AccessGroup::Invitees,
        AccessGroup::Guests,
    ];

    /// Stable lowercase identifier used in URLs and stored rows.
    pub fn key(self) -> &'static str {
        match self {
            AccessGroup::Bride => "bride",
            AccessGroup::Groom => "groom",
            AccessGroup::Friends => "friends",
            AccessGroup::Invitees => "invitees",
            AccessGroup::Guests => "guests",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AccessGroup::Bride => "Bride's Family",
            AccessGroup::Groom => "Groom's Family",
            AccessGroup::Friends => "Friends",
            AccessGroup::Invitees => "Invitees",
            AccessGroup::Guests => "Guests",
        }
    }
}

impl std::fmt::Display for AccessGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("unknown access group: {0}")]
pub struct UnknownGroup(pub String);

impl std::str::FromStr for AccessGroup {
    type Err = UnknownGroup;

    /// Case-insensitive, but otherwise exact: no trimming, no aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase();
        AccessGroup::ALL
            .into_iter()
            .find(|g| g.key() == normalized)
            .ok_or_else(|| UnknownGroup(s.to_string()))
    }
}

/// Registry entry as exposed by `GET /api/groups`.
#[derive(Debug, Clone, Serialize)]
pub struct GroupInfo {
    pub key: &'static str,
    pub label: &'static str,
}

impl From<AccessGroup> for GroupInfo {
    fn from(group: AccessGroup) -> Self {
        GroupInfo {
            key: group.key(),
            label: group.label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_keys_case_insensitively() {
        assert_eq!("bride".parse::<AccessGroup>(), Ok(AccessGroup::Bride));
        assert_eq!("GROOM".parse::<AccessGroup>(), Ok(AccessGroup::Groom));
        assert_eq!("Invitees".parse::<AccessGroup>(), Ok(AccessGroup::Invitees));
    }

    #[test]
    fn rejects_unknown_and_near_miss_keys() {
        assert!("family".parse::<AccessGroup>().is_err());
        assert!(" bride".parse::<AccessGroup>().is_err());
        assert!("guest".parse::<AccessGroup>().is_err());
        assert!("".parse::<AccessGroup>().is_err());
    }

    #[test]
    fn keys_round_trip_through_display() {
        for group in AccessGroup::ALL {
            assert_eq!(group.to_string().parse::<AccessGroup>(), Ok(group));
        }
    }

    #[test]
    fn fallback_order_covers_every_group_once() {
        let mut seen = FALLBACK_ORDER.to_vec();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), AccessGroup::ALL.len());
        assert_eq!(FALLBACK_ORDER[0], AccessGroup::Friends);
    }
}
