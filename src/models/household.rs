use serde::{Deserialize, Serialize};

/// The two people sharing the chores, plus the rotation cursor.
///
/// There is exactly one household row. Names stay unset until `/setpeople`
/// is used; rotation is unavailable until then.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Household {
    pub person1: Option<String>,
    pub person2: Option<String>,
    /// Number of rotating assignments handed out since the people were set.
    pub rotate_index: i64,
}

impl Household {
    /// Both names, if the household has been configured.
    pub fn people(&self) -> Option<(&str, &str)> {
        match (self.person1.as_deref(), self.person2.as_deref()) {
            (Some(p1), Some(p2)) if !p1.is_empty() && !p2.is_empty() => Some((p1, p2)),
            _ => None,
        }
    }

    /// The person the rotation cursor currently points at.
    pub fn next_in_rotation(&self) -> Option<&str> {
        let (p1, p2) = self.people()?;
        if self.rotate_index.rem_euclid(2) == 0 {
            Some(p1)
        } else {
            Some(p2)
        }
    }
}
