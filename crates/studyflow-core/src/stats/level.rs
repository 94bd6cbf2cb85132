use serde::{Deserialize, Serialize};

/// Level names, indexed from level 1.
pub const LEVEL_NAMES: [&str; 7] = [
    "Bronze",
    "Silver",
    "Gold",
    "Platinum",
    "Diamond",
    "Master",
    "Grandmaster",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    pub number: u32,
}

impl Default for Level {
    fn default() -> Self {
        Self {
            name: LEVEL_NAMES[0].to_string(),
            number: 1,
        }
    }
}

fn lookup(number: u32) -> Option<&'static str> {
    let index = usize::try_from(number).ok()?.checked_sub(1)?;
    LEVEL_NAMES.get(index).copied()
}

/// Display name of level `number`; "Legendary" past the named levels.
pub fn level_name(number: u32) -> String {
    lookup(number).unwrap_or("Legendary").to_string()
}

/// Name shown as the goal after level `number`; "Legendary+" past the table.
pub fn next_level_name(number: u32) -> String {
    lookup(number + 1).unwrap_or("Legendary+").to_string()
}
