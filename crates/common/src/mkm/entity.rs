use std::fmt;

use serde::{Deserialize, Serialize};

/// Network byte carried by every address.
///
/// Bit 0 separates individuals (clear) from groups (set); bit 7 marks the
/// broadcast types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(pub u8);

impl EntityType {
    /// Individual account
    pub const USER: EntityType = EntityType(0x00);
    /// Ordinary group
    pub const GROUP: EntityType = EntityType(0x01);
    /// Service station
    pub const STATION: EntityType = EntityType(0x02);
    /// Service provider, a group of stations
    pub const ISP: EntityType = EntityType(0x03);
    /// Business bot
    pub const BOT: EntityType = EntityType(0x04);
    /// Content provider, a group of bots
    pub const ICP: EntityType = EntityType(0x05);
    pub const SUPERVISOR: EntityType = EntityType(0x06);
    pub const COMPANY: EntityType = EntityType(0x07);
    /// Broadcast to anyone
    pub const ANY: EntityType = EntityType(0x80);
    /// Broadcast to everyone
    pub const EVERY: EntityType = EntityType(0x81);

    pub fn is_user(self) -> bool {
        self.0 & 0x01 == 0x00
    }

    pub fn is_group(self) -> bool {
        self.0 & 0x01 == 0x01
    }

    pub fn is_broadcast(self) -> bool {
        self.0 & 0x80 == 0x80
    }
}

impl From<u8> for EntityType {
    fn from(value: u8) -> Self {
        EntityType(value)
    }
}

impl From<EntityType> for u8 {
    fn from(value: EntityType) -> Self {
        value.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            EntityType::USER => "user",
            EntityType::GROUP => "group",
            EntityType::STATION => "station",
            EntityType::ISP => "isp",
            EntityType::BOT => "bot",
            EntityType::ICP => "icp",
            EntityType::SUPERVISOR => "supervisor",
            EntityType::COMPANY => "company",
            EntityType::ANY => "any",
            EntityType::EVERY => "every",
            EntityType(other) => return write!(f, "0x{:02x}", other),
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(EntityType::USER.is_user());
        assert!(EntityType::STATION.is_user());
        assert!(EntityType::BOT.is_user());
        assert!(!EntityType::USER.is_group());

        assert!(EntityType::GROUP.is_group());
        assert!(EntityType::ISP.is_group());
        assert!(EntityType::COMPANY.is_group());

        assert!(EntityType::ANY.is_broadcast());
        assert!(EntityType::ANY.is_user());
        assert!(EntityType::EVERY.is_broadcast());
        assert!(EntityType::EVERY.is_group());
        assert!(!EntityType::USER.is_broadcast());
    }

    #[test]
    fn test_display() {
        assert_eq!(EntityType::USER.to_string(), "user");
        assert_eq!(EntityType::EVERY.to_string(), "every");
        assert_eq!(EntityType(0x42).to_string(), "0x42");
    }
}
