//! Entity identifiers: `name@address/terminal`
//!
//! Both `name` and `terminal` are optional, so `address`, `name@address`
//! and `address/terminal` are all valid identifiers.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::address::{Address, AddressError, ANYWHERE, EVERYWHERE};
use super::entity::EntityType;

/// Errors that can occur while composing or parsing identifiers
#[derive(Debug, thiserror::Error)]
pub enum IdentifierError {
    #[error("empty identifier")]
    Empty,
    #[error("misplaced separator in identifier: {0}")]
    MisplacedSeparator(String),
    #[error("invalid identifier component {component}: {value}")]
    InvalidComponent {
        component: &'static str,
        value: String,
    },
    #[error("invalid address in identifier: {0}")]
    Address(#[from] AddressError),
    #[error("identifier error: {0}")]
    Default(#[from] anyhow::Error),
}

/// Entity identifier
///
/// Clones share the underlying strings. Two identifiers are equal when
/// name and address agree; the terminal does not take part in equality.
#[derive(Clone)]
pub struct Identifier(Arc<IdentifierInner>);

struct IdentifierInner {
    string: String,
    name: Option<String>,
    address: Address,
    terminal: Option<String>,
}

/// Join the components into the canonical identifier string
pub fn concat(name: Option<&str>, address: &Address, terminal: Option<&str>) -> String {
    let mut string = String::new();
    if let Some(name) = name.filter(|name| !name.is_empty()) {
        string.push_str(name);
        string.push('@');
    }
    string.push_str(address.as_str());
    if let Some(terminal) = terminal.filter(|terminal| !terminal.is_empty()) {
        string.push('/');
        string.push_str(terminal);
    }
    string
}

fn check_component(component: &'static str, value: &str) -> Result<(), IdentifierError> {
    if value.contains(['@', '/']) {
        return Err(IdentifierError::InvalidComponent {
            component,
            value: value.to_string(),
        });
    }
    Ok(())
}

impl Identifier {
    /// Compose an identifier from its parts.
    ///
    /// Empty `name` or `terminal` count as absent. Parts that contain a
    /// separator are rejected.
    pub fn new(
        name: Option<&str>,
        address: Address,
        terminal: Option<&str>,
    ) -> Result<Self, IdentifierError> {
        let name = name.filter(|name| !name.is_empty());
        let terminal = terminal.filter(|terminal| !terminal.is_empty());
        if let Some(name) = name {
            check_component("name", name)?;
        }
        if let Some(terminal) = terminal {
            check_component("terminal", terminal)?;
        }
        Ok(Self(Arc::new(IdentifierInner {
            string: concat(name, &address, terminal),
            name: name.map(str::to_string),
            address,
            terminal: terminal.map(str::to_string),
        })))
    }

    /// Parse an identifier string without consulting any cache.
    ///
    /// The `/` starts the terminal and the `@` before it ends the name.
    /// A separator at the start, a trailing or repeated separator, or an
    /// `@` inside the terminal is rejected.
    pub fn parse(identifier: &str) -> Result<Self, IdentifierError> {
        if identifier.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if identifier.matches('/').count() > 1 || identifier.matches('@').count() > 1 {
            return Err(IdentifierError::MisplacedSeparator(identifier.to_string()));
        }

        let (rest, terminal) = match identifier.find('/') {
            Some(0) => return Err(IdentifierError::MisplacedSeparator(identifier.to_string())),
            Some(pos) => (&identifier[..pos], Some(&identifier[pos + 1..])),
            None => (identifier, None),
        };
        let (name, address) = match rest.rfind('@') {
            Some(0) => return Err(IdentifierError::MisplacedSeparator(identifier.to_string())),
            Some(pos) => (Some(&rest[..pos]), &rest[pos + 1..]),
            None => (None, rest),
        };
        if terminal.is_some_and(|terminal| terminal.is_empty() || terminal.contains('@')) {
            return Err(IdentifierError::MisplacedSeparator(identifier.to_string()));
        }

        let address = Address::parse(address)?;
        Ok(Self(Arc::new(IdentifierInner {
            string: identifier.to_string(),
            name: name.map(str::to_string),
            address,
            terminal: terminal.map(str::to_string),
        })))
    }

    pub fn as_str(&self) -> &str {
        &self.0.string
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    pub fn address(&self) -> &Address {
        &self.0.address
    }

    pub fn terminal(&self) -> Option<&str> {
        self.0.terminal.as_deref()
    }

    /// Entity type, taken from the address network
    pub fn network(&self) -> EntityType {
        self.0.address.network()
    }

    pub fn is_user(&self) -> bool {
        self.network().is_user()
    }

    pub fn is_group(&self) -> bool {
        self.network().is_group()
    }

    pub fn is_broadcast(&self) -> bool {
        self.network().is_broadcast()
    }
}

fn broadcast(name: &str, address: Address) -> Identifier {
    Identifier(Arc::new(IdentifierInner {
        string: concat(Some(name), &address, None),
        name: Some(name.to_string()),
        address,
        terminal: None,
    }))
}

/// `anyone@anywhere`
pub fn anyone() -> &'static Identifier {
    static ANYONE: OnceLock<Identifier> = OnceLock::new();
    ANYONE.get_or_init(|| broadcast("anyone", ANYWHERE))
}

/// `everyone@everywhere`
pub fn everyone() -> &'static Identifier {
    static EVERYONE: OnceLock<Identifier> = OnceLock::new();
    EVERYONE.get_or_init(|| broadcast("everyone", EVERYWHERE))
}

/// `moky@anywhere`
pub fn founder() -> &'static Identifier {
    static FOUNDER: OnceLock<Identifier> = OnceLock::new();
    FOUNDER.get_or_init(|| broadcast("moky", ANYWHERE))
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || self.0.string == other.0.string
            || (self.0.address == other.0.address && self.0.name == other.0.name)
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
        self.0.address.hash(state);
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.as_str())
    }
}

impl std::str::FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::parse(s)
    }
}

impl Serialize for Identifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Identifier::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const ADDRESS: &str = "1HeqNjAst5TCQ63F7xhjg6bcTbDKrRk7sH";

    fn address() -> Address {
        Address::parse(ADDRESS).unwrap()
    }

    #[test]
    fn test_compose_forms() {
        let id = Identifier::new(Some("moky"), address(), Some("home")).unwrap();
        assert_eq!(id.as_str(), format!("moky@{}/home", ADDRESS));

        let id = Identifier::new(Some("moky"), address(), None).unwrap();
        assert_eq!(id.as_str(), format!("moky@{}", ADDRESS));

        let id = Identifier::new(None, address(), Some("home")).unwrap();
        assert_eq!(id.as_str(), format!("{}/home", ADDRESS));

        let id = Identifier::new(Some(""), address(), Some("")).unwrap();
        assert_eq!(id.as_str(), ADDRESS);
        assert_eq!(id.name(), None);
        assert_eq!(id.terminal(), None);
    }

    #[test]
    fn test_compose_rejects_separators() {
        assert!(Identifier::new(Some("a@b"), address(), None).is_err());
        assert!(Identifier::new(Some("a/b"), address(), None).is_err());
        assert!(Identifier::new(None, address(), Some("x/y")).is_err());
    }

    #[test]
    fn test_parse_components() {
        let id = Identifier::parse(&format!("moky@{}/home", ADDRESS)).unwrap();
        assert_eq!(id.name(), Some("moky"));
        assert_eq!(id.address(), &address());
        assert_eq!(id.terminal(), Some("home"));
        assert!(id.is_user());

        let id = Identifier::parse(ADDRESS).unwrap();
        assert_eq!(id.name(), None);
        assert_eq!(id.terminal(), None);
    }

    #[test]
    fn test_parse_rejects_misplaced_separators() {
        for bad in [
            format!("/{}", ADDRESS),
            format!("@{}", ADDRESS),
            format!("moky@{}/", ADDRESS),
            format!("a@b@{}", ADDRESS),
            format!("moky@{}/a/b", ADDRESS),
            format!("{}/x@y", ADDRESS),
        ] {
            assert!(
                matches!(
                    Identifier::parse(&bad),
                    Err(IdentifierError::MisplacedSeparator(_))
                ),
                "accepted {}",
                bad
            );
        }
        assert!(matches!(Identifier::parse(""), Err(IdentifierError::Empty)));
        assert!(matches!(
            Identifier::parse("moky@nowhere"),
            Err(IdentifierError::Address(_))
        ));
    }

    #[test]
    fn test_parsed_components_recompose() {
        for string in [
            format!("moky@{}/home", ADDRESS),
            format!("{}/home", ADDRESS),
            format!("moky@{}", ADDRESS),
        ] {
            let parsed = Identifier::parse(&string).unwrap();
            let composed =
                Identifier::new(parsed.name(), parsed.address().clone(), parsed.terminal())
                    .unwrap();
            assert_eq!(composed.as_str(), string);
        }
    }

    #[test]
    fn test_equality_ignores_terminal() {
        let a = Identifier::parse(&format!("moky@{}/home", ADDRESS)).unwrap();
        let b = Identifier::parse(&format!("moky@{}/office", ADDRESS)).unwrap();
        let c = Identifier::parse(ADDRESS).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_broadcast_constants() {
        assert_eq!(anyone().as_str(), "anyone@anywhere");
        assert_eq!(everyone().as_str(), "everyone@everywhere");
        assert_eq!(founder().as_str(), "moky@anywhere");
        assert!(anyone().is_broadcast() && anyone().is_user());
        assert!(everyone().is_broadcast() && everyone().is_group());

        assert_eq!(&Identifier::parse("anyone@Anywhere").unwrap(), anyone());
        assert_ne!(&Identifier::parse("ANYONE@anywhere").unwrap(), anyone());
    }
}
