use rpcmesh_common::EndpointName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every endpoint kind the mesh knows how to call.
///
/// Endpoint names arriving as strings (from the registry or a user) are
/// resolved to one of these once, at the boundary; anything else is an
/// unknown endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndpointKind {
    RegistryRegister,
    RegistryListAll,
    RegistryResolve,
    CatalogList,
    EchoParrot,
    JokeGet,
    JokeSet,
    CoffeeBrew,
    CoffeeGetCup,
    CoffeeBrewStatus,
    SortSort,
    VigenereEncode,
    VigenereDecode,
    VigenereHistory,
}

impl EndpointKind {
    pub const ALL: [EndpointKind; 14] = [
        Self::RegistryRegister,
        Self::RegistryListAll,
        Self::RegistryResolve,
        Self::CatalogList,
        Self::EchoParrot,
        Self::JokeGet,
        Self::JokeSet,
        Self::CoffeeBrew,
        Self::CoffeeGetCup,
        Self::CoffeeBrewStatus,
        Self::SortSort,
        Self::VigenereEncode,
        Self::VigenereDecode,
        Self::VigenereHistory,
    ];

    pub fn full_name(self) -> &'static str {
        match self {
            Self::RegistryRegister => "services.Registry/register",
            Self::RegistryListAll => "services.Registry/getServices",
            Self::RegistryResolve => "services.Registry/findServer",
            Self::CatalogList => "services.Catalog/list",
            Self::EchoParrot => "services.Echo/parrot",
            Self::JokeGet => "services.Joke/getJoke",
            Self::JokeSet => "services.Joke/setJoke",
            Self::CoffeeBrew => "services.CoffeePot/brew",
            Self::CoffeeGetCup => "services.CoffeePot/getCup",
            Self::CoffeeBrewStatus => "services.CoffeePot/brewStatus",
            Self::SortSort => "services.Sort/sort",
            Self::VigenereEncode => "services.Vigenere/encode",
            Self::VigenereDecode => "services.Vigenere/decode",
            Self::VigenereHistory => "services.Vigenere/history",
        }
    }

    pub fn endpoint_name(self) -> EndpointName {
        EndpointName::parse(self.full_name()).expect("built-in endpoint names are well formed")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.full_name() == name)
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique_and_parse() {
        let mut seen = std::collections::HashSet::new();
        for kind in EndpointKind::ALL {
            let name = kind.endpoint_name();
            assert!(seen.insert(name.clone()), "duplicate {name}");
            assert_eq!(EndpointKind::from_name(name.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(EndpointKind::from_name("services.Echo/shout"), None);
        assert_eq!(EndpointKind::from_name("parrot"), None);
    }
}
