use std::fmt::{Display, Formatter};

/// Separator between an owner and a member in a qualified name
const MEMBER_SEPARATOR: char = '.';

/// Name of a local, method, class, or a synthesized member of one of them
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Clone, Debug)]
pub struct Identifier(String);

impl Identifier {
    /// Qualify a member name with this identifier, e.g., `AbstractObject0.end`
    pub fn member(&self, name: &str) -> Self {
        Self(format!("{}{}{}", self.0, MEMBER_SEPARATOR, name))
    }

    /// Qualified names never clash with plain locals
    pub fn is_member(&self) -> bool {
        self.0.contains(MEMBER_SEPARATOR)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self(name)
    }
}
impl From<&String> for Identifier {
    fn from(name: &String) -> Self {
        Self(name.clone())
    }
}
impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members() {
        let object = Identifier::from("AbstractObject3");
        let ghost = object.member("end");
        assert_eq!(ghost.as_ref(), "AbstractObject3.end");
        assert!(ghost.is_member());
        assert!(!object.is_member());
    }
}
