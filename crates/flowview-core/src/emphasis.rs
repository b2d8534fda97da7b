use serde::{Deserialize, Serialize};

use crate::ClassificationError;

/// Visual emphasis of an edge. Ordered by render priority: when several
/// edges are represented by one visual, the highest-priority emphasis wins.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum EdgeEmphasis {
    #[default]
    Plain,
    Highlighted,
    Thick,
    Warning,
}

impl EdgeEmphasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeEmphasis::Plain => "plain",
            EdgeEmphasis::Highlighted => "highlighted",
            EdgeEmphasis::Thick => "thick",
            EdgeEmphasis::Warning => "warning",
        }
    }
}

impl std::str::FromStr for EdgeEmphasis {
    type Err = ClassificationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "plain" | "default" => Ok(EdgeEmphasis::Plain),
            "highlighted" => Ok(EdgeEmphasis::Highlighted),
            "thick" => Ok(EdgeEmphasis::Thick),
            "warning" => Ok(EdgeEmphasis::Warning),
            _ => Err(ClassificationError::InvalidEdgeEmphasis(value.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert!(EdgeEmphasis::Plain < EdgeEmphasis::Highlighted);
        assert!(EdgeEmphasis::Highlighted < EdgeEmphasis::Thick);
        assert!(EdgeEmphasis::Thick < EdgeEmphasis::Warning);
    }

    #[test]
    fn test_parse_accepts_default_alias() {
        assert_eq!(
            "default".parse::<EdgeEmphasis>().unwrap(),
            EdgeEmphasis::Plain
        );
        assert_eq!(
            "warning".parse::<EdgeEmphasis>().unwrap(),
            EdgeEmphasis::Warning
        );
        assert!("glowing".parse::<EdgeEmphasis>().is_err());
    }
}
