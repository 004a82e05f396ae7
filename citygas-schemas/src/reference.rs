use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed GPC reference number such as `I`, `II.1` or `III.2.1`.
///
/// The first segment is the sector (a roman numeral), the second the
/// subsector and the third the scope/subcategory slot within that subsector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GpcReference {
    sector: String,
    subsector: Option<u32>,
    scope: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceParseError(pub String);

impl fmt::Display for ReferenceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a GPC reference number", self.0)
    }
}

impl std::error::Error for ReferenceParseError {}

impl GpcReference {
    /// The sector part alone, e.g. `II` for `II.1.1`.
    pub fn sector(&self) -> &str {
        &self.sector
    }

    /// `II.1` for `II.1.1`; `None` for a bare sector reference.
    pub fn subsector_reference(&self) -> Option<GpcReference> {
        self.subsector.map(|subsector| GpcReference {
            sector: self.sector.clone(),
            subsector: Some(subsector),
            scope: None,
        })
    }

    pub fn scope(&self) -> Option<u32> {
        self.scope
    }

    pub fn is_slot(&self) -> bool {
        self.scope.is_some()
    }
}

fn is_roman_numeral(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| matches!(c, 'I' | 'V' | 'X'))
}

fn parse_number(segment: &str, raw: &str) -> Result<u32, ReferenceParseError> {
    if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_digit()) {
        return Err(ReferenceParseError(raw.to_string()));
    }
    segment
        .parse()
        .map_err(|_| ReferenceParseError(raw.to_string()))
}

impl FromStr for GpcReference {
    type Err = ReferenceParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let mut segments = trimmed.split('.');
        let sector = segments.next().unwrap_or_default();
        if !is_roman_numeral(sector) {
            return Err(ReferenceParseError(raw.to_string()));
        }
        let subsector = segments.next().map(|s| parse_number(s, raw)).transpose()?;
        let scope = segments.next().map(|s| parse_number(s, raw)).transpose()?;
        if segments.next().is_some() {
            return Err(ReferenceParseError(raw.to_string()));
        }
        Ok(GpcReference {
            sector: sector.to_string(),
            subsector,
            scope,
        })
    }
}

impl TryFrom<String> for GpcReference {
    type Error = ReferenceParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GpcReference> for String {
    fn from(value: GpcReference) -> Self {
        value.to_string()
    }
}

impl fmt::Display for GpcReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sector)?;
        if let Some(subsector) = self.subsector {
            write!(f, ".{}", subsector)?;
        }
        if let Some(scope) = self.scope {
            write!(f, ".{}", scope)?;
        }
        Ok(())
    }
}
