use std::fmt;

#[cfg(test)]
mod tests;

/// Normalized BSSID (6-octet access-point hardware address).
///
/// The canonical form is uppercase hex with colon separators
/// ("AA:BB:CC:12:34:56"). Parsing accepts ':' or '-' separators and either
/// letter case, so any two spellings of the same address map to the same
/// cache row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bssid(String);

/// BSSID parsing errors
#[derive(Debug, PartialEq)]
pub enum ParseError {
    /// Empty input
    Empty,
    /// Wrong number of octet groups (expected 6)
    InvalidGroupCount(usize),
    /// An octet group is not exactly two hex digits
    InvalidOctet(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "BSSID is empty"),
            ParseError::InvalidGroupCount(n) => {
                write!(f, "BSSID has {} octet groups (expected 6)", n)
            }
            ParseError::InvalidOctet(group) => {
                write!(f, "Invalid BSSID octet '{}' (expected two hex digits)", group)
            }
        }
    }
}

impl Bssid {
    /// Parse a textual BSSID into canonical form.
    ///
    /// # Examples
    ///
    /// ```
    /// use beaconmap::bssid::Bssid;
    ///
    /// let bssid = Bssid::parse("aa:bb:cc:12:34:56").unwrap();
    /// assert_eq!(bssid.as_str(), "AA:BB:CC:12:34:56");
    ///
    /// // Dash separators are accepted too
    /// let bssid = Bssid::parse("AA-BB-CC-12-34-56").unwrap();
    /// assert_eq!(bssid.as_str(), "AA:BB:CC:12:34:56");
    /// ```
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError::Empty);
        }

        let separator = if input.contains(':') { ':' } else { '-' };
        let groups: Vec<&str> = input.split(separator).collect();
        if groups.len() != 6 {
            return Err(ParseError::InvalidGroupCount(groups.len()));
        }

        let mut canonical = String::with_capacity(17);
        for (i, group) in groups.iter().enumerate() {
            if group.len() != 2 || !group.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ParseError::InvalidOctet(group.to_string()));
            }
            if i > 0 {
                canonical.push(':');
            }
            canonical.push_str(&group.to_ascii_uppercase());
        }

        Ok(Bssid(canonical))
    }

    /// Canonical textual form (uppercase, colon-separated).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
