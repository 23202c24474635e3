//! Fixed state vocabulary: the 50 states plus the District of Columbia.

pub const DISTRICT_OF_COLUMBIA: &str = "District of Columbia";

/// Postal abbreviation to full name.
pub static STATES: [(&str, &str); 51] = [
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
    ("DC", DISTRICT_OF_COLUMBIA),
];

/// Resolves a raw abbreviation to `(abbrev, name)`.
///
/// Case and surrounding whitespace are ignored. A blank value resolves to the
/// District of Columbia; any other code outside the table yields `None`.
pub fn resolve_abbrev(raw: &str) -> Option<(&'static str, &'static str)> {
    let code = raw.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Some(("DC", DISTRICT_OF_COLUMBIA));
    }
    STATES.iter().copied().find(|(abbrev, _)| *abbrev == code)
}

/// `true` if `name` is one of the 51 full names, compared exactly.
pub fn is_known_name(name: &str) -> bool {
    STATES.iter().any(|(_, n)| *n == name)
}
