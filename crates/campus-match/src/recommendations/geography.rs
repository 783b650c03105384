use super::domain::Region;

/// (lowercase state name, postal code, region). DC rides with the Northeast.
const STATES: &[(&str, &str, Region)] = &[
    ("alabama", "AL", Region::Southeast),
    ("alaska", "AK", Region::West),
    ("arizona", "AZ", Region::Southwest),
    ("arkansas", "AR", Region::Southeast),
    ("california", "CA", Region::West),
    ("colorado", "CO", Region::West),
    ("connecticut", "CT", Region::Northeast),
    ("delaware", "DE", Region::Northeast),
    ("district of columbia", "DC", Region::Northeast),
    ("florida", "FL", Region::Southeast),
    ("georgia", "GA", Region::Southeast),
    ("hawaii", "HI", Region::West),
    ("idaho", "ID", Region::West),
    ("illinois", "IL", Region::Midwest),
    ("indiana", "IN", Region::Midwest),
    ("iowa", "IA", Region::Midwest),
    ("kansas", "KS", Region::Midwest),
    ("kentucky", "KY", Region::Southeast),
    ("louisiana", "LA", Region::Southeast),
    ("maine", "ME", Region::Northeast),
    ("maryland", "MD", Region::Northeast),
    ("massachusetts", "MA", Region::Northeast),
    ("michigan", "MI", Region::Midwest),
    ("minnesota", "MN", Region::Midwest),
    ("mississippi", "MS", Region::Southeast),
    ("missouri", "MO", Region::Midwest),
    ("montana", "MT", Region::West),
    ("nebraska", "NE", Region::Midwest),
    ("nevada", "NV", Region::West),
    ("new hampshire", "NH", Region::Northeast),
    ("new jersey", "NJ", Region::Northeast),
    ("new mexico", "NM", Region::Southwest),
    ("new york", "NY", Region::Northeast),
    ("north carolina", "NC", Region::Southeast),
    ("north dakota", "ND", Region::Midwest),
    ("ohio", "OH", Region::Midwest),
    ("oklahoma", "OK", Region::Southwest),
    ("oregon", "OR", Region::West),
    ("pennsylvania", "PA", Region::Northeast),
    ("rhode island", "RI", Region::Northeast),
    ("south carolina", "SC", Region::Southeast),
    ("south dakota", "SD", Region::Midwest),
    ("tennessee", "TN", Region::Southeast),
    ("texas", "TX", Region::Southwest),
    ("utah", "UT", Region::West),
    ("vermont", "VT", Region::Northeast),
    ("virginia", "VA", Region::Southeast),
    ("washington", "WA", Region::West),
    ("west virginia", "WV", Region::Southeast),
    ("wisconsin", "WI", Region::Midwest),
    ("wyoming", "WY", Region::West),
];

/// Region for a postal code or a full state name.
pub fn region_for_state(state: &str) -> Option<Region> {
    let trimmed = state.trim();
    STATES
        .iter()
        .find(|(name, code, _)| {
            code.eq_ignore_ascii_case(trimmed) || name.eq_ignore_ascii_case(trimmed)
        })
        .map(|(_, _, region)| *region)
}

/// Postal code for a lowercase state name.
pub fn code_for_name(name: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(state, _, _)| *state == name)
        .map(|(_, code, _)| *code)
}

/// Canonical postal code for either form of a state reference.
pub fn canonical_code(state: &str) -> Option<&'static str> {
    let trimmed = state.trim();
    STATES
        .iter()
        .find(|(name, code, _)| {
            code.eq_ignore_ascii_case(trimmed) || name.eq_ignore_ascii_case(trimmed)
        })
        .map(|(_, code, _)| *code)
}

/// State names, longest first, so compound names win over their suffixes
/// ("west virginia" before "virginia", "arkansas" before "kansas").
pub fn names_longest_first() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = STATES.iter().map(|(name, _, _)| *name).collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_names_resolve_to_the_same_region() {
        assert_eq!(region_for_state("CA"), Some(Region::West));
        assert_eq!(region_for_state("california"), Some(Region::West));
        assert_eq!(region_for_state(" tx "), Some(Region::Southwest));
        assert_eq!(region_for_state("Ontario"), None);
    }

    #[test]
    fn longest_names_come_first() {
        let names = names_longest_first();
        let west_virginia = names.iter().position(|n| *n == "west virginia");
        let virginia = names.iter().position(|n| *n == "virginia");
        assert!(west_virginia < virginia);
        let arkansas = names.iter().position(|n| *n == "arkansas");
        let kansas = names.iter().position(|n| *n == "kansas");
        assert!(arkansas < kansas);
    }
}
