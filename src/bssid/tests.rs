use super::*;

#[test]
fn test_parse_canonical() {
    let bssid = Bssid::parse("AA:BB:CC:12:34:56").unwrap();
    assert_eq!(bssid.as_str(), "AA:BB:CC:12:34:56");
}

#[test]
fn test_parse_normalizes_case() {
    let lower = Bssid::parse("aa:bb:cc:dd:ee:ff").unwrap();
    let upper = Bssid::parse("AA:BB:CC:DD:EE:FF").unwrap();
    let mixed = Bssid::parse("Aa:bB:cC:Dd:Ee:fF").unwrap();
    assert_eq!(lower, upper);
    assert_eq!(lower, mixed);
    assert_eq!(lower.as_str(), "AA:BB:CC:DD:EE:FF");
}

#[test]
fn test_parse_dash_separators() {
    let bssid = Bssid::parse("aa-bb-cc-12-34-56").unwrap();
    assert_eq!(bssid.as_str(), "AA:BB:CC:12:34:56");
}

#[test]
fn test_parse_empty() {
    assert_eq!(Bssid::parse(""), Err(ParseError::Empty));
}

#[test]
fn test_parse_wrong_group_count() {
    assert_eq!(
        Bssid::parse("aa:bb:cc:dd:ee"),
        Err(ParseError::InvalidGroupCount(5))
    );
    assert_eq!(
        Bssid::parse("aa:bb:cc:dd:ee:ff:00"),
        Err(ParseError::InvalidGroupCount(7))
    );
    // No separator at all parses as a single group
    assert_eq!(
        Bssid::parse("aabbccddeeff"),
        Err(ParseError::InvalidGroupCount(1))
    );
}

#[test]
fn test_parse_invalid_octet() {
    assert_eq!(
        Bssid::parse("aa:bb:cc:dd:ee:fg"),
        Err(ParseError::InvalidOctet("fg".to_string()))
    );
    assert_eq!(
        Bssid::parse("aa:bb:cc:dd:ee:f"),
        Err(ParseError::InvalidOctet("f".to_string()))
    );
    assert_eq!(
        Bssid::parse("aa:bb:cc:dd:ee:fff"),
        Err(ParseError::InvalidOctet("fff".to_string()))
    );
}

#[test]
fn test_display_is_canonical() {
    let bssid = Bssid::parse("0a:1b:2c:3d:4e:5f").unwrap();
    assert_eq!(bssid.to_string(), "0A:1B:2C:3D:4E:5F");
}
