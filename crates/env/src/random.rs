//! Generated `random.*` values

use crate::{PropertySource, PropertyValue};
use rand::Rng;

/// Non-enumerable source producing a fresh random value on every lookup
///
/// Supported keys: `random.int`, `random.long`, `random.uuid`,
/// `random.value`, and the ranged forms `random.int(max)`,
/// `random.int(min,max)`, `random.long(max)` and `random.long(min,max)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomValuePropertySource;

impl RandomValuePropertySource {
    pub const NAME: &'static str = "random";
    const PREFIX: &'static str = "random.";

    fn generate(&self, kind: &str) -> Option<PropertyValue> {
        let mut rng = rand::thread_rng();
        match kind {
            "int" => Some(PropertyValue::Integer(rng.gen::<i32>().into())),
            "long" => Some(PropertyValue::Integer(rng.gen::<i64>())),
            "uuid" => Some(PropertyValue::Text(uuid::Uuid::new_v4().to_string())),
            "value" => {
                let bytes: [u8; 16] = rng.gen();
                let hex = bytes.iter().map(|b| format!("{b:02x}")).collect::<String>();
                Some(PropertyValue::Text(hex))
            }
            _ => {
                let (name, range) = parse_range(kind)?;
                match name {
                    "int" if range.0 >= i64::from(i32::MIN) && range.1 <= i64::from(i32::MAX) + 1 => {
                        Some(PropertyValue::Integer(rng.gen_range(range.0..range.1)))
                    }
                    "long" => Some(PropertyValue::Integer(rng.gen_range(range.0..range.1))),
                    _ => None,
                }
            }
        }
    }
}

/// Parse `int(10)` or `long(5,10)` into a name and a half-open range
fn parse_range(kind: &str) -> Option<(&str, (i64, i64))> {
    let (name, rest) = kind.split_once(|c: char| c == '(' || c == '[')?;
    let args = rest.strip_suffix(|c: char| c == ')' || c == ']')?;

    let (min, max) = match args.split_once(',') {
        Some((min, max)) => (min.trim().parse().ok()?, max.trim().parse().ok()?),
        None => (0, args.trim().parse().ok()?),
    };

    if min >= max {
        return None;
    }
    Some((name, (min, max)))
}

impl PropertySource for RandomValuePropertySource {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> &'static str {
        "RandomValuePropertySource"
    }

    fn get(&self, key: &str) -> Option<PropertyValue> {
        key.strip_prefix(Self::PREFIX)
            .and_then(|kind| self.generate(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_enumerable() {
        assert!(RandomValuePropertySource.property_names().is_none());
    }

    #[test]
    fn test_ignores_other_keys() {
        assert_eq!(RandomValuePropertySource.get("server.port"), None);
        assert_eq!(RandomValuePropertySource.get("random.unknown"), None);
    }

    #[test]
    fn test_uuid_and_value() {
        let uuid = RandomValuePropertySource.get("random.uuid").unwrap();
        assert_eq!(uuid.as_text().unwrap().len(), 36);

        let value = RandomValuePropertySource.get("random.value").unwrap();
        let text = value.as_text().unwrap();
        assert_eq!(text.len(), 32);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_ranges() {
        for _ in 0..50 {
            match RandomValuePropertySource.get("random.int(10)") {
                Some(PropertyValue::Integer(i)) => assert!((0..10).contains(&i)),
                other => panic!("unexpected value: {other:?}"),
            }
            match RandomValuePropertySource.get("random.long(5,7)") {
                Some(PropertyValue::Integer(i)) => assert!((5..7).contains(&i)),
                other => panic!("unexpected value: {other:?}"),
            }
        }
    }

    #[test]
    fn test_invalid_range() {
        assert_eq!(RandomValuePropertySource.get("random.int(5,5)"), None);
        assert_eq!(RandomValuePropertySource.get("random.int(abc)"), None);
        assert_eq!(RandomValuePropertySource.get("random.int(10"), None);
    }
}
