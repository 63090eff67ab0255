use std::{fmt, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Discord 的 snowflake，线上与落盘时均以十进制字符串表示
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Id(pub u64);

impl Id {
    /// 形如 `<@123>` 的提及
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Id {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Id)
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl de::Visitor<'_> for IdVisitor {
            type Value = Id;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a snowflake as string or integer")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Id, E> {
                Ok(Id(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Id, E> {
                u64::try_from(v).map(Id).map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Id, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_id_accepts_string_and_number() {
        let ids: Vec<Id> = serde_json::from_str(r#"["80351110224678912", 42]"#).unwrap();
        assert_eq!(ids, vec![Id(80351110224678912), Id(42)]);
        assert_eq!(serde_json::to_string(&Id(42)).unwrap(), r#""42""#);
    }

    #[test]
    fn test_id_as_map_key() {
        let map: BTreeMap<Id, i64> = serde_json::from_str(r#"{"7": 1, "3": 2}"#).unwrap();
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![Id(3), Id(7)]);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"3":2,"7":1}"#);
    }
}
