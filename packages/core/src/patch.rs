// ABOUTME: Tri-state field type for partial updates
// ABOUTME: Distinguishes an absent JSON key from an explicit null and a value

use serde::{Deserialize, Deserializer};

/// A single field of a PATCH body.
///
/// Use together with `#[serde(default)]` so a missing key becomes
/// [`Patch::Absent`]; an explicit `null` becomes [`Patch::Null`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// The carried value, treating both absent and null as "nothing to set"
    pub fn value(self) -> Option<T> {
        match self {
            Patch::Value(v) => Some(v),
            Patch::Absent | Patch::Null => None,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only reached when the key is present
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Body {
        #[serde(default)]
        name: Patch<String>,
        #[serde(default)]
        position: Patch<i64>,
    }

    #[test]
    fn test_absent_null_and_value_are_distinct() {
        let body: Body = serde_json::from_str(r#"{"name": null}"#).unwrap();
        assert_eq!(body.name, Patch::Null);
        assert_eq!(body.position, Patch::Absent);

        let body: Body = serde_json::from_str(r#"{"name": "Work", "position": 3}"#).unwrap();
        assert_eq!(body.name, Patch::Value("Work".to_string()));
        assert_eq!(body.position, Patch::Value(3));
    }

    #[test]
    fn test_value_collapses_null_and_absent() {
        assert_eq!(Patch::<i64>::Absent.value(), None);
        assert_eq!(Patch::<i64>::Null.value(), None);
        assert_eq!(Patch::Value(7).value(), Some(7));
        assert!(Patch::<i64>::Absent.is_absent());
        assert!(!Patch::<i64>::Null.is_absent());
    }
}
