//! Status record model
//!
//! A [`StatusRecord`] is the parsed snapshot of one status reply: named
//! attribute groups, each a flat map of field to value, plus an optional
//! message of the day. The serialized form is the on-disk cache layout:
//!
//! ```json
//! {
//!   "serverinfo": { "servername": "Testville", "port": "7171" },
//!   "players": { "online": "12", "max": "100" },
//!   "motd": "Welcome!"
//! }
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Fields of one attribute group
pub type AttributeMap = BTreeMap<String, FieldValue>;

/// Attribute groups recognized in a status reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeGroup {
    ServerInfo,
    Owner,
    Players,
    Monsters,
    Map,
    Rates,
    Npcs,
}

impl AttributeGroup {
    /// Get all recognized groups
    pub fn all() -> &'static [AttributeGroup] {
        &[
            AttributeGroup::ServerInfo,
            AttributeGroup::Owner,
            AttributeGroup::Players,
            AttributeGroup::Monsters,
            AttributeGroup::Map,
            AttributeGroup::Rates,
            AttributeGroup::Npcs,
        ]
    }

    /// Element name in the reply and key in the cache file
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeGroup::ServerInfo => "serverinfo",
            AttributeGroup::Owner => "owner",
            AttributeGroup::Players => "players",
            AttributeGroup::Monsters => "monsters",
            AttributeGroup::Map => "map",
            AttributeGroup::Rates => "rates",
            AttributeGroup::Npcs => "npcs",
        }
    }

    /// Look a group up by its element name (case-sensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|g| g.as_str() == name)
    }
}

impl fmt::Display for AttributeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field value: text as sent by the server, or a JSON number when
/// the cache file was written that way
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(serde_json::Number),
    Text(String),
}

impl FieldValue {
    /// Textual form of the value
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s.as_str()),
            FieldValue::Number(n) => Cow::Owned(n.to_string()),
        }
    }

    /// Value as an unsigned integer, if it is one
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Number(n) => n.as_u64(),
        }
    }

    /// Value as a float, if it is numeric
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Number(n) => n.as_f64(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Number(value.into())
    }
}

/// Parsed status snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Message of the day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    motd: Option<String>,

    /// Attribute groups keyed by element name
    #[serde(flatten)]
    groups: BTreeMap<String, AttributeMap>,
}

impl StatusRecord {
    /// Create an empty record (every field absent)
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the record holds no groups and no motd
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.motd.is_none()
    }

    /// Get the fields of a group by name
    pub fn group(&self, name: &str) -> Option<&AttributeMap> {
        self.groups.get(name)
    }

    /// Get one field of a group
    pub fn field(&self, group: &str, field: &str) -> Option<&FieldValue> {
        self.groups.get(group).and_then(|fields| fields.get(field))
    }

    /// Whether a group element was present in the reply
    pub fn has_group(&self, group: AttributeGroup) -> bool {
        self.groups.contains_key(group.as_str())
    }

    /// Set one field, creating the group if needed
    pub fn insert_field(
        &mut self,
        group: AttributeGroup,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) {
        self.groups
            .entry(group.as_str().to_string())
            .or_default()
            .insert(field.into(), value.into());
    }

    /// Mark a group as present even if it carries no attributes
    pub fn ensure_group(&mut self, group: AttributeGroup) -> &mut AttributeMap {
        self.groups.entry(group.as_str().to_string()).or_default()
    }

    pub fn motd(&self) -> Option<&str> {
        self.motd.as_deref()
    }

    pub fn set_motd(&mut self, motd: impl Into<String>) {
        self.motd = Some(motd.into());
    }

    /// Iterate over the groups present in the record
    pub fn groups(&self) -> impl Iterator<Item = (&str, &AttributeMap)> {
        self.groups.iter().map(|(name, fields)| (name.as_str(), fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_group_names() {
        assert_eq!(AttributeGroup::ServerInfo.as_str(), "serverinfo");
        assert_eq!(
            AttributeGroup::from_name("rates"),
            Some(AttributeGroup::Rates)
        );
        assert_eq!(AttributeGroup::from_name("Rates"), None);
        assert_eq!(AttributeGroup::from_name("motd"), None);
        assert_eq!(AttributeGroup::all().len(), 7);
    }

    #[test]
    fn test_field_value_conversions() {
        let text = FieldValue::from(" 7171 ");
        assert_eq!(text.as_u64(), Some(7171));

        let rate = FieldValue::from("1.5");
        assert_eq!(rate.as_u64(), None);
        assert_eq!(rate.as_f64(), Some(1.5));

        let number = FieldValue::from(42u64);
        assert_eq!(number.to_text(), "42");
        assert_eq!(number.as_u64(), Some(42));

        assert_eq!(FieldValue::from("").as_u64(), None);
    }

    #[test]
    fn test_serialized_layout() {
        let mut record = StatusRecord::new();
        record.insert_field(AttributeGroup::ServerInfo, "ip", "10.0.0.5");
        record.insert_field(AttributeGroup::Players, "online", "12");
        record.set_motd("Welcome!");

        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "serverinfo": { "ip": "10.0.0.5" },
                "players": { "online": "12" },
                "motd": "Welcome!"
            })
        );
    }

    #[test]
    fn test_deserialize_mixed_values() {
        let record: StatusRecord = serde_json::from_str(
            r#"{"players":{"online":12,"max":"100"},"npcs":{}}"#,
        )
        .unwrap();

        assert_eq!(
            record.field("players", "online"),
            Some(&FieldValue::from(12u64))
        );
        assert_eq!(record.field("players", "max").and_then(FieldValue::as_u64), Some(100));
        assert!(record.has_group(AttributeGroup::Npcs));
        assert!(record.motd().is_none());
    }

    #[test]
    fn test_empty_record() {
        let record = StatusRecord::new();
        assert!(record.is_empty());
        assert_eq!(serde_json::to_string(&record).unwrap(), "{}");
        assert!(record.field("serverinfo", "ip").is_none());
    }
}
