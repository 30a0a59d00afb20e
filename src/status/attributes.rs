//! Typed accessors over a status record
//!
//! Each accessor reads one named field and returns `None` when the field or
//! its whole group is missing. Numeric accessors also return `None` when the
//! server sent something that is not a number; a present `"0"` is `Some(0)`.

use std::borrow::Cow;

use super::record::{AttributeGroup, FieldValue, StatusRecord};

/// Typed, null-safe view over a [`StatusRecord`]
pub trait Attributes {
    /// The record the accessors read from
    fn record(&self) -> &StatusRecord;

    /// Raw field lookup
    fn value(&self, group: AttributeGroup, field: &str) -> Option<&FieldValue> {
        self.record().field(group.as_str(), field)
    }

    /// Field as text
    fn text(&self, group: AttributeGroup, field: &str) -> Option<Cow<'_, str>> {
        self.value(group, field).map(FieldValue::to_text)
    }

    /// Field as an unsigned integer
    fn number(&self, group: AttributeGroup, field: &str) -> Option<u64> {
        self.value(group, field).and_then(FieldValue::as_u64)
    }

    /// Field as a float
    fn ratio(&self, group: AttributeGroup, field: &str) -> Option<f64> {
        self.value(group, field).and_then(FieldValue::as_f64)
    }

    // Server info

    /// Server uptime in seconds
    fn uptime(&self) -> Option<u64> {
        self.number(AttributeGroup::ServerInfo, "uptime")
    }

    fn ip(&self) -> Option<Cow<'_, str>> {
        self.text(AttributeGroup::ServerInfo, "ip")
    }

    fn servername(&self) -> Option<Cow<'_, str>> {
        self.text(AttributeGroup::ServerInfo, "servername")
    }

    fn port(&self) -> Option<u64> {
        self.number(AttributeGroup::ServerInfo, "port")
    }

    fn location(&self) -> Option<Cow<'_, str>> {
        self.text(AttributeGroup::ServerInfo, "location")
    }

    fn url(&self) -> Option<Cow<'_, str>> {
        self.text(AttributeGroup::ServerInfo, "url")
    }

    /// Server software name
    fn server(&self) -> Option<Cow<'_, str>> {
        self.text(AttributeGroup::ServerInfo, "server")
    }

    /// Server software version
    fn version(&self) -> Option<Cow<'_, str>> {
        self.text(AttributeGroup::ServerInfo, "version")
    }

    /// Supported client version
    fn client(&self) -> Option<Cow<'_, str>> {
        self.text(AttributeGroup::ServerInfo, "client")
    }

    // Owner

    fn owner_name(&self) -> Option<Cow<'_, str>> {
        self.text(AttributeGroup::Owner, "name")
    }

    fn owner_email(&self) -> Option<Cow<'_, str>> {
        self.text(AttributeGroup::Owner, "email")
    }

    // Population

    fn players_online(&self) -> Option<u64> {
        self.number(AttributeGroup::Players, "online")
    }

    fn players_max(&self) -> Option<u64> {
        self.number(AttributeGroup::Players, "max")
    }

    /// Highest number of players seen online at once
    fn players_peak(&self) -> Option<u64> {
        self.number(AttributeGroup::Players, "peak")
    }

    fn monsters_total(&self) -> Option<u64> {
        self.number(AttributeGroup::Monsters, "total")
    }

    // Map

    fn map_name(&self) -> Option<Cow<'_, str>> {
        self.text(AttributeGroup::Map, "name")
    }

    fn map_author(&self) -> Option<Cow<'_, str>> {
        self.text(AttributeGroup::Map, "author")
    }

    fn map_width(&self) -> Option<u64> {
        self.number(AttributeGroup::Map, "width")
    }

    fn map_height(&self) -> Option<u64> {
        self.number(AttributeGroup::Map, "height")
    }

    // Rates (multipliers, often fractional)

    fn rates_experience(&self) -> Option<f64> {
        self.ratio(AttributeGroup::Rates, "experience")
    }

    fn rates_magic(&self) -> Option<f64> {
        self.ratio(AttributeGroup::Rates, "magic")
    }

    fn rates_skill(&self) -> Option<f64> {
        self.ratio(AttributeGroup::Rates, "skill")
    }

    fn rates_loot(&self) -> Option<f64> {
        self.ratio(AttributeGroup::Rates, "loot")
    }

    fn rates_spawn(&self) -> Option<f64> {
        self.ratio(AttributeGroup::Rates, "spawn")
    }

    /// Message of the day
    fn motd(&self) -> Option<&str> {
        self.record().motd()
    }
}

impl Attributes for StatusRecord {
    fn record(&self) -> &StatusRecord {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StatusRecord {
        let mut record = StatusRecord::new();
        record.insert_field(AttributeGroup::ServerInfo, "uptime", "3600");
        record.insert_field(AttributeGroup::ServerInfo, "ip", "1.2.3.4");
        record.insert_field(AttributeGroup::ServerInfo, "port", "7171");
        record.insert_field(AttributeGroup::ServerInfo, "servername", "Testville");
        record.insert_field(AttributeGroup::ServerInfo, "version", "1.2");
        record.insert_field(AttributeGroup::Players, "online", "0");
        record.insert_field(AttributeGroup::Players, "max", "100");
        record.insert_field(AttributeGroup::Map, "width", "wide");
        record.insert_field(AttributeGroup::Rates, "experience", "1.5");
        record.insert_field(AttributeGroup::Rates, "loot", "2");
        record
    }

    #[test]
    fn test_present_fields() {
        let record = sample();
        assert_eq!(record.uptime(), Some(3600));
        assert_eq!(record.ip().as_deref(), Some("1.2.3.4"));
        assert_eq!(record.port(), Some(7171));
        assert_eq!(record.servername().as_deref(), Some("Testville"));
        assert_eq!(record.version().as_deref(), Some("1.2"));
        assert_eq!(record.players_max(), Some(100));
        assert_eq!(record.rates_experience(), Some(1.5));
        assert_eq!(record.rates_loot(), Some(2.0));
    }

    #[test]
    fn test_zero_is_not_absent() {
        let record = sample();
        assert_eq!(record.players_online(), Some(0));
    }

    #[test]
    fn test_missing_field_and_group() {
        let record = sample();
        // Group present, field missing
        assert_eq!(record.players_peak(), None);
        assert_eq!(record.location(), None);
        // Whole group missing
        assert_eq!(record.owner_name(), None);
        assert_eq!(record.owner_email(), None);
        assert_eq!(record.monsters_total(), None);
        assert_eq!(record.map_name(), None);
        assert_eq!(record.rates_spawn(), None);
        assert_eq!(record.motd(), None);
    }

    #[test]
    fn test_non_numeric_value_is_absent() {
        let record = sample();
        assert_eq!(record.map_width(), None);
        assert_eq!(
            record.text(AttributeGroup::Map, "width").as_deref(),
            Some("wide")
        );
    }

    #[test]
    fn test_empty_record_never_panics() {
        let record = StatusRecord::new();
        assert!(record.uptime().is_none());
        assert!(record.ip().is_none());
        assert!(record.servername().is_none());
        assert!(record.port().is_none());
        assert!(record.url().is_none());
        assert!(record.server().is_none());
        assert!(record.client().is_none());
        assert!(record.map_author().is_none());
        assert!(record.map_height().is_none());
        assert!(record.rates_magic().is_none());
        assert!(record.rates_skill().is_none());
    }
}
