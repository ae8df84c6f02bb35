//! Flat records emitted by the extractors

/// Ordered mapping of field name to string value.
///
/// Fields keep their first-insertion position; setting an existing field
/// replaces its value in place. Values are never absent: a cell that was not
/// found is stored as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

/// Account/compliance record. Its field set grows with the compliance years found.
pub type AccountRecord = Record;

/// Transaction record with the fixed 15-column schema.
pub type TransactionRecord = Record;

impl Record {
    /// Creates an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing the value if the field already exists
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Gets a field value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Field names in insertion order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// (name, value) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_insertion_order() {
        let mut record = Record::new();
        record.set("Account_Type", "Operator Holding Account");
        record.set("Account_Holder_Name", "Stadtwerke");
        record.set("Account_Type", "Aircraft Operator Account");

        let names: Vec<_> = record.field_names().collect();
        assert_eq!(names, vec!["Account_Type", "Account_Holder_Name"]);
        assert_eq!(record.get("Account_Type"), Some("Aircraft Operator Account"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_missing_field_is_none() {
        let record = Record::new();
        assert!(record.is_empty());
        assert_eq!(record.get("Transaction_ID"), None);
    }
}
