//! Persistent extension records

use serde::{Deserialize, Serialize};

use crate::filter::{Field, Value};

/// An installed extension as persisted by an [`ExtensionStore`](crate::ExtensionStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    /// Store-assigned identifier; never reused.
    pub id: i64,
    /// Lower-cased directory name of the extension.
    pub slug: String,
    /// Display name, may be empty.
    #[serde(default)]
    pub name: String,
    /// Free-form version string.
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Marks a protected extension. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_core: Option<bool>,
    #[serde(default)]
    pub enabled: bool,
}

impl Extension {
    /// Read a column as a comparable [`Value`].
    pub fn field(&self, field: Field) -> Value {
        match field {
            Field::Id => Value::Int(self.id),
            Field::Slug => Value::Text(self.slug.clone()),
            Field::Name => Value::Text(self.name.clone()),
            Field::Version => Value::Text(self.version.clone()),
            Field::Author => self.author.clone().map_or(Value::Null, Value::Text),
            Field::Description => self.description.clone().map_or(Value::Null, Value::Text),
            Field::IsCore => self.is_core.map_or(Value::Null, Value::Bool),
            Field::Enabled => Value::Bool(self.enabled),
        }
    }

    /// Whether the extension is flagged as core.
    pub fn is_core(&self) -> bool {
        self.is_core.unwrap_or(false)
    }
}

/// A record that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewExtension {
    pub slug: String,
    pub name: String,
    pub version: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub is_core: Option<bool>,
    pub enabled: bool,
}

impl NewExtension {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_core(mut self, is_core: bool) -> Self {
        self.is_core = Some(is_core);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Attach the store-assigned id.
    pub fn into_record(self, id: i64) -> Extension {
        Extension {
            id,
            slug: self.slug,
            name: self.name,
            version: self.version,
            author: self.author,
            description: self.description,
            is_core: self.is_core,
            enabled: self.enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_columns_read_as_null() {
        let record = NewExtension::new("menus").into_record(3);

        assert_eq!(record.field(Field::Id), Value::Int(3));
        assert_eq!(record.field(Field::Author), Value::Null);
        assert_eq!(record.field(Field::IsCore), Value::Null);
        assert_eq!(record.field(Field::Enabled), Value::Bool(false));
        assert!(!record.is_core());
    }

    #[test]
    fn builder_sets_every_column() {
        let record = NewExtension::new("users")
            .with_name("Users")
            .with_version("1.1")
            .with_author("Platform")
            .with_description("Accounts")
            .with_core(true)
            .with_enabled(true)
            .into_record(1);

        assert_eq!(record.slug, "users");
        assert_eq!(record.field(Field::Author), Value::Text("Platform".into()));
        assert!(record.is_core());
        assert!(record.enabled);
    }
}
