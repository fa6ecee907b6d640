//! Compiled statements.

use std::fmt;

/// Placeholder substituted for credentials in redacted output.
pub const REDACTED: &str = "***";

/// What a statement creates or changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// `INSTALL`/`LOAD`.
    Extension,
    /// Trusted passthrough statement.
    Pragma,
    /// `SET`.
    Setting,
    /// `ATTACH`.
    Attachment,
    /// `CREATE SECRET`.
    Secret,
    /// `CREATE SCHEMA`.
    Schema,
    /// `CREATE VIEW`.
    View,
    /// `COMMENT ON VIEW`, named after the view it describes.
    Comment,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Extension => "extension",
            EntityKind::Pragma => "pragma",
            EntityKind::Setting => "setting",
            EntityKind::Attachment => "attachment",
            EntityKind::Secret => "secret",
            EntityKind::Schema => "schema",
            EntityKind::View => "view",
            EntityKind::Comment => "comment on view",
        };
        f.write_str(name)
    }
}

/// The entity a statement originates from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entity {
    /// Entity kind.
    pub kind: EntityKind,
    /// Entity name (view names are schema-qualified when a schema is set).
    pub name: String,
}

impl Entity {
    /// Create an entity reference.
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

/// One SQL statement plus the bookkeeping needed to log it safely.
///
/// `Display` and `Debug` both print the redacted form. Only [`Statement::sql`]
/// exposes credentials, and it should only be handed to the session.
#[derive(Clone, PartialEq, Eq)]
pub struct Statement {
    entity: Entity,
    sql: String,
    redacted: Option<String>,
    sensitive: Vec<String>,
}

impl Statement {
    /// Create a statement that carries no credentials.
    pub fn new(entity: Entity, sql: impl Into<String>) -> Self {
        Self {
            entity,
            sql: sql.into(),
            redacted: None,
            sensitive: Vec::new(),
        }
    }

    /// Create a statement carrying credentials.
    ///
    /// `sensitive` lists the raw credential values so error messages coming
    /// back from the engine can be scrubbed.
    pub fn sensitive(
        entity: Entity,
        sql: impl Into<String>,
        redacted: impl Into<String>,
        sensitive: Vec<String>,
    ) -> Self {
        Self {
            entity,
            sql: sql.into(),
            redacted: Some(redacted.into()),
            sensitive: sensitive.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    /// The executable SQL. May contain credentials.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// SQL safe for logs and dry-run output.
    pub fn redacted(&self) -> &str {
        self.redacted.as_deref().unwrap_or(&self.sql)
    }

    /// The originating entity.
    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    /// Check whether the statement carries credentials.
    pub fn is_sensitive(&self) -> bool {
        self.redacted.is_some()
    }

    /// Replace any credential value found in `message` with [`REDACTED`].
    pub fn scrub(&self, message: &str) -> String {
        let mut out = message.to_string();
        for value in &self.sensitive {
            out = out.replace(value.as_str(), REDACTED);
        }
        out
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.redacted())
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("entity", &self.entity)
            .field("sql", &self.redacted())
            .finish()
    }
}

/// Join statements into a script, one per line, each terminated by `;`.
pub fn to_script<'a>(statements: impl IntoIterator<Item = &'a Statement>, redact: bool) -> String {
    let mut script = String::new();
    for statement in statements {
        script.push_str(if redact {
            statement.redacted()
        } else {
            statement.sql()
        });
        script.push_str(";\n");
    }
    script
}
