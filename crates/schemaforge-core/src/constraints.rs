use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Primary key definition preserving column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryKeyConstraint {
    pub name: String,
    pub column_names: Vec<String>,
}

/// Unique constraint definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UniqueConstraint {
    pub name: String,
    pub column_names: Vec<String>,
}

/// Check constraint definition; `detail` holds the raw expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CheckConstraint {
    pub name: String,
    pub detail: String,
}

/// Foreign key referential action.
///
/// Stored with underscores (`SET_NULL`) and rendered with spaces in DDL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForeignKeyAction {
    Cascade,
    Restrict,
    SetNull,
    SetDefault,
    #[default]
    NoAction,
}

impl ForeignKeyAction {
    /// Stored representation (`SET_NULL`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::Restrict => "RESTRICT",
            ForeignKeyAction::SetNull => "SET_NULL",
            ForeignKeyAction::SetDefault => "SET_DEFAULT",
            ForeignKeyAction::NoAction => "NO_ACTION",
        }
    }

    /// SQL representation (`SET NULL`).
    pub fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::Restrict => "RESTRICT",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::SetDefault => "SET DEFAULT",
            ForeignKeyAction::NoAction => "NO ACTION",
        }
    }

    /// Parse an action in any of the spellings found in sources:
    /// `SET NULL`, `set_null`, `SetNull`, `:nullify`, `setNull`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .trim_start_matches(':')
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "cascade" => Some(ForeignKeyAction::Cascade),
            "restrict" => Some(ForeignKeyAction::Restrict),
            "setnull" | "nullify" => Some(ForeignKeyAction::SetNull),
            "setdefault" => Some(ForeignKeyAction::SetDefault),
            "noaction" => Some(ForeignKeyAction::NoAction),
            _ => None,
        }
    }
}

impl std::fmt::Display for ForeignKeyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Foreign key definition preserving column ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyConstraint {
    pub name: String,
    pub column_names: Vec<String>,
    pub target_table_name: String,
    pub target_column_names: Vec<String>,
    #[serde(default)]
    pub update_constraint: ForeignKeyAction,
    #[serde(default)]
    pub delete_constraint: ForeignKeyAction,
}

/// Table-level constraint definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Constraint {
    #[serde(rename = "PRIMARY KEY")]
    PrimaryKey(PrimaryKeyConstraint),
    #[serde(rename = "FOREIGN KEY")]
    ForeignKey(ForeignKeyConstraint),
    #[serde(rename = "UNIQUE")]
    Unique(UniqueConstraint),
    #[serde(rename = "CHECK")]
    Check(CheckConstraint),
}

impl Constraint {
    pub fn name(&self) -> &str {
        match self {
            Constraint::PrimaryKey(pk) => &pk.name,
            Constraint::ForeignKey(fk) => &fk.name,
            Constraint::Unique(unique) => &unique.name,
            Constraint::Check(check) => &check.name,
        }
    }

    /// SQL keyword for the constraint kind, also its serialized tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Constraint::PrimaryKey(_) => "PRIMARY KEY",
            Constraint::ForeignKey(_) => "FOREIGN KEY",
            Constraint::Unique(_) => "UNIQUE",
            Constraint::Check(_) => "CHECK",
        }
    }

    /// Local column names covered by the constraint; empty for CHECK.
    pub fn column_names(&self) -> &[String] {
        match self {
            Constraint::PrimaryKey(pk) => &pk.column_names,
            Constraint::ForeignKey(fk) => &fk.column_names,
            Constraint::Unique(unique) => &unique.column_names,
            Constraint::Check(_) => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_action_spellings() {
        assert_eq!(ForeignKeyAction::parse("SET NULL"), Some(ForeignKeyAction::SetNull));
        assert_eq!(ForeignKeyAction::parse(":nullify"), Some(ForeignKeyAction::SetNull));
        assert_eq!(ForeignKeyAction::parse("SetDefault"), Some(ForeignKeyAction::SetDefault));
        assert_eq!(ForeignKeyAction::parse("no_action"), Some(ForeignKeyAction::NoAction));
        assert_eq!(ForeignKeyAction::parse("sometimes"), None);
    }

    #[test]
    fn serializes_tagged_by_sql_keyword() {
        let constraint = Constraint::ForeignKey(ForeignKeyConstraint {
            name: "fk_posts_user".to_string(),
            column_names: vec!["user_id".to_string()],
            target_table_name: "users".to_string(),
            target_column_names: vec!["id".to_string()],
            update_constraint: ForeignKeyAction::NoAction,
            delete_constraint: ForeignKeyAction::SetNull,
        });

        let value = serde_json::to_value(&constraint).expect("serialize constraint");
        assert_eq!(value["type"], "FOREIGN KEY");
        assert_eq!(value["deleteConstraint"], "SET_NULL");
        assert_eq!(value["targetTableName"], "users");
    }
}
