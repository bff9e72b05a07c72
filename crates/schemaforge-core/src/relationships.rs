use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{Constraint, ForeignKeyAction};
use crate::schema::{Schema, Table};

/// Cardinality of a relationship seen from the referenced (primary) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
}

/// A single column-to-column edge derived from a foreign key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub name: String,
    pub primary_table_name: String,
    pub primary_column_name: String,
    pub foreign_table_name: String,
    pub foreign_column_name: String,
    pub cardinality: Cardinality,
    pub update_constraint: ForeignKeyAction,
    pub delete_constraint: ForeignKeyAction,
}

/// Derive relationships from every foreign key in the schema.
///
/// Each column pair of a foreign key becomes its own entry. Single-column
/// keys keep the constraint name; composite keys are suffixed with the
/// zero-based ordinal of the pair (`fk_name_0`, `fk_name_1`).
pub fn constraints_to_relationships(schema: &Schema) -> IndexMap<String, Relationship> {
    let mut relationships = IndexMap::new();

    for table in schema.tables.values() {
        for constraint in table.constraints.values() {
            let Constraint::ForeignKey(fk) = constraint else {
                continue;
            };

            let composite = fk.column_names.len() > 1;
            let pairs = fk.column_names.iter().zip(fk.target_column_names.iter());

            for (ordinal, (foreign_column, primary_column)) in pairs.enumerate() {
                let name = if composite {
                    format!("{}_{ordinal}", fk.name)
                } else {
                    fk.name.clone()
                };

                let cardinality = if is_single_column_unique(table, foreign_column) {
                    Cardinality::OneToOne
                } else {
                    Cardinality::OneToMany
                };

                relationships.insert(
                    name.clone(),
                    Relationship {
                        name,
                        primary_table_name: fk.target_table_name.clone(),
                        primary_column_name: primary_column.clone(),
                        foreign_table_name: table.name.clone(),
                        foreign_column_name: foreign_column.clone(),
                        cardinality,
                        update_constraint: fk.update_constraint,
                        delete_constraint: fk.delete_constraint,
                    },
                );
            }
        }
    }

    relationships
}

fn is_single_column_unique(table: &Table, column: &str) -> bool {
    if table
        .columns
        .get(column)
        .is_some_and(|col| col.unique)
    {
        return true;
    }

    table.constraints.values().any(|constraint| match constraint {
        Constraint::Unique(unique) => {
            unique.column_names.len() == 1 && unique.column_names[0] == column
        }
        Constraint::PrimaryKey(pk) => pk.column_names.len() == 1 && pk.column_names[0] == column,
        _ => false,
    })
}
