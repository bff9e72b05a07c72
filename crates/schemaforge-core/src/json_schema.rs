use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::schema::Schema;

/// Emit the JSON Schema for the canonical schema document.
pub fn schema_json_schema() -> RootSchema {
    schema_for!(Schema)
}
