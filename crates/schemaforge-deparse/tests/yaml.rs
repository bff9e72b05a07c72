use pretty_assertions::assert_eq;
use schemaforge_core::{Column, DefaultValue, Schema, Table};
use schemaforge_deparse::yaml_schema_deparser;
use schemaforge_parse::{SupportedFormat, process};

#[test]
fn yaml_output_round_trips_through_the_yaml_parser() {
    let mut table = Table::new("users");
    let mut id = Column::new("id", "bigint");
    id.primary = true;
    id.not_null = true;
    table.insert_column(id);
    let mut active = Column::new("active", "boolean");
    active.default = Some(DefaultValue::Boolean(false));
    table.insert_column(active);
    let mut schema = Schema::default();
    schema.insert_table(table);

    let result = yaml_schema_deparser(&schema);
    assert!(result.is_ok());
    assert!(!result.value.contains("null"));
    assert!(result.value.contains("notNull: true"));

    let parsed = process(SupportedFormat::Yaml, &result.value);
    assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
    assert_eq!(parsed.value, schema);
}
