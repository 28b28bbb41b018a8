use rowloom::inflect;
use rowloom::registry::RecordSchema;

#[test]
fn type_names_lowercase_and_pluralize() {
    assert_eq!(inflect::table_name("Account"), "accounts");
    assert_eq!(inflect::table_name("Hangar"), "hangars");
    assert_eq!(inflect::table_name("Status"), "statuses");
    assert_eq!(inflect::table_name("Box"), "boxes");
    assert_eq!(inflect::table_name("Match"), "matches");
    assert_eq!(inflect::table_name("Wish"), "wishes");
    assert_eq!(inflect::table_name("Topaz"), "topazes");
    assert_eq!(inflect::table_name("Category"), "categories");
    assert_eq!(inflect::table_name("Key"), "keys", "vowel before y keeps the y");
}

#[test]
fn schemas_derive_their_table_from_the_type() {
    let schema = RecordSchema::new("Delivery");
    assert_eq!(schema.table_name(), "deliveries");
}

#[test]
fn explicit_tables_override_the_convention() {
    let schema = RecordSchema::new("Crew").table("crew_manifest");
    assert_eq!(schema.table_name(), "crew_manifest");
}
