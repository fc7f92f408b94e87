use super::*;
use crate::sql::{maybe_quote_ident, quote_ident, quoted_qualified, sql_literal};

fn integer_column(name: &str) -> Column {
    Column::new(name, "integer")
}

#[test]
fn test_quote_ident() {
    assert_eq!(quote_ident("user"), "\"user\"");
    assert_eq!(quote_ident("bla\"h"), "\"bla\"\"h\"");
}

#[test]
fn test_sql_literal() {
    assert_eq!(sql_literal("1.0"), "'1.0'");
    assert_eq!(sql_literal("it's"), "'it''s'");
}

#[test]
fn test_maybe_quote_ident() {
    assert_eq!(maybe_quote_ident("x"), "x");
    assert_eq!(maybe_quote_ident("user_id"), "user_id");
    assert_eq!(maybe_quote_ident("_hidden"), "_hidden");
    assert_eq!(maybe_quote_ident("Weird"), "\"Weird\"");
    assert_eq!(maybe_quote_ident("1col"), "\"1col\"");
    assert_eq!(maybe_quote_ident("with space"), "\"with space\"");
}

#[test]
fn test_quoted_qualified() {
    assert_eq!(quoted_qualified("public", "t"), "\"public\".\"t\"");
}

#[test]
fn test_column_definitions() {
    assert_eq!(integer_column("x").definition(), "x integer");

    let mut c = integer_column("x");
    c.not_null = true;
    c.default = Some("0".to_string());
    assert_eq!(c.definition(), "x integer default 0 not null");

    let mut g = integer_column("doubled");
    g.is_generated = true;
    g.default = Some("x * 2".to_string());
    assert_eq!(
        g.definition(),
        "doubled integer generated always as (x * 2) stored"
    );
}

#[test]
fn test_column_clauses() {
    let c = integer_column("x");
    assert_eq!(c.add_column_clause(), "add column x integer");
    assert_eq!(c.drop_column_clause(), "drop column x");
}

#[test]
fn test_column_alter_statements() {
    let mut before = integer_column("x");
    before.not_null = true;

    let mut after = Column::new("x", "bigint");
    after.default = Some("7".to_string());

    let statements = after.alter_table_statements(&before, "\"public\".\"t\"");
    assert_eq!(
        statements,
        vec![
            "alter table \"public\".\"t\" alter column x set data type bigint using x::bigint;",
            "alter table \"public\".\"t\" alter column x set default 7;",
            "alter table \"public\".\"t\" alter column x drop not null;",
        ]
    );
}

#[test]
fn test_create_table_statement() {
    let table = Selectable::table(
        "public",
        "t",
        vec![integer_column("x"), {
            let mut c = Column::new("name", "text");
            c.not_null = true;
            c
        }],
    );

    insta::assert_snapshot!(table.create_statement(), @r#"
    create table "public"."t" (
      x integer,
      name text not null
    );
    "#);
    assert_eq!(table.drop_statement(), "drop table \"public\".\"t\";");
}

#[test]
fn test_unlogged_and_partitioned_create() {
    let mut table = Selectable::table("public", "log", vec![integer_column("x")]);
    table.is_unlogged = true;
    assert!(table.create_statement().starts_with("create unlogged table"));

    let mut parent = Selectable::table("public", "events", vec![integer_column("kind")]);
    parent.kind = RelationKind::PartitionedTable;
    parent.partition_by = Some("list (kind)".to_string());
    insta::assert_snapshot!(parent.create_statement(), @r#"
    create table "public"."events" (
      kind integer
    ) partition by list (kind);
    "#);
}

#[test]
fn test_view_statements() {
    let view = Selectable::view("public", "v", "select 1 as one;", vec![integer_column("one")]);
    assert_eq!(
        view.create_statement(),
        "create view \"public\".\"v\" as\nselect 1 as one;"
    );
    assert_eq!(view.drop_statement(), "drop view \"public\".\"v\";");
    assert_eq!(
        view.safer_create_statements(),
        Some(vec![
            "create or replace view \"public\".\"v\" as\nselect 1 as one;".to_string()
        ])
    );
}

#[test]
fn test_view_can_replace_requires_column_prefix() {
    let v1 = Selectable::view("public", "v", "select 1 as a;", vec![integer_column("a")]);
    let v2 = Selectable::view(
        "public",
        "v",
        "select 1 as a, 2 as b;",
        vec![integer_column("a"), integer_column("b")],
    );
    let v3 = Selectable::view("public", "v", "select 2 as b;", vec![integer_column("b")]);

    assert!(v2.can_replace(&v1));
    assert!(!v1.can_replace(&v2));
    assert!(!v3.can_replace(&v1));
}

#[test]
fn test_function_statements() {
    let f = Selectable::function(
        "public",
        "add_one",
        "integer",
        "integer",
        "create function \"public\".\"add_one\"(integer) returns integer as $$ select $1 + 1 $$ language sql;",
    );
    assert_eq!(
        f.identity(),
        "\"public\".\"add_one\"(integer)"
    );
    assert_eq!(
        f.drop_statement(),
        "drop function \"public\".\"add_one\"(integer);"
    );
    let safer = f.safer_create_statements().unwrap();
    assert!(safer[0].starts_with("create or replace function"));

    let same_signature = Selectable::function(
        "public",
        "add_one",
        "integer",
        "integer",
        "create function \"public\".\"add_one\"(integer) returns integer as $$ select $1 + 2 $$ language sql;",
    );
    assert!(same_signature.can_replace(&f));

    let other_result = Selectable::function(
        "public",
        "add_one",
        "integer",
        "bigint",
        "create function \"public\".\"add_one\"(integer) returns bigint as $$ select $1 + 1 $$ language sql;",
    );
    assert!(!other_result.can_replace(&f));
}

#[test]
fn test_function_replace_header_after_multibyte_prefix() {
    // "İ" grows by a byte when lowercased; the header rewrite must not
    // splice at offsets computed from lowercased text.
    let f = Selectable::function(
        "public",
        "f",
        "",
        "integer",
        "/* İnit */ CREATE FUNCTION \"public\".\"f\"() returns integer as $$ select 1 $$ language sql;",
    );
    let safer = f.safer_create_statements().unwrap();
    assert_eq!(
        safer,
        vec![
            "/* İnit */ create or replace FUNCTION \"public\".\"f\"() returns integer as $$ select 1 $$ language sql;"
        ]
    );

    let already = Selectable::function(
        "public",
        "f",
        "",
        "integer",
        "CREATE OR REPLACE function \"public\".\"f\"() returns integer as $$ select 1 $$ language sql;",
    );
    assert_eq!(
        already.safer_create_statements().unwrap(),
        vec![already.definition.clone()]
    );
}

#[test]
fn test_materialized_view_has_no_safer_path() {
    let mv = Selectable::materialized_view("public", "mv", "select 1;", vec![]);
    assert_eq!(mv.safer_create_statements(), None);
}

#[test]
fn test_composite_type_attribute_alters() {
    let before = Selectable::composite_type(
        "public",
        "pair",
        vec![integer_column("a"), integer_column("b")],
    );
    let after = Selectable::composite_type(
        "public",
        "pair",
        vec![Column::new("a", "bigint"), integer_column("c")],
    );

    assert_eq!(
        after.alter_statements(&before),
        vec![
            "alter type \"public\".\"pair\" drop attribute b;",
            "alter type \"public\".\"pair\" alter attribute a set data type bigint;",
            "alter type \"public\".\"pair\" add attribute c integer;",
        ]
    );
}

#[test]
fn test_enum_statements() {
    let e = EnumType::new("public", "mood", &["happy", "sad"]);
    assert_eq!(
        e.create_statement(),
        "create type \"public\".\"mood\" as enum ('happy', 'sad');"
    );
    assert_eq!(e.drop_statement(), "drop type \"public\".\"mood\";");
    assert_eq!(
        e.alter_rename_statement("mood__old_version_to_be_dropped"),
        "alter type \"public\".\"mood\" rename to \"mood__old_version_to_be_dropped\";"
    );
    assert_eq!(
        e.drop_statement_with_rename("mood__old_version_to_be_dropped"),
        "drop type \"public\".\"mood__old_version_to_be_dropped\";"
    );
}

#[test]
fn test_extension_statements() {
    let ext = Extension::new("plpgsql", "pg_catalog", "1.0");
    assert_eq!(
        ext.create_statement(),
        "create extension if not exists \"plpgsql\" with schema \"pg_catalog\" version '1.0';"
    );
    assert_eq!(
        ext.drop_statement(),
        "drop extension if exists \"plpgsql\";"
    );

    let newer = Extension::new("plpgsql", "pg_catalog", "1.1");
    assert_eq!(
        newer.alter_statements(&ext),
        vec!["alter extension \"plpgsql\" update to version '1.1';"]
    );

    assert!(
        !ext.without_version()
            .create_statement()
            .contains("version")
    );
}

#[test]
fn test_sequence_ownership() {
    let seq = Sequence::new("public", "t_id_seq").owned_by("t", "id");
    assert_eq!(
        seq.quoted_table_and_column_name(),
        "\"public\".\"t\".\"id\""
    );
    assert_eq!(
        seq.alter_ownership_statement(),
        "alter sequence \"public\".\"t_id_seq\" owned by \"public\".\"t\".\"id\";"
    );

    let unowned = Sequence::new("public", "free_seq");
    assert_eq!(unowned.quoted_table_and_column_name(), "");
    assert_eq!(
        unowned.alter_ownership_statement(),
        "alter sequence \"public\".\"free_seq\" owned by none;"
    );
}

#[test]
fn test_constraint_statements() {
    let fk = Constraint::new(
        "public",
        "comment",
        "comment_post_id_fkey",
        "foreign key (post_id) references \"public\".\"post\"(id)",
        "FOREIGN KEY",
    );
    assert_eq!(
        fk.create_statement(),
        "alter table \"public\".\"comment\" add constraint \"comment_post_id_fkey\" foreign key (post_id) references \"public\".\"post\"(id);"
    );
    assert_eq!(
        fk.safer_create_statements(),
        Some(vec![
            "alter table \"public\".\"comment\" add constraint \"comment_post_id_fkey\" foreign key (post_id) references \"public\".\"post\"(id) not valid;".to_string(),
            "alter table \"public\".\"comment\" validate constraint \"comment_post_id_fkey\";".to_string(),
        ])
    );

    let pk = Constraint::new("public", "post", "post_pkey", "primary key (id)", "PRIMARY KEY");
    assert_eq!(pk.safer_create_statements(), None);
}

#[test]
fn test_trigger_statements() {
    let tg = Trigger::new(
        "public",
        "t",
        "tg",
        "create trigger tg before insert on \"public\".\"t\" for each row execute function touch()",
    );
    assert_eq!(tg.identity(), "\"public\".\"t\".\"tg\"");
    assert_eq!(tg.quoted_full_selectable_name(), "\"public\".\"t\"");
    assert_eq!(
        tg.drop_statement(),
        "drop trigger \"tg\" on \"public\".\"t\";"
    );
    assert!(tg.create_statement().ends_with(';'));
}

#[test]
fn test_comment_statements() {
    let mut v = Selectable::view("public", "v", "select 1;", vec![]);
    v.comment = Some("it's a view".to_string());
    assert_eq!(
        v.comment_statement(),
        Some("COMMENT ON VIEW \"public\".\"v\" IS 'it''s a view';".to_string())
    );

    let mut cleared = v.clone();
    cleared.comment = None;
    assert_eq!(
        v.comment_alter_statements(&cleared),
        vec!["COMMENT ON VIEW \"public\".\"v\" IS NULL;"]
    );
    assert_eq!(v.comment_alter_statements(&v.clone()), Vec::<String>::new());
}

#[test]
fn test_catalog_resolves_dependency_edges() {
    let mut catalog = Catalog::new();
    let table = Selectable::table("public", "t", vec![integer_column("x")]);
    let table_id = table.identity();

    let mut view = Selectable::view("public", "v", "select x from t;", vec![integer_column("x")]);
    view.dependent_on = vec![table_id.clone()];
    let view_id = view.identity();

    let mut outer = Selectable::view("public", "vv", "select x from v;", vec![integer_column("x")]);
    outer.dependent_on = vec![view_id.clone()];
    let outer_id = outer.identity();

    catalog.add_selectable(table);
    catalog.add_selectable(view);
    catalog.add_selectable(outer);
    catalog.resolve_dependencies();

    let table = &catalog.selectables[&table_id];
    assert_eq!(table.dependents, vec![view_id.clone()]);
    assert_eq!(
        table.dependents_all,
        vec![view_id.clone(), outer_id.clone()]
    );
    assert_eq!(catalog.selectables[&outer_id].dependents, Vec::<String>::new());
}
