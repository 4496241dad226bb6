//! Statement text and parameter order produced by `sql_for_partial_update`.

use jobly::{JoblyError, Table, UpdateFields, Value, sql_for_partial_update};

#[test]
fn one_field() {
    let fields = UpdateFields::new().with("first_name", "Jessica");
    let stmt = sql_for_partial_update("users", &fields, "id", 1).unwrap();

    assert_eq!(stmt.sql(), "UPDATE users SET first_name=$1 WHERE id=$2 RETURNING *");
    assert_eq!(stmt.params(), [Value::from("Jessica"), Value::Int(1)]);
}

#[test]
fn many_fields() {
    let fields = UpdateFields::new()
        .with("first_name", "Jessica")
        .with("last_name", "Something")
        .with("phone", 4_155_550_000_i64)
        .with("location", "San Francisco");
    let stmt = sql_for_partial_update("users", &fields, "id", 1).unwrap();

    assert_eq!(
        stmt.sql(),
        "UPDATE users SET first_name=$1, last_name=$2, phone=$3, location=$4 WHERE id=$5 RETURNING *"
    );
    assert_eq!(
        stmt.params(),
        [
            Value::from("Jessica"),
            Value::from("Something"),
            Value::Int(4_155_550_000),
            Value::from("San Francisco"),
            Value::Int(1),
        ]
    );
}

#[test]
fn underscore_fields_are_dropped() {
    let fields = UpdateFields::new()
        .with("_first_name", "Jessica")
        .with("_last_name", "Something")
        .with("phone", 4_155_550_000_i64)
        .with("location", "San Francisco");
    let stmt = sql_for_partial_update("users", &fields, "id", 1).unwrap();

    assert_eq!(
        stmt.sql(),
        "UPDATE users SET phone=$1, location=$2 WHERE id=$3 RETURNING *"
    );
    assert_eq!(
        stmt.params(),
        [Value::Int(4_155_550_000), Value::from("San Francisco"), Value::Int(1)]
    );
}

#[test]
fn underscore_fields_are_dropped_anywhere() {
    let fields = UpdateFields::new()
        .with("a", 1)
        .with("_token", "secret-token")
        .with("b", 2)
        .with("_", true);
    let stmt = sql_for_partial_update("t", &fields, "id", 3).unwrap();

    assert_eq!(stmt.sql(), "UPDATE t SET a=$1, b=$2 WHERE id=$3 RETURNING *");
    assert!(!stmt.params().contains(&Value::from("secret-token")));
    assert!(!stmt.params().contains(&Value::Bool(true)));
}

#[test]
fn empty_fields_are_rejected() {
    let err = sql_for_partial_update("users", &UpdateFields::new(), "id", 1).unwrap_err();
    assert!(matches!(err, JoblyError::InvalidArgument(_)));
    assert_eq!(err.to_string(), "Invalid argument: no fields to update in users");
    assert_eq!(err.status_code(), 400);
}

#[test]
fn reserved_only_fields_are_rejected() {
    let fields = UpdateFields::new().with("_token", "t");
    let err = sql_for_partial_update(Table::Users, &fields, "username", "jo").unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn key_placeholder_follows_the_set_clause() {
    for n in 1..=12 {
        let fields: UpdateFields = (0..n).map(|i| (format!("c{i}"), i)).collect();
        let stmt = sql_for_partial_update("t", &fields, "k", "key").unwrap();

        assert!(stmt.sql().ends_with(&format!("WHERE k=${} RETURNING *", n + 1)));
        assert_eq!(stmt.params().len(), n as usize + 1);
        assert_eq!(stmt.params()[n as usize], Value::from("key"));
        for i in 0..n {
            assert_eq!(stmt.params()[i as usize], Value::from(i));
            assert!(stmt.sql().contains(&format!("c{i}=${}", i + 1)));
        }
    }
}

#[test]
fn values_never_reach_the_statement_text() {
    let hostile = "'; DROP TABLE users; --";
    let fields = UpdateFields::new()
        .with("first_name", hostile)
        .with("last_name", "O'Brien");
    let stmt = sql_for_partial_update("users", &fields, "username", hostile).unwrap();

    assert!(!stmt.sql().contains("DROP"));
    assert!(!stmt.sql().contains("O'Brien"));
    assert_eq!(stmt.params()[0], Value::from(hostile));
    assert_eq!(stmt.params()[2], Value::from(hostile));
}

#[test]
fn output_is_deterministic() {
    let fields = UpdateFields::new()
        .with("name", "Acme")
        .with("num_employees", 10)
        .with("description", Value::Null);
    let first = sql_for_partial_update(Table::Companies, &fields, "handle", "acme").unwrap();
    let second = sql_for_partial_update(Table::Companies, &fields, "handle", "acme").unwrap();
    assert_eq!(first, second);
}

#[test]
fn replacing_a_field_keeps_its_position() {
    let mut fields = UpdateFields::new();
    fields.insert("a", 1).insert("b", 2).insert("a", 3);
    let stmt = sql_for_partial_update("t", &fields, "id", 9).unwrap();

    assert_eq!(stmt.sql(), "UPDATE t SET a=$1, b=$2 WHERE id=$3 RETURNING *");
    assert_eq!(stmt.params(), [Value::Int(3), Value::Int(2), Value::Int(9)]);
}

#[test]
fn json_bodies_keep_their_key_order() {
    let body = serde_json::json!({
        "title": "Engineer",
        "_token": "t",
        "salary": 120000.5,
        "equity": 0,
    });
    let fields = UpdateFields::from_json(body).unwrap();
    let stmt = sql_for_partial_update(Table::Jobs, &fields, "id", 4).unwrap();

    assert_eq!(
        stmt.sql(),
        "UPDATE jobs SET title=$1, salary=$2, equity=$3 WHERE id=$4 RETURNING *"
    );
    assert_eq!(stmt.params()[1], Value::Float(120000.5));
    assert_eq!(stmt.params()[2], Value::Int(0));
}

#[test]
fn quoting_does_not_unhide_reserved_fields() {
    let fields = UpdateFields::new()
        .with("first_name", "Jo")
        .with(r#""_token""#, "secret-token");
    let err = sql_for_partial_update("users", &fields, "id", 1).unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(err.to_string().contains("reserved"));
}

#[test]
fn column_names_must_be_identifiers() {
    for bad in ["name = 'x', is_admin", "a b", "1abc", "x;--", ""] {
        let fields = UpdateFields::new().with(bad, 1);
        let err = sql_for_partial_update("users", &fields, "id", 1).unwrap_err();
        assert!(err.is_invalid_argument(), "{bad:?} was accepted");
    }
}
