//! Scope-value extraction tests.

use dbguard::expr::{extract_scope_values, CompareOp, Expr, Literal, Operand, ENVIRONMENT_FIELD};

fn env_field() -> Operand {
    Operand::Field(ENVIRONMENT_FIELD.to_owned())
}

fn strings(values: &[&str]) -> Operand {
    Operand::Value(Literal::List(
        values
            .iter()
            .map(|v| Literal::String((*v).to_owned()))
            .collect(),
    ))
}

#[test]
fn containment_on_environment_returns_list() {
    let expr = Expr::environment_in(["staging", "prod"]);
    let values = extract_scope_values(&expr);
    assert_eq!(values.iter().collect::<Vec<_>>(), vec!["staging", "prod"]);
    assert!(values.contains("staging"));
    assert!(values.contains("prod"));
    assert!(!values.contains("dev"));
}

#[test]
fn duplicates_are_kept_in_order() {
    let expr = Expr::environment_in(["prod", "dev", "prod"]);
    let values = extract_scope_values(&expr);
    assert_eq!(values.len(), 3);
    assert_eq!(values.into_vec(), vec!["prod", "dev", "prod"]);
}

#[test]
fn empty_list_yields_empty() {
    let expr = Expr::environment_in(Vec::<String>::new());
    assert!(extract_scope_values(&expr).is_empty());
}

#[test]
fn zero_value_expression_yields_empty() {
    assert!(extract_scope_values(&Expr::default()).is_empty());
}

#[test]
fn other_field_yields_empty() {
    let expr = Expr::field_in("resource.database_name", ["orders"]);
    assert!(extract_scope_values(&expr).is_empty());
}

#[test]
fn comparison_on_environment_yields_empty() {
    let expr = Expr::Compare {
        cmp: CompareOp::Eq,
        left: env_field(),
        right: Operand::Value(Literal::String("prod".to_owned())),
    };
    assert!(extract_scope_values(&expr).is_empty());
}

#[test]
fn swapped_operands_yield_empty() {
    let expr = Expr::In {
        left: strings(&["prod"]),
        right: env_field(),
    };
    assert!(extract_scope_values(&expr).is_empty());
}

#[test]
fn non_list_right_operand_yields_empty() {
    let expr = Expr::In {
        left: env_field(),
        right: Operand::Value(Literal::String("prod".to_owned())),
    };
    assert!(extract_scope_values(&expr).is_empty());
}

#[test]
fn field_on_right_yields_empty() {
    let expr = Expr::In {
        left: env_field(),
        right: Operand::Field("request.environments".to_owned()),
    };
    assert!(extract_scope_values(&expr).is_empty());
}

#[test]
fn mixed_list_yields_empty() {
    let expr = Expr::In {
        left: env_field(),
        right: Operand::Value(Literal::List(vec![
            Literal::String("prod".to_owned()),
            Literal::Int(7),
        ])),
    };
    assert!(extract_scope_values(&expr).is_empty());
}

#[test]
fn containment_nested_in_logic_yields_empty() {
    let expr = Expr::And {
        args: vec![Expr::environment_in(["prod"])],
    };
    assert!(extract_scope_values(&expr).is_empty());

    let expr = Expr::Or {
        args: vec![Expr::environment_in(["prod"]), Expr::Empty],
    };
    assert!(extract_scope_values(&expr).is_empty());
}

#[test]
fn parsed_from_toml_condition() {
    let toml_str = r#"
op = "in"
left = { field = "resource.environment_name" }
right = { value = ["test", "prod"] }
"#;
    let expr: Expr = match toml::from_str(toml_str) {
        Ok(expr) => expr,
        Err(err) => panic!("condition should parse: {err}"),
    };
    assert_eq!(
        extract_scope_values(&expr).into_vec(),
        vec!["test".to_owned(), "prod".to_owned()]
    );
}
