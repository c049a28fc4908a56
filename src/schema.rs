use serde_json::Value;

/// Simple type system for model output.
#[derive(Debug, Clone)]
pub enum TypeDef {
    Text,
    Integer,
    /// List whose length must fall in `min..=max`.
    BoundedList {
        item: Box<TypeDef>,
        min: usize,
        max: usize,
    },
    Object(Vec<FieldDef>),
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: TypeDef,
}

/// Single schema violation, with a JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    MissingField {
        path: String,
    },
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    LengthOutOfRange {
        path: String,
        min: usize,
        max: usize,
        found: usize,
    },
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::MissingField { path } => {
                write!(f, "Missing required field at path {path}")
            }
            SchemaError::TypeMismatch {
                path,
                expected,
                found,
            } => {
                write!(f, "Type mismatch at {path}: expected {expected}, found {found}")
            }
            SchemaError::LengthOutOfRange {
                path,
                min,
                max,
                found,
            } => {
                write!(f, "Length of {path} is {found}, expected {min} to {max}")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// Validate a serde_json::Value against a TypeDef.
///
/// Returns Ok(()) if everything matches, or Err(vec![]) with one or more errors.
pub fn validate(ty: &TypeDef, value: &Value) -> Result<(), Vec<SchemaError>> {
    let mut errors = Vec::new();
    validate_inner(ty, value, "$", &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn mismatch(path: &str, expected: &'static str, value: &Value) -> SchemaError {
    SchemaError::TypeMismatch {
        path: path.to_string(),
        expected,
        found: value_type_name(value),
    }
}

fn validate_inner(ty: &TypeDef, value: &Value, path: &str, errors: &mut Vec<SchemaError>) {
    use TypeDef::*;

    match ty {
        Text => {
            if !value.is_string() {
                errors.push(mismatch(path, "string", value));
            }
        }
        Integer => {
            if !value.is_i64() {
                errors.push(mismatch(path, "integer", value));
            }
        }
        BoundedList { item, min, max } => {
            let Some(items) = value.as_array() else {
                errors.push(mismatch(path, "array", value));
                return;
            };

            if items.len() < *min || items.len() > *max {
                errors.push(SchemaError::LengthOutOfRange {
                    path: path.to_string(),
                    min: *min,
                    max: *max,
                    found: items.len(),
                });
            }
            for (idx, element) in items.iter().enumerate() {
                let child_path = format!("{path}[{idx}]");
                validate_inner(item, element, &child_path, errors);
            }
        }
        Object(fields) => {
            let Some(obj) = value.as_object() else {
                errors.push(mismatch(path, "object", value));
                return;
            };

            for field in fields {
                let field_path = format!("{path}.{}", field.name);
                match obj.get(field.name) {
                    None => errors.push(SchemaError::MissingField { path: field_path }),
                    Some(v) => validate_inner(&field.ty, v, &field_path, errors),
                }
            }

            // Extra fields are ignored.
        }
    }
}

fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Human-readable schema description, embedded in prompts.
pub fn describe(ty: &TypeDef, indent: usize) -> String {
    use TypeDef::*;
    let pad = " ".repeat(indent);

    match ty {
        Object(fields) => {
            let mut s = format!("{pad}- object with fields:\n");
            for f in fields {
                s.push_str(&format!("{pad}  - {}: ", f.name));
                match &f.ty {
                    BoundedList { .. } | Object(_) => {
                        s.push_str(&type_name(&f.ty));
                        s.push('\n');
                        s.push_str(&describe_nested(&f.ty, indent + 4));
                    }
                    scalar => {
                        s.push_str(&type_name(scalar));
                        s.push('\n');
                    }
                }
            }
            s
        }
        BoundedList { .. } => {
            format!("{pad}- {}\n{}", type_name(ty), describe_nested(ty, indent + 2))
        }
        scalar => format!("{pad}- {}\n", type_name(scalar)),
    }
}

fn describe_nested(ty: &TypeDef, indent: usize) -> String {
    match ty {
        TypeDef::BoundedList { item, .. } => describe(item, indent),
        TypeDef::Object(_) => describe(ty, indent),
        _ => String::new(),
    }
}

fn type_name(ty: &TypeDef) -> String {
    match ty {
        TypeDef::Text => "string".to_string(),
        TypeDef::Integer => "integer".to_string(),
        TypeDef::BoundedList { min, max, .. } => format!("array of {min} to {max}:"),
        TypeDef::Object(_) => "nested object:".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pair_list() -> TypeDef {
        TypeDef::Object(vec![FieldDef {
            name: "pairs",
            ty: TypeDef::BoundedList {
                item: Box::new(TypeDef::Object(vec![
                    FieldDef {
                        name: "id",
                        ty: TypeDef::Integer,
                    },
                    FieldDef {
                        name: "label",
                        ty: TypeDef::Text,
                    },
                ])),
                min: 1,
                max: 2,
            },
        }])
    }

    #[test]
    fn accepts_matching_value_and_ignores_extra_fields() {
        let value = json!({"pairs": [{"id": 1, "label": "a", "extra": true}], "note": "x"});
        assert!(validate(&pair_list(), &value).is_ok());
    }

    #[test]
    fn collects_every_violation_with_paths() {
        let value = json!({"pairs": [{"id": 1.5}, {"id": 2, "label": 3}, {"id": 3, "label": "c"}]});
        let errors = validate(&pair_list(), &value).unwrap_err();

        assert!(errors.contains(&SchemaError::LengthOutOfRange {
            path: "$.pairs".into(),
            min: 1,
            max: 2,
            found: 3,
        }));
        assert!(errors.contains(&SchemaError::TypeMismatch {
            path: "$.pairs[0].id".into(),
            expected: "integer",
            found: "number",
        }));
        assert!(errors.contains(&SchemaError::MissingField {
            path: "$.pairs[0].label".into(),
        }));
        assert!(errors.contains(&SchemaError::TypeMismatch {
            path: "$.pairs[1].label".into(),
            expected: "string",
            found: "number",
        }));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn rejects_non_object_root() {
        let errors = validate(&pair_list(), &json!([1, 2])).unwrap_err();
        assert_eq!(
            errors[0].to_string(),
            "Type mismatch at $: expected object, found array"
        );
    }

    #[test]
    fn bounded_list_needs_an_array() {
        let errors = validate(&pair_list(), &json!({"pairs": {"id": 1}})).unwrap_err();
        assert_eq!(
            errors,
            vec![SchemaError::TypeMismatch {
                path: "$.pairs".into(),
                expected: "array",
                found: "object",
            }]
        );
    }

    #[test]
    fn description_mentions_bounds_and_fields() {
        let text = describe(&pair_list(), 0);
        assert!(text.contains("pairs: array of 1 to 2:"));
        assert!(text.contains("id: integer"));
        assert!(text.contains("label: string"));
    }
}
