//! Python emission helpers
//!
//! Small, pure text builders for the pieces of a generated model class.
//! Helpers that embed a qualified type record it alongside the text so the
//! import block can be assembled from metadata.

use crate::codegen::imports::QualifiedName;
use crate::meta::DataType;

/// Convert a column type to a Python type hint plus the names it relies on
pub fn python_type(data_type: &DataType, is_nullable: bool) -> (String, Vec<QualifiedName>) {
    let mut uses = Vec::new();

    let base_type = match data_type {
        DataType::SmallInt | DataType::Integer | DataType::BigInt => "int".to_string(),
        DataType::Boolean => "bool".to_string(),
        DataType::Text | DataType::Varchar(_) | DataType::Char(_) => "str".to_string(),
        DataType::Real | DataType::DoublePrecision => "float".to_string(),
        DataType::Numeric => {
            uses.push(QualifiedName::new("decimal.Decimal"));
            "Decimal".to_string()
        }
        DataType::Timestamp | DataType::TimestampTz => {
            uses.push(QualifiedName::new("datetime.datetime"));
            "datetime".to_string()
        }
        DataType::Date => {
            uses.push(QualifiedName::new("datetime.date"));
            "date".to_string()
        }
        DataType::Time | DataType::TimeTz => {
            uses.push(QualifiedName::new("datetime.time"));
            "time".to_string()
        }
        DataType::Uuid => {
            uses.push(QualifiedName::new("uuid.UUID"));
            "UUID".to_string()
        }
        DataType::Json | DataType::JsonBinary => {
            uses.push(QualifiedName::new("typing.Any"));
            "dict[str, Any]".to_string()
        }
        DataType::Binary => "bytes".to_string(),
        DataType::Array(inner) => {
            let (inner_type, inner_uses) = python_type(inner, false);
            uses.extend(inner_uses);
            format!("list[{}]", inner_type)
        }
        // Database-defined types degrade to their textual representation.
        DataType::Enum(_) => "str".to_string(),
    };

    let hint = if is_nullable {
        format!("{} | None", base_type)
    } else {
        base_type
    };

    (hint, uses)
}

/// Quote a string literal, escaping backslashes and double quotes
pub fn str_lit(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

pub fn bool_lit(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// One class-level assignment, e.g. `TABLE = "staff"`
pub fn assign(name: &str, value: &str) -> String {
    format!("\t{} = {}", name, value)
}

/// A list literal of string items
pub fn list_lit(items: &[String]) -> String {
    let items: Vec<String> = items.iter().map(|i| str_lit(i)).collect();
    format!("[{}]", items.join(", "))
}

/// A multi-line dict literal of string keys and values
pub fn dict_lit(entries: impl Iterator<Item = (String, String)>) -> String {
    let mut out = String::from("{\n");
    for (key, value) in entries {
        out.push_str(&format!("\t\t{}: {},\n", str_lit(&key), str_lit(&value)));
    }
    out.push_str("\t}");
    out
}

/// One docstring property line
pub fn ivar(name: &str, hint: &str) -> String {
    format!("\t:ivar {}: {}", name, hint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_type_simple() {
        assert_eq!(python_type(&DataType::Integer, false).0, "int");
        assert_eq!(python_type(&DataType::Text, false).0, "str");
        assert_eq!(python_type(&DataType::Boolean, false).0, "bool");
    }

    #[test]
    fn test_python_type_nullable() {
        assert_eq!(python_type(&DataType::Integer, true).0, "int | None");
    }

    #[test]
    fn test_python_type_records_uses() {
        let (hint, uses) = python_type(&DataType::Uuid, false);
        assert_eq!(hint, "UUID");
        assert_eq!(uses, vec![QualifiedName::new("uuid.UUID")]);

        let (hint, uses) = python_type(&DataType::Numeric, true);
        assert_eq!(hint, "Decimal | None");
        assert_eq!(uses, vec![QualifiedName::new("decimal.Decimal")]);
    }

    #[test]
    fn test_python_type_array() {
        let (hint, uses) = python_type(&DataType::Array(Box::new(DataType::Timestamp)), false);
        assert_eq!(hint, "list[datetime]");
        assert_eq!(uses, vec![QualifiedName::new("datetime.datetime")]);
    }

    #[test]
    fn test_python_type_enum_degrades_to_str() {
        assert_eq!(
            python_type(&DataType::Enum("order_status".to_string()), false).0,
            "str"
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(str_lit("users"), "\"users\"");
        assert_eq!(str_lit("a\"b"), "\"a\\\"b\"");
        assert_eq!(bool_lit(false), "False");
        assert_eq!(
            list_lit(&["a".to_string(), "b".to_string()]),
            "[\"a\", \"b\"]"
        );
    }

    #[test]
    fn test_dict_lit() {
        let entries = vec![("price".to_string(), "float".to_string())].into_iter();
        assert_eq!(dict_lit(entries), "{\n\t\t\"price\": \"float\",\n\t}");
    }
}
