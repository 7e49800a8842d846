//! `d` namespace: property data types.
//!
//! The data type catalog is referenced, never extended, by custom models.
//! Every custom property's `dataType` must resolve here.

use crate::model::uris::*;
use crate::model::{DataType, Namespace, NamespaceModule, ValueCheck};

/// Returns the `d` namespace module.
#[must_use]
pub fn module() -> NamespaceModule {
    NamespaceModule {
        namespace: Namespace {
            prefix: "d",
            uri: NS_D,
            label: "Dictionary",
            comment: "Primitive data types available to property definitions.",
        },
        classes: Vec::new(),
        data_types: data_types(),
    }
}

fn data_types() -> Vec<DataType> {
    vec![
        DataType { name: "any", label: "Any", check: ValueCheck::Any },
        DataType { name: "text", label: "Text", check: ValueCheck::Any },
        DataType { name: "mltext", label: "Multilingual text", check: ValueCheck::Any },
        DataType { name: "content", label: "Content", check: ValueCheck::Any },
        DataType { name: "int", label: "Integer", check: ValueCheck::Integer },
        DataType { name: "long", label: "Long", check: ValueCheck::Integer },
        DataType { name: "float", label: "Float", check: ValueCheck::Float },
        DataType { name: "double", label: "Double", check: ValueCheck::Float },
        DataType { name: "date", label: "Date", check: ValueCheck::Date },
        DataType { name: "datetime", label: "Date and time", check: ValueCheck::DateTime },
        DataType { name: "boolean", label: "Boolean", check: ValueCheck::Boolean },
        DataType { name: "qname", label: "Qualified name", check: ValueCheck::Any },
        DataType { name: "noderef", label: "Node reference", check: ValueCheck::Any },
        DataType { name: "category", label: "Category", check: ValueCheck::Any },
        DataType { name: "locale", label: "Locale", check: ValueCheck::Any },
    ]
}
