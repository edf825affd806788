//! Equality queries over records of one class.

use crate::encoding;
use crate::storage_traits::{JsonMap, StorageResult};
use crate::value::Value;

/// One `field == value` constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub field: String,
    pub value: Value,
}

/// Query for records of a class matching every equality constraint.
///
/// ```ignore
/// let query = Query::new("Author").where_equal_to("name", "Jo");
/// let jo = session.first(&query).await?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    class_name: String,
    constraints: Vec<Constraint>,
    limit: Option<usize>,
}

impl Query {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            constraints: Vec::new(),
            limit: None,
        }
    }

    /// Add an equality constraint on `field`.
    pub fn where_equal_to(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints.push(Constraint {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Limit the number of returned records.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    /// Constraints with their values in wire form.
    pub fn encoded_constraints(&self) -> StorageResult<Vec<(String, serde_json::Value)>> {
        self.constraints
            .iter()
            .map(|c| Ok((c.field.clone(), encoding::encode_value(&c.value)?)))
            .collect()
    }

    /// Whether an encoded payload satisfies every constraint.
    ///
    /// A missing field matches a `null` constraint.
    pub fn matches(&self, class_name: &str, fields: &JsonMap) -> StorageResult<bool> {
        if class_name != self.class_name {
            return Ok(false);
        }
        for (field, expected) in self.encoded_constraints()? {
            let actual = fields.get(&field).unwrap_or(&serde_json::Value::Null);
            if *actual != expected {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
