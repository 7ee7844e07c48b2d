//! Compiled query specifications.
//!
//! A [`QuerySpecification`] pairs the generated [`IndexDefinition`] with the
//! compiled [`RangeSpec`]. Producing one never touches the store, and equal
//! chains always produce equal specifications, so a specification can be
//! inspected, logged or compared in tests before anything runs.

use serde::Serialize;
use serde_json::Value;

use crate::field::FieldSequence;
use crate::grammar::ConstraintChain;
use crate::index::IndexDefinition;
use crate::range::RangeSpec;
use crate::traits::ScanRequest;

/// Everything needed to run one range query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySpecification {
    /// Entity type name.
    pub entity: String,
    /// The view to scan.
    pub index: IndexDefinition,
    /// Key range within the view.
    pub range: RangeSpec,
    /// Rows to skip.
    pub skip: u64,
    /// Maximum rows to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl QuerySpecification {
    /// Compile a constraint chain.
    pub fn compile(
        entity: &str,
        discriminator: &str,
        index_prefix: &str,
        chain: &ConstraintChain,
    ) -> Self {
        let constraints = chain.constraints();
        Self {
            entity: entity.to_string(),
            index: IndexDefinition::generate(index_prefix, discriminator, &chain.fields()),
            range: RangeSpec::compile(&constraints),
            skip: 0,
            limit: None,
        }
    }

    /// Skip the first `n` matching rows.
    pub fn skip(mut self, n: u64) -> Self {
        self.skip = n;
        self
    }

    /// Return at most `n` rows.
    pub fn take(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Key columns, in order.
    pub fn fields(&self) -> &FieldSequence {
        &self.index.fields
    }

    /// The store request for this specification.
    pub fn scan_request(&self) -> ScanRequest {
        ScanRequest {
            discriminator: self.index.discriminator.clone(),
            index_name: self.index.name.clone(),
            range: self.range.clone(),
            skip: self.skip,
            limit: self.limit,
        }
    }

    /// JSON form, for diagnostics.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
