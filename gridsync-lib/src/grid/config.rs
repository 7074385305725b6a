//! Grid configuration

use std::time::Duration;

use crate::api::query::FilterPolicy;
use crate::model::Actor;
use crate::validate::Schema;

/// Configuration for a [`GridController`](super::GridController).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use gridsync_lib::GridConfig;
/// use gridsync_lib::validate::Schema;
///
/// let config = GridConfig::default()
///     .with_page_size(25)
///     .with_mutation_timeout(Duration::from_secs(10))
///     .with_schema(Schema::users());
/// ```
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Rows per page until the operator picks another size.
    ///
    /// Default: 10
    pub page_size: u32,

    /// Upper bound on every backend call made by the grid.
    ///
    /// Default: 30 seconds
    pub mutation_timeout: Duration,

    /// Which filters are refined client-side.
    ///
    /// Default: `name` and `email`
    pub filter_policy: FilterPolicy,

    /// Field rules checked before edits and creates.
    ///
    /// Default: no rules
    pub schema: Schema,

    /// Recorded as `createdBy`/`updatedBy` on rows this grid writes.
    ///
    /// Default: none
    pub actor: Option<Actor>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            mutation_timeout: Duration::from_secs(30),
            filter_policy: FilterPolicy::default(),
            schema: Schema::default(),
            actor: None,
        }
    }
}

impl GridConfig {
    /// Creates a grid config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial page size. Zero is treated as one.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets the backend call timeout.
    pub fn with_mutation_timeout(mut self, timeout: Duration) -> Self {
        self.mutation_timeout = timeout;
        self
    }

    /// Sets the client-side filter policy.
    pub fn with_filter_policy(mut self, policy: FilterPolicy) -> Self {
        self.filter_policy = policy;
        self
    }

    /// Sets the validation schema.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Sets the acting user.
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }
}
