//! Query parameter construction.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use super::PaginationMetadata;
use super::QuerySpec;

/// Filter value meaning "no constraint".
pub const ALL: &str = "all";

pub const PAGE_PARAM: &str = "_page";
pub const PER_PAGE_PARAM: &str = "_per_page";
pub const SORT_PARAM: &str = "_sort";
pub const START_TIME_PARAM: &str = "startTime";
pub const END_TIME_PARAM: &str = "endTime";

/// Fields the backend cannot match by substring, by default.
pub const DEFAULT_CLIENT_SIDE_FIELDS: [&str; 2] = ["name", "email"];

/// A substring predicate the backend cannot evaluate, applied to the fetched
/// page instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refinement {
    pub field: String,
    pub needle: String,
}

/// Decides which filters go to the server and which are refined locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPolicy {
    client_side: BTreeSet<String>,
}

impl FilterPolicy {
    /// Creates a policy that refines the given fields client-side.
    pub fn new<I, S>(client_side: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client_side: client_side.into_iter().map(Into::into).collect(),
        }
    }

    /// A policy that sends every filter to the server.
    pub fn server_only() -> Self {
        Self {
            client_side: BTreeSet::new(),
        }
    }

    /// Returns `true` if the field is refined client-side.
    pub fn is_client_side(&self, field: &str) -> bool {
        self.client_side.contains(field)
    }
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT_SIDE_FIELDS)
    }
}

/// A normalized parameter set ready for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    page: u32,
    page_size: u32,
    params: BTreeMap<String, String>,
    refinements: Vec<Refinement>,
}

impl QueryParams {
    /// The requested page.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// The requested page size.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Iterates over all parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Filters held back from the server for client-side refinement.
    pub fn refinements(&self) -> &[Refinement] {
        &self.refinements
    }

    /// Encodes the parameters as a URL query string.
    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Builds the parameter set for a spec.
///
/// Pure: the result depends only on the inputs, and the order in which filters
/// were added does not matter.
///
/// - `page`/`page_size` default to `current`, the last server-confirmed state.
/// - Filter values equal to [`ALL`] or blank are dropped.
/// - Filters on client-side fields become [`Refinement`]s.
/// - A date range becomes `startTime`/`endTime` in RFC 3339.
pub fn build(spec: &QuerySpec, current: &PaginationMetadata, policy: &FilterPolicy) -> QueryParams {
    let page = spec.page.unwrap_or(current.current_page);
    let page_size = spec.page_size.unwrap_or(current.page_size);

    let mut params = BTreeMap::new();
    let mut refinements = Vec::new();

    for (field, value) in &spec.filters {
        if value == ALL || value.trim().is_empty() {
            continue;
        }
        if policy.is_client_side(field) {
            refinements.push(Refinement {
                field: field.clone(),
                needle: value.clone(),
            });
        } else {
            params.insert(field.clone(), value.clone());
        }
    }

    if let Some(range) = &spec.date_range {
        params.insert(START_TIME_PARAM.to_string(), range.start.to_rfc3339());
        params.insert(END_TIME_PARAM.to_string(), range.end.to_rfc3339());
    }

    if let Some(sort) = &spec.sort {
        params.insert(SORT_PARAM.to_string(), sort.to_param());
    }

    // Inserted last so a filter can never shadow paging.
    params.insert(PAGE_PARAM.to_string(), page.to_string());
    params.insert(PER_PAGE_PARAM.to_string(), page_size.to_string());

    QueryParams {
        page,
        page_size,
        params,
        refinements,
    }
}
