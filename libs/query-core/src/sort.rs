use std::fmt;

use crate::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A validated `field:order` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    /// Parse `field:order` against `allowed_fields`.
    ///
    /// Only the outer whitespace is trimmed. The order token is case-sensitive.
    pub fn parse(raw: &str, allowed_fields: &[&str]) -> Result<Self, Error> {
        let trimmed = raw.trim();
        let parts: Vec<&str> = trimmed.split(':').collect();
        let (field, order) = match parts.as_slice() {
            [field, order] if !field.is_empty() && !order.is_empty() => (*field, *order),
            _ => return Err(Error::MalformedSort(raw.to_string())),
        };

        if !allowed_fields.contains(&field) {
            let mut supported: Vec<&str> = allowed_fields.to_vec();
            supported.sort_unstable();
            return Err(Error::UnsupportedSortField {
                field: field.to_string(),
                supported: supported.join(", "),
            });
        }

        let order = match order {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            other => return Err(Error::UnsupportedSortOrder(other.to_string())),
        };

        Ok(Self::new(field, order))
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.order.as_str())
    }
}

/// Parse the requested sort, or `default_sort` when none was supplied.
///
/// A present but malformed value is an error; it never falls back to the
/// default.
pub fn parse_sort(
    requested: Option<&str>,
    default_sort: &str,
    allowed_fields: &[&str],
) -> Result<SortSpec, Error> {
    match requested {
        Some(raw) => SortSpec::parse(raw, allowed_fields),
        None => SortSpec::parse(default_sort, allowed_fields),
    }
}
