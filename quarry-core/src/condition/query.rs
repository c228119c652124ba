use crate::{BoolOperator, Filter, Filters, QuarryError, Result};

/// Sort entry, `field` may list several comma separated fields sharing the
/// direction, each one optionally overriding it with an `asc`/`desc` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }

    /// Single fields with their effective direction.
    pub fn expand(&self) -> impl Iterator<Item = (&str, bool)> {
        self.field
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| {
                let mut parts = v.rsplitn(2, char::is_whitespace);
                let last = parts.next().unwrap_or_default();
                match parts.next().map(str::trim_end) {
                    Some(field) if last.eq_ignore_ascii_case("asc") => (field, true),
                    Some(field) if last.eq_ignore_ascii_case("desc") => (field, false),
                    _ => (v, self.ascending),
                }
            })
    }
}

/// Row locking request.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lock {
    /// Milliseconds to wait: `None` waits indefinitely, `Some(0)` does not wait.
    pub timeout: Option<i64>,
    /// Read uncommitted hint instead of row locking.
    pub with_no_lock: bool,
}

impl Lock {
    pub fn wait() -> Self {
        Self::default()
    }

    pub fn no_wait() -> Self {
        Self {
            timeout: Some(0),
            with_no_lock: false,
        }
    }

    /// Negative values mean indefinite wait.
    pub fn timeout(millis: i64) -> Self {
        Self {
            timeout: (millis >= 0).then_some(millis),
            with_no_lock: false,
        }
    }

    pub fn no_lock() -> Self {
        Self {
            timeout: None,
            with_no_lock: true,
        }
    }
}

/// Zero based row window selected by the paging fields of a [`Query`].
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: Option<u64>,
}

impl Window {
    /// One past the last row, when bounded.
    pub fn end(&self) -> Option<u64> {
        self.limit.map(|v| self.offset.saturating_add(v))
    }
}

/// Filters plus projection, grouping, ordering, paging and locking.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Query {
    pub filters: Filters,
    /// 1-based, meaningful together with `page_size`.
    pub page_index: Option<u64>,
    pub page_size: Option<u64>,
    /// 0-based offset, added to the page offset.
    pub first_result_index: Option<u64>,
    pub max_result_size: Option<u64>,
    pub select: Vec<String>,
    pub unselect: Vec<String>,
    /// Additional relation fields on top of the default projection.
    pub extselect: Vec<String>,
    pub group: Vec<String>,
    pub order: Vec<Order>,
    pub lock: Option<Lock>,
}

fn strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Vec<String> {
    values.into_iter().map(Into::into).collect()
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn or() -> Self {
        Self {
            filters: Filters {
                operator: BoolOperator::Or,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.filters.push(filter);
        self
    }

    pub fn nest(mut self, filters: Filters) -> Self {
        self.filters.nested.push(filters);
        self
    }

    pub fn page(mut self, index: u64, size: u64) -> Self {
        self.page_index = Some(index);
        self.page_size = Some(size);
        self
    }

    pub fn fragment(mut self, first_result_index: u64, max_result_size: u64) -> Self {
        self.first_result_index = Some(first_result_index);
        self.max_result_size = Some(max_result_size);
        self
    }

    pub fn select<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.select = strings(fields);
        self
    }

    pub fn unselect<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.unselect = strings(fields);
        self
    }

    pub fn extselect<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.extselect = strings(fields);
        self
    }

    pub fn group<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.group = strings(fields);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    pub fn lock(mut self, lock: Lock) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Rows selected by the paging fields, `None` when the query is not paged.
    ///
    /// ```rust
    /// use quarry_core::{Query, Window};
    /// let window = Query::new().page(2, 10).window().unwrap();
    /// assert_eq!(window, Some(Window { offset: 10, limit: Some(10) }));
    /// ```
    pub fn window(&self) -> Result<Option<Window>> {
        let page_offset = match (self.page_index, self.page_size) {
            (index, Some(size)) => index.unwrap_or(1).max(1).saturating_sub(1).checked_mul(size),
            _ => Some(0),
        };
        let limit = match (self.page_size, self.max_result_size) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let Some(offset) = page_offset
            .and_then(|v| v.checked_add(self.first_result_index.unwrap_or(0)))
            .filter(|v| v.checked_add(limit.unwrap_or(0)).is_some())
        else {
            return Err(QuarryError::validation(format!(
                "Page {} of size {} starting from row {} is out of range",
                self.page_index.unwrap_or(1),
                self.page_size.unwrap_or(0),
                self.first_result_index.unwrap_or(0),
            )));
        };
        if offset == 0 && limit.is_none() {
            return Ok(None);
        }
        Ok(Some(Window { offset, limit }))
    }

    /// Same query without paging, ordering and locking, as used for counting.
    pub fn unpaged(&self) -> Query {
        Query {
            page_index: None,
            page_size: None,
            first_result_index: None,
            max_result_size: None,
            order: Vec::new(),
            lock: None,
            ..self.clone()
        }
    }
}

impl From<Filters> for Query {
    fn from(filters: Filters) -> Self {
        Query {
            filters,
            ..Default::default()
        }
    }
}

impl From<Filter> for Query {
    fn from(filter: Filter) -> Self {
        Query::new().filter(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_combines_page_and_fragment() {
        assert_eq!(Query::new().window().unwrap(), None);
        assert_eq!(
            Query::new().page(1, 20).window().unwrap(),
            Some(Window {
                offset: 0,
                limit: Some(20)
            })
        );
        assert_eq!(
            Query::new().page(3, 10).fragment(5, 4).window().unwrap(),
            Some(Window {
                offset: 25,
                limit: Some(4)
            })
        );
        let query = Query {
            first_result_index: Some(7),
            ..Default::default()
        };
        assert_eq!(
            query.window().unwrap(),
            Some(Window {
                offset: 7,
                limit: None
            })
        );
    }

    #[test]
    fn window_out_of_range() {
        assert!(Query::new().page(u64::MAX / 2, 10).window().is_err());
        let query = Query {
            first_result_index: Some(u64::MAX),
            ..Query::new().page(2, 10)
        };
        assert!(query.window().is_err());
        assert_eq!(
            Query::new().page(u64::MAX, 1).window().unwrap(),
            Some(Window {
                offset: u64::MAX - 1,
                limit: Some(1)
            })
        );
    }

    #[test]
    fn order_shorthand() {
        let order = Order::desc("last_name, first_name asc,age");
        assert_eq!(
            order.expand().collect::<Vec<_>>(),
            vec![("last_name", false), ("first_name", true), ("age", false)]
        );
    }

    #[test]
    fn negative_timeout_waits() {
        assert_eq!(Lock::timeout(-1), Lock::wait());
        assert_eq!(Lock::timeout(0), Lock::no_wait());
    }
}
