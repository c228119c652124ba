use crate::Query;

/// One page of results together with the size of the whole result.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// 1-based.
    pub index: u64,
    pub last_index: u64,
    pub size: u64,
    pub first_result_index: u64,
    pub max_result_size: Option<u64>,
    pub total_size: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(query: &Query, total_size: u64, items: Vec<T>) -> Self {
        let size = query
            .page_size
            .or(query.max_result_size)
            .unwrap_or(total_size);
        let last_index = if size == 0 {
            1
        } else {
            total_size.div_ceil(size).max(1)
        };
        Self {
            index: query.page_index.unwrap_or(1).max(1),
            last_index,
            size,
            first_result_index: query.first_result_index.unwrap_or(0),
            max_result_size: query.max_result_size,
            total_size,
            items,
        }
    }

    pub fn is_last(&self) -> bool {
        self.index >= self.last_index
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            index: self.index,
            last_index: self.last_index,
            size: self.size,
            first_result_index: self.first_result_index,
            max_result_size: self.max_result_size,
            total_size: self.total_size,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_index() {
        let query = Query::new().page(2, 10);
        assert_eq!(Page::new(&query, 0, Vec::<()>::new()).last_index, 1);
        assert_eq!(Page::new(&query, 10, Vec::<()>::new()).last_index, 1);
        assert_eq!(Page::new(&query, 11, Vec::<()>::new()).last_index, 2);
        let page = Page::new(&query, 35, vec![1, 2]);
        assert_eq!(page.last_index, 4);
        assert_eq!(page.index, 2);
        assert!(!page.is_last());
    }
}
