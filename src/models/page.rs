use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::job::{Job, JobHistory};
use super::user::User;

/// Paginated envelope shared by the scheduler service and the user list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[aliases(UserPage = Page<User>, JobPage = Page<Job>, JobHistoryPage = Page<JobHistory>)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Cuts page `page` (1-based) out of `items`. Out-of-range pages are empty.
    pub fn paginate(items: Vec<T>, page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total = items.len() as u64;
        let total_pages = total.div_ceil(page_size as u64) as u32;
        let skip = (page as usize - 1).saturating_mul(page_size as usize);

        let items = items.into_iter().skip(skip).take(page_size as usize).collect();

        Self {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_reports_totals() {
        let page = Page::paginate((1..=45).collect::<Vec<_>>(), 3, 20);
        assert_eq!(page.items, (41..=45).collect::<Vec<_>>());
        assert_eq!(page.total, 45);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = Page::paginate(vec![1, 2, 3], 5, 2);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn zero_inputs_are_clamped() {
        let page = Page::paginate(vec!["a", "b"], 0, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 1);
        assert_eq!(page.items, vec!["a"]);
    }
}
