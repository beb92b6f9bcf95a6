use askama_actix::Template;

const PAGINATOR_LOOK_AHEAD: i32 = 2;

/// Number of pages needed for `total` items. An empty listing has zero pages.
pub fn get_page_count(total: usize, per_page: usize) -> usize {
    let per_page = per_page.max(1);
    (total + per_page - 1) / per_page
}

/// Clamps a requested 1-based page number.
///
/// Negative values count from the end, so `-1` is the last page. Pages past the
/// end are kept as-is; listings return nothing for them without querying.
pub fn resolve_page(requested: i64, page_count: usize) -> usize {
    if requested < 0 {
        let from_end = (page_count as i64) + requested + 1;
        from_end.max(1) as usize
    } else {
        requested.max(1) as usize
    }
}

/// [1] 2 3 ... 13
/// 1 2 [3] 4 5 ... 13
/// 1 2 3 4 [5] 6 7 ... 13
/// 1 ... 4 5 [6] 7 8 ... 13
/// 1 ... 7 8 [9] 10 11 12 13
/// 1 ... 9 10 [11] 12 13
/// 1 ... 11 12 [13]
#[derive(Debug)]
pub struct Paginator {
    pub base_url: String,
    pub this_page: i32,
    pub page_count: i32,
}

#[derive(Template)]
#[template(path = "util/paginator.html")]
struct PaginatorTemplate<'a> {
    paginator: &'a Paginator,
}

pub trait PaginatorToHtml {
    fn as_html(&self) -> String;
    fn has_pages(&self) -> bool;
    fn is_current_page(&self, page: &i32) -> bool;
    fn page_url(&self, page: &i32) -> String;
    fn get_first_pages(&self) -> Vec<i32>;
    fn get_inner_pages(&self) -> Vec<i32>;
    fn get_last_pages(&self) -> Vec<i32>;
}

impl Paginator {
    pub fn new<S: Into<String>>(base_url: S, this_page: usize, page_count: usize) -> Self {
        Self {
            base_url: base_url.into(),
            this_page: this_page.min(i32::MAX as usize) as i32,
            page_count: page_count.min(i32::MAX as usize) as i32,
        }
    }

    /// Splits the page numbers into the leading run, the window around the
    /// cursor and the trailing run. Empty groups are not rendered.
    fn groups(&self) -> (Vec<i32>, Vec<i32>, Vec<i32>) {
        let last = self.page_count.max(1);
        let cursor = self.this_page.clamp(1, last);
        let lo = (cursor - PAGINATOR_LOOK_AHEAD).max(1);
        let hi = (cursor + PAGINATOR_LOOK_AHEAD).min(last);

        let (mut first, mut inner) = if lo <= 1 + PAGINATOR_LOOK_AHEAD {
            ((1..=hi).collect::<Vec<i32>>(), Vec::new())
        } else {
            (vec![1], (lo..=hi).collect::<Vec<i32>>())
        };

        let mut trailing = Vec::new();
        if hi >= last - PAGINATOR_LOOK_AHEAD {
            let tail = if inner.is_empty() {
                &mut first
            } else {
                &mut inner
            };
            tail.extend((hi + 1)..=last);
        } else {
            trailing.push(last);
        }

        (first, inner, trailing)
    }
}

impl PaginatorToHtml for Paginator {
    fn has_pages(&self) -> bool {
        self.page_count > 1
    }

    fn is_current_page(&self, page: &i32) -> bool {
        *page == self.this_page
    }

    fn page_url(&self, page: &i32) -> String {
        format!("{}?page={}", self.base_url, page)
    }

    fn get_first_pages(&self) -> Vec<i32> {
        self.groups().0
    }

    fn get_inner_pages(&self) -> Vec<i32> {
        self.groups().1
    }

    fn get_last_pages(&self) -> Vec<i32> {
        self.groups().2
    }

    fn as_html(&self) -> String {
        if self.has_pages() {
            let mut buffer = String::new();
            let template = PaginatorTemplate { paginator: self };
            if template.render_into(&mut buffer).is_err() {
                "[Paginator Util Error]".to_owned()
            } else {
                buffer
            }
        } else {
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(this_page: i32, page_count: i32) -> (Vec<i32>, Vec<i32>, Vec<i32>) {
        let p = Paginator {
            base_url: "/index".to_owned(),
            this_page,
            page_count,
        };
        (p.get_first_pages(), p.get_inner_pages(), p.get_last_pages())
    }

    #[test]
    fn test_paginator_near_start() {
        assert_eq!(groups(1, 13), (vec![1, 2, 3], vec![], vec![13]));
        assert_eq!(groups(3, 13), (vec![1, 2, 3, 4, 5], vec![], vec![13]));
        assert_eq!(groups(5, 13), (vec![1, 2, 3, 4, 5, 6, 7], vec![], vec![13]));
    }

    #[test]
    fn test_paginator_middle() {
        assert_eq!(groups(6, 13), (vec![1], vec![4, 5, 6, 7, 8], vec![13]));
    }

    #[test]
    fn test_paginator_near_end() {
        assert_eq!(
            groups(9, 13),
            (vec![1], vec![7, 8, 9, 10, 11, 12, 13], vec![])
        );
        assert_eq!(groups(11, 13), (vec![1], vec![9, 10, 11, 12, 13], vec![]));
        assert_eq!(groups(13, 13), (vec![1], vec![11, 12, 13], vec![]));
    }

    #[test]
    fn test_paginator_few_pages() {
        assert_eq!(groups(1, 2), (vec![1, 2], vec![], vec![]));
        assert_eq!(groups(2, 5), (vec![1, 2, 3, 4, 5], vec![], vec![]));
    }

    #[test]
    fn test_single_page_renders_nothing() {
        let p = Paginator::new("/index", 1, 1);
        assert!(!p.has_pages());
        assert_eq!(p.as_html(), "");
    }

    #[test]
    fn test_page_url() {
        let p = Paginator::new("/post/4", 2, 3);
        assert_eq!(p.page_url(&3), "/post/4?page=3");
        assert!(p.is_current_page(&2));
    }

    #[test]
    fn test_page_count() {
        assert_eq!(get_page_count(0, 10), 0);
        assert_eq!(get_page_count(1, 10), 1);
        assert_eq!(get_page_count(10, 10), 1);
        assert_eq!(get_page_count(11, 10), 2);
        assert_eq!(get_page_count(5, 0), 5);
    }

    #[test]
    fn test_resolve_page() {
        assert_eq!(resolve_page(1, 4), 1);
        assert_eq!(resolve_page(0, 4), 1);
        assert_eq!(resolve_page(3, 4), 3);
        assert_eq!(resolve_page(9, 4), 9);
        assert_eq!(resolve_page(-1, 4), 4);
        assert_eq!(resolve_page(-2, 4), 3);
        assert_eq!(resolve_page(-1, 0), 1);
        assert_eq!(resolve_page(-10, 4), 1);
    }
}
