use serde::{Deserialize, Serialize};

/// Which set of query keys expressed the pagination intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `page` (zero-indexed) and `size`
    Offset,
    /// `_page` (one-indexed) and `_limit`
    Legacy,
}

/// Pagination resolved from one request, normalized to a zero-indexed page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub dialect: Dialect,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: i64,
    pub size: i64,
    pub total_items: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl PageParams {
    /// Resolve pagination from a raw query string.
    ///
    /// The offset dialect wins as soon as `page` or `size` appears, even with
    /// an empty value; otherwise the legacy `_page`/`_limit` pair applies.
    /// Unparseable values fall back to defaults. A page size below 1 is
    /// clamped to 1; a negative page is kept and later yields an empty slice.
    pub fn from_query(query: &str, default_size: i64) -> Self {
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();

        let (dialect, page, per_page) = if first(&pairs, "page").is_some() || first(&pairs, "size").is_some() {
            let page = first(&pairs, "page").and_then(parse_leading_int).unwrap_or(0);
            let size = first(&pairs, "size").and_then(parse_leading_int).unwrap_or(default_size);
            (Dialect::Offset, page, size)
        } else {
            let one_based = first(&pairs, "_page").and_then(parse_leading_int).unwrap_or(1);
            let limit = first(&pairs, "_limit").and_then(parse_leading_int).unwrap_or(default_size);
            (Dialect::Legacy, one_based.saturating_sub(1), limit)
        };

        Self {
            dialect,
            page,
            per_page: per_page.max(1),
        }
    }
}

/// Slice one page out of the full sequence.
///
/// `total_items` counts the sequence before slicing; a page past either end
/// (including any negative page) yields an empty slice rather than an error.
pub fn paginate<T>(items: Vec<T>, params: PageParams) -> Page<T> {
    let total_items = items.len();
    let per_page = usize::try_from(params.per_page.max(1)).unwrap_or(usize::MAX);
    let total_pages = total_items.div_ceil(per_page);

    let items = match usize::try_from(params.page) {
        Ok(page) => {
            let start = page.saturating_mul(per_page);
            let end = start.saturating_add(per_page).min(total_items);
            if start >= total_items {
                Vec::new()
            } else {
                items.into_iter().skip(start).take(end - start).collect()
            }
        }
        Err(_) => Vec::new(),
    };

    Page {
        items,
        meta: PageMeta {
            page: params.page,
            size: params.per_page,
            total_items,
            total_pages,
        },
    }
}

fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// Lenient integer parsing: leading whitespace, optional sign, then the
/// leading run of digits; anything after is ignored ("10abc" -> 10,
/// "3.9" -> 3). No digits at all is a parse failure.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let run: &str = {
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        &digits[..end]
    };
    if run.is_empty() {
        return None;
    }

    // Saturate instead of failing on absurdly long digit runs
    let magnitude = run.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}
