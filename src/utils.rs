use once_cell::sync::Lazy;
use regex::Regex;

// Scheme plus authority, e.g. "https://fonts.googleapis.com"
static ORIGIN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-zA-Z][a-zA-Z0-9+.\-]*://[^/?#]+)").unwrap());

/// Return the origin prefix of an absolute URL, or `None` for relative
/// locators and protocol-relative ones.
pub fn origin_of(url: &str) -> Option<&str> {
    ORIGIN_REGEX
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// A path such as `/style.css` (but not `//cdn.example/x`).
#[inline]
pub fn is_site_relative(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//")
}

/// Whether `url` belongs to `origin`. Site-relative locators always do.
pub fn is_same_origin(url: &str, origin: &str) -> bool {
    if is_site_relative(url) {
        return true;
    }
    origin_of(url).is_some_and(|o| o.eq_ignore_ascii_case(origin))
}

/// Whether the origin of `url` is listed in `trusted`.
pub fn is_trusted_origin(url: &str, trusted: &[String]) -> bool {
    match origin_of(url) {
        Some(o) => trusted.iter().any(|t| t.eq_ignore_ascii_case(o)),
        None => false,
    }
}

/// Normalise a resource locator into the key used inside a cache store.
///
/// Same-origin URLs are keyed by path and query so that manifest entries
/// (`/index.html`) and intercepted requests (`https://site/index.html`)
/// meet on the same key. Everything else keeps its full text. Fragments
/// never reach the network and are dropped.
///
/// # Examples
/// ```
/// use portfolio_shell::utils::cache_key;
/// assert_eq!(cache_key("https://me.dev/a.css#x", "https://me.dev"), "/a.css");
/// assert_eq!(cache_key("https://me.dev", "https://me.dev"), "/");
/// assert_eq!(cache_key("/a.css", "https://me.dev"), "/a.css");
/// ```
pub fn cache_key(url: &str, origin: &str) -> String {
    let url = url.split('#').next().unwrap_or(url);
    if is_site_relative(url) {
        return url.to_string();
    }
    match origin_of(url) {
        Some(o) if o.eq_ignore_ascii_case(origin) => {
            let rest = &url[o.len()..];
            if rest.is_empty() {
                "/".to_string()
            } else if rest.starts_with('/') {
                rest.to_string()
            } else {
                format!("/{}", rest)
            }
        }
        _ => url.to_string(),
    }
}

/// Group digits in threes, the way the visit badge displays totals.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Count-up animation for the stats strip.
///
/// Each tick advances by `range / (duration / tick)`; the last frame always
/// shows the exact target.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterAnimation {
    current: f64,
    target: i64,
    increment: f64,
    finished: bool,
}

impl CounterAnimation {
    pub fn new(start: i64, target: i64, duration_ms: u32, tick_ms: u32) -> Self {
        let steps = (duration_ms as f64 / tick_ms.max(1) as f64).max(1.0);
        Self {
            current: start as f64,
            target,
            increment: (target - start) as f64 / steps,
            finished: start == target,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance one tick and return the value to display, or `None` once
    /// the target has been shown.
    pub fn tick(&mut self) -> Option<i64> {
        if self.finished {
            return None;
        }
        self.current += self.increment;
        let reached = (self.increment > 0.0 && self.current >= self.target as f64)
            || (self.increment < 0.0 && self.current <= self.target as f64);
        if reached {
            self.finished = true;
            Some(self.target)
        } else {
            Some(self.current.floor() as i64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_extraction() {
        assert_eq!(
            origin_of("https://fonts.googleapis.com/css2?family=x"),
            Some("https://fonts.googleapis.com")
        );
        assert_eq!(origin_of("http://localhost:8080"), Some("http://localhost:8080"));
        assert_eq!(origin_of("/index.html"), None);
        assert_eq!(origin_of("//cdn.example.com/x.js"), None);
    }

    #[test]
    fn same_origin_checks() {
        let origin = "https://me.dev";
        assert!(is_same_origin("/a.css", origin));
        assert!(is_same_origin("https://ME.dev/a.css", origin));
        assert!(!is_same_origin("https://me.dev.evil.com/a.css", origin));
        assert!(!is_same_origin("//cdn.example.com/x.js", origin));
    }

    #[test]
    fn trusted_origin_requires_exact_origin() {
        let trusted = vec!["https://cdnjs.cloudflare.com".to_string()];
        assert!(is_trusted_origin(
            "https://cdnjs.cloudflare.com/ajax/libs/x.css",
            &trusted
        ));
        assert!(!is_trusted_origin(
            "https://evil.com/?u=cdnjs.cloudflare.com",
            &trusted
        ));
    }

    #[test]
    fn keys_keep_query_and_cross_origin_text() {
        let origin = "https://me.dev";
        assert_eq!(cache_key("https://me.dev/?v=2", origin), "/?v=2");
        assert_eq!(cache_key("https://me.dev?v=2", origin), "/?v=2");
        assert_eq!(
            cache_key("https://fonts.googleapis.com/css2?f=a", origin),
            "https://fonts.googleapis.com/css2?f=a"
        );
    }

    #[test]
    fn count_formatting() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn counter_ends_exactly_on_target() {
        let mut counter = CounterAnimation::new(0, 42, 2000, 16);
        let mut last = None;
        let mut frames = 0;
        while let Some(value) = counter.tick() {
            last = Some(value);
            frames += 1;
            assert!(frames <= 200, "counter never finished");
        }
        assert_eq!(last, Some(42));
        assert!(counter.is_finished());
    }

    #[test]
    fn finished_counter_stays_silent() {
        let mut counter = CounterAnimation::new(0, 3, 32, 16);
        assert_eq!(counter.tick(), Some(1));
        assert_eq!(counter.tick(), Some(3));
        for _ in 0..10 {
            assert_eq!(counter.tick(), None);
        }
    }

    #[test]
    fn counter_counts_down() {
        let mut counter = CounterAnimation::new(10, 0, 160, 16);
        let values: Vec<i64> = std::iter::from_fn(|| counter.tick()).collect();
        assert_eq!(values.last(), Some(&0));
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn counter_without_range_is_a_no_op() {
        let mut counter = CounterAnimation::new(7, 7, 2000, 16);
        assert!(counter.is_finished());
        assert_eq!(counter.tick(), None);
    }
}
