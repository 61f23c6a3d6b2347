//! Text helpers for resolution diagnostics.
//!
//! Type names coming from [`std::any::type_name`] are long and noisy
//! (`alloc::sync::Arc<dyn my_app::service::ProductParser>`). These helpers
//! turn them into something a person can read in an error message.

/// Strips module paths from every segment of a type name.
///
/// ```
/// use bindery_support::rendering::short_type_name;
///
/// assert_eq!(short_type_name("shop::service::ProductParser"), "ProductParser");
/// assert_eq!(
///     short_type_name("alloc::sync::Arc<dyn shop::service::ProductParser>"),
///     "Arc<dyn ProductParser>"
/// );
/// ```
pub fn short_type_name(full_name: &str) -> String {
    let mut out = String::with_capacity(full_name.len());
    let mut segment = String::new();
    let mut chars = full_name.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                segment.clear();
            }
            '<' | '>' | ',' | ' ' | '(' | ')' | '&' | '[' | ']' | ';' => {
                out.push_str(&segment);
                out.push(ch);
                segment.clear();
            }
            _ => segment.push(ch),
        }
    }

    out.push_str(&segment);
    out
}

/// Joins a resolution path with arrows.
///
/// ```
/// use bindery_support::rendering::render_path;
///
/// assert_eq!(render_path(&["A", "B", "A"]), "A → B → A");
/// ```
pub fn render_path(path: &[impl AsRef<str>]) -> String {
    path.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Levenshtein distance between two strings, counted in chars.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Picks the registered names closest to `requested`.
///
/// Names are compared by their short form, case-insensitively. A candidate
/// qualifies when one short name contains the other, or when the edit
/// distance is within a third of the requested name's length (at least 2).
/// Results are ordered best first and capped at `limit`.
///
/// ```
/// use bindery_support::rendering::closest_matches;
///
/// let known = ["shop::ProductParser", "shop::FileReader"];
/// assert_eq!(closest_matches("shop::ProductParsr", &known, 3), vec!["shop::ProductParser"]);
/// ```
pub fn closest_matches(requested: &str, candidates: &[&str], limit: usize) -> Vec<String> {
    let wanted = short_type_name(requested).to_lowercase();
    let threshold = (wanted.chars().count() / 3).max(2);

    let mut scored: Vec<(usize, &str)> = candidates
        .iter()
        .filter_map(|&candidate| {
            let short = short_type_name(candidate).to_lowercase();
            if short == wanted {
                return None;
            }
            if short.contains(&wanted) || wanted.contains(&short) {
                return Some((0, candidate));
            }
            let distance = edit_distance(&wanted, &short);
            (distance <= threshold).then_some((distance, candidate))
        })
        .collect();

    scored.sort();
    scored
        .into_iter()
        .take(limit)
        .map(|(_, name)| name.to_string())
        .collect()
}
