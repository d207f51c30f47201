use similar::TextDiff;

/// Line-level Myers diff of the two rendered streams, formatted as a unified
/// diff with three lines of context. Identical inputs produce an empty
/// string, which is the "no differences" marker for this strategy.
pub fn compute(target: &str, local: &str, target_label: &str, local_label: &str) -> String {
    if target == local {
        return String::new();
    }

    let diff = TextDiff::from_lines(target, local);
    diff.unified_diff()
        .context_radius(3)
        .header(target_label, local_label)
        .to_string()
}
