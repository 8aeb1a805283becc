//! "Did you mean" hints for unknown options and commands.

const MAX_DISTANCE: usize = 3;
const MIN_SIMILARITY: f64 = 0.4;

/// Returns a hint to append to an error message, or an empty string.
///
/// When `word` is a long flag the leading dashes are ignored while comparing.
pub(crate) fn suggest_similar(word: &str, candidates: &[String]) -> String {
    let mut seen = Vec::new();
    for it in candidates {
        if !seen.contains(&it.as_str()) {
            seen.push(it.as_str());
        }
    }

    let searching_options = word.starts_with("--");
    let strip = |it: &str| {
        if searching_options { it.get(2..).unwrap_or("").to_string() } else { it.to_string() }
    };
    let word = strip(word);

    let mut similar: Vec<String> = Vec::new();
    let mut best = MAX_DISTANCE;
    for candidate in seen.into_iter().map(strip) {
        if candidate.chars().count() <= 1 {
            continue;
        }
        let distance = strsim::osa_distance(&word, &candidate);
        let length = word.chars().count().max(candidate.chars().count());
        let similarity = (length as f64 - distance as f64) / length as f64;
        if similarity <= MIN_SIMILARITY {
            continue;
        }
        if distance < best {
            best = distance;
            similar = vec![candidate];
        } else if distance == best {
            similar.push(candidate);
        }
    }
    similar.sort();
    if searching_options {
        similar = similar.into_iter().map(|it| format!("--{it}")).collect();
    }

    match similar.as_slice() {
        [] => String::new(),
        [one] => format!("\n(Did you mean {one}?)"),
        many => format!("\n(Did you mean one of {}?)", many.join(", ")),
    }
}
