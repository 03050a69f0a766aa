use regex::Regex;
use std::sync::LazyLock;

static TAGGED_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```python(.*?)```").expect("tagged fence regex"));
static ANY_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").expect("fence regex"));
static LEADING_TICKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^`+").expect("leading ticks regex"));
static TRAILING_TICKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)`+$").expect("trailing ticks regex"));
static CODE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(from|import|class)\b").expect("code start regex"));
static DECLARATION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(from|import|class|def)").expect("declaration regex"));

/// Isolate the most likely source snippet in raw model output.
///
/// Never fails. An empty result means the model produced nothing usable
/// and callers must treat it as a generation failure. The last fallback
/// keeps only declaration lines, which rarely runs; it is left lenient and
/// the renderer reports whatever breaks.
pub fn extract_code(raw: &str) -> String {
    if let Some(block) = longest_capture(&TAGGED_FENCE, raw).or_else(|| longest_capture(&ANY_FENCE, raw)) {
        tracing::debug!(chars = block.len(), "extracted fenced block");
        let code = LEADING_TICKS.replace_all(block.trim(), "");
        return TRAILING_TICKS.replace_all(&code, "").into_owned();
    }

    if let Some(start) = CODE_START.find(raw) {
        tracing::debug!(offset = start.start(), "no fence, using text from first declaration");
        return raw[start.start()..].to_string();
    }

    tracing::debug!("no fence or declaration start, keeping declaration lines only");
    raw.split('\n')
        .filter(|line| DECLARATION_LINE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Longest first capture group by character count. The first one wins a tie.
fn longest_capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    let mut best: Option<(&str, usize)> = None;
    for caps in re.captures_iter(text) {
        let Some(m) = caps.get(1) else { continue };
        let len = m.as_str().chars().count();
        if best.map_or(true, |(_, best_len)| len > best_len) {
            best = Some((m.as_str(), len));
        }
    }
    best.map(|(s, _)| s)
}
