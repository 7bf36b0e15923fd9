use regex::Regex;

#[inline]
pub fn capture_group_1<'a>(re: &Regex, input: &'a str) -> Option<&'a str> {
    re.captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// A non-empty string of ASCII digits.
#[inline]
pub fn is_numeric_id(input: &str) -> bool {
    !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit())
}
