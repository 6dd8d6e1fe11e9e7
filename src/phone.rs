//! Phone-number normalization (§4.2). Produces a canonical string key used for
//! contact matching only -- the record's stored address always keeps the raw,
//! as-received string.

/// Strips everything except digits and a leading `+`, then collapses the US
/// conventions `+1XXXXXXXXXX` and `1XXXXXXXXXX` down to the bare ten digits.
/// International numbers (no `+1`/`1` + 10-digit prefix) are left with their
/// leading `+` intact.
pub fn normalize(raw: &str) -> String {
    let mut digits = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    if let Some(&first) = chars.peek() {
        if first == '+' {
            digits.push('+');
            chars.next();
        }
    }
    for c in chars {
        if c.is_ascii_digit() {
            digits.push(c);
        }
    }

    if let Some(rest) = digits.strip_prefix("+1") {
        if rest.len() == 10 && rest.bytes().all(|b| b.is_ascii_digit()) {
            return rest.to_owned();
        }
    }
    if let Some(rest) = digits.strip_prefix('1') {
        if !digits.starts_with("+1") && rest.len() == 10 && rest.bytes().all(|b| b.is_ascii_digit()) {
            return rest.to_owned();
        }
    }
    digits
}

#[cfg(test)]
#[path = "phone_tests.rs"]
mod tests;
