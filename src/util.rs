//! Small utility helpers used across modules.

/// Log-safe truncation for upstream bodies.
/// Cuts on a char boundary; Vietnamese payloads are full of multi-byte characters.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_strings_pass_through() {
    assert_eq!(trunc_for_log("Xin chào", 64), "Xin chào");
  }

  #[test]
  fn cuts_on_char_boundary() {
    // 'à' is two bytes; byte 7 falls inside it.
    let out = trunc_for_log("Xin chào bạn", 7);
    assert_eq!(out, format!("Xin ch… ({} bytes total)", "Xin chào bạn".len()));
  }
}
