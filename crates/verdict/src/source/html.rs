//! Small string-level HTML helpers for rendered review pages.
//!
//! Elements are located by tag name plus one attribute. Tag and attribute
//! names match case-insensitively; nesting of the same tag is tracked so a
//! `div` inside a `div` does not close the outer one early.

const VOID_ELEMENTS: [&str; 8] = ["br", "img", "input", "meta", "link", "hr", "source", "wbr"];

/// `<tag attr="value">` matcher
#[derive(Debug, Clone, Copy)]
pub struct Selector<'a> {
  tag: &'a str,
  attr: &'a str,
  value: &'a str,
  /// Match one whitespace-separated word of the attribute instead of all of it
  word: bool,
}

impl<'a> Selector<'a> {
  /// Exact `data-hook` match, e.g. `div[data-hook=review]`
  pub fn hook(tag: &'a str, value: &'a str) -> Self {
    Self { tag, attr: "data-hook", value, word: false }
  }

  /// Any element carrying `class_name` among its classes; `tag` may be `*`
  pub fn class(tag: &'a str, class_name: &'a str) -> Self {
    Self { tag, attr: "class", value: class_name, word: true }
  }

  fn matches(&self, open_tag: &str) -> bool {
    attribute(open_tag, self.attr).is_some_and(|value| {
      if self.word {
        value.split_whitespace().any(|w| w == self.value)
      } else {
        value == self.value
      }
    })
  }
}

/// Outer HTML of every element matching `selector`, in document order.
/// Elements nested inside an earlier match are not reported separately.
pub fn select<'h>(html: &'h str, selector: &Selector) -> Vec<&'h str> {
  let lc = html.to_ascii_lowercase();
  let mut found = Vec::new();
  let mut from = 0;

  while let Some((start, name)) = next_open_tag(&lc, from, selector.tag) {
    let Some(open_end) = lc[start..].find('>').map(|i| start + i + 1) else {
      break;
    };
    let open_tag = &html[start..open_end];

    if !selector.matches(open_tag) {
      from = open_end;
      continue;
    }

    match element_end(&lc, &name, open_tag, open_end) {
      Some(end) => {
        found.push(&html[start..end]);
        from = end;
      }
      None => from = open_end,
    }
  }

  found
}

pub fn select_first<'h>(html: &'h str, selector: &Selector) -> Option<&'h str> {
  select(html, selector).into_iter().next()
}

/// Text content of an element: tags removed, `<br>` as newline, entities
/// decoded, surrounding whitespace trimmed
pub fn text_of(element: &str) -> String {
  let mut out = String::with_capacity(element.len());
  let mut chars = element.char_indices();

  while let Some((i, c)) = chars.next() {
    if c != '<' {
      out.push(c);
      continue;
    }
    let rest = &element[i + 1..];
    let name: String = rest
      .trim_start_matches('/')
      .chars()
      .take_while(|c| c.is_ascii_alphanumeric())
      .collect::<String>()
      .to_ascii_lowercase();
    if name == "br" {
      out.push('\n');
    }
    for (_, c) in chars.by_ref() {
      if c == '>' {
        break;
      }
    }
  }

  decode_entities(&out).trim().to_string()
}

/// Collapse whitespace runs into a single space and trim
pub fn normalize_ws(s: &str) -> String {
  s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn decode_entities(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut rest = s;

  while let Some(amp) = rest.find('&') {
    out.push_str(&rest[..amp]);
    let tail = &rest[amp..];
    let decoded = tail.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
      let entity = &tail[1..semi];
      let c = match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some(' '),
        _ => entity
          .strip_prefix("#x")
          .or_else(|| entity.strip_prefix("#X"))
          .and_then(|hex| u32::from_str_radix(hex, 16).ok())
          .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
          .and_then(char::from_u32),
      }?;
      Some((c, semi + 1))
    });

    match decoded {
      Some((c, consumed)) => {
        out.push(c);
        rest = &tail[consumed..];
      }
      None => {
        out.push('&');
        rest = &tail[1..];
      }
    }
  }

  out.push_str(rest);
  out
}

/// Next `<name` at or after `from` where `name` is `tag` (or any tag for `*`)
fn next_open_tag(lc: &str, mut from: usize, tag: &str) -> Option<(usize, String)> {
  loop {
    let start = lc.get(from..)?.find('<')? + from;
    let name: String = lc[start + 1..].chars().take_while(|c| c.is_ascii_alphanumeric() || *c == '-').collect();
    if !name.is_empty() && (tag == "*" || name == tag) {
      return Some((start, name));
    }
    from = start + 1;
  }
}

/// Byte offset just past the element's closing tag
fn element_end(lc: &str, name: &str, open_tag: &str, open_end: usize) -> Option<usize> {
  if VOID_ELEMENTS.contains(&name) || open_tag.trim_end_matches('>').ends_with('/') {
    return Some(open_end);
  }

  let open_pat = format!("<{name}");
  let close_pat = format!("</{name}");
  let mut depth = 1usize;
  let mut pos = open_end;

  while depth > 0 {
    let next_open = find_tag(lc, &open_pat, pos);
    let next_close = find_tag(lc, &close_pat, pos)?;

    match next_open {
      Some(o) if o < next_close => {
        depth += 1;
        pos = o + open_pat.len();
      }
      _ => {
        depth -= 1;
        pos = next_close + close_pat.len();
      }
    }
  }

  Some(lc[pos..].find('>').map_or(lc.len(), |i| pos + i + 1))
}

/// Find `pat` followed by a tag-name delimiter, so `<i` does not match `<img`
fn find_tag(lc: &str, pat: &str, mut from: usize) -> Option<usize> {
  loop {
    let at = lc.get(from..)?.find(pat)? + from;
    let after = lc[at + pat.len()..].chars().next();
    if matches!(after, None | Some('>') | Some('/')) || after.is_some_and(char::is_whitespace) {
      return Some(at);
    }
    from = at + pat.len();
  }
}

/// Value of attribute `name` in an opening tag
fn attribute<'t>(open_tag: &'t str, name: &str) -> Option<&'t str> {
  let bytes = open_tag.as_bytes();
  let mut i = open_tag.find(|c: char| c.is_whitespace())?;

  while i < bytes.len() {
    while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
      i += 1;
    }
    if i >= bytes.len() || bytes[i] == b'>' {
      return None;
    }

    let name_start = i;
    while i < bytes.len() && !matches!(bytes[i], b'=' | b'>' | b'/') && !bytes[i].is_ascii_whitespace() {
      i += 1;
    }
    let attr_name = &open_tag[name_start..i];

    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
      i += 1;
    }
    let value = if i < bytes.len() && bytes[i] == b'=' {
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
      }
      match bytes.get(i) {
        Some(&quote) if quote == b'"' || quote == b'\'' => {
          let value_start = i + 1;
          let value_end = open_tag[value_start..].find(quote as char).map_or(bytes.len(), |e| value_start + e);
          i = value_end + 1;
          &open_tag[value_start..value_end]
        }
        _ => {
          let value_start = i;
          while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
            i += 1;
          }
          &open_tag[value_start..i]
        }
      }
    } else {
      ""
    };

    if attr_name.eq_ignore_ascii_case(name) {
      return Some(value);
    }
  }

  None
}
