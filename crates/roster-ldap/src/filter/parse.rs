//! RFC 4515 filter text parsing.
//!
//! A small recursive-descent parser over the filter's byte form.
//! Assertion values decode `\xx` hex-pair escapes; anything else after
//! a backslash is malformed.

use super::{Filter, FilterError, Substring};

pub(super) fn parse(input: &str) -> Result<Filter, FilterError> {
    if input.is_empty() {
        return Err(FilterError::Parse("empty filter string".to_string()));
    }

    let mut parser = Parser {
        input: input.as_bytes(),
        pos: 0,
    };
    let filter = parser.parse_filter()?;

    if parser.pos != parser.input.len() {
        return Err(FilterError::Parse(format!(
            "unexpected trailing input at byte {}",
            parser.pos
        )));
    }

    Ok(filter)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn expect(&mut self, byte: u8) -> Result<(), FilterError> {
        match self.bump() {
            Some(b) if b == byte => Ok(()),
            Some(b) => Err(FilterError::Parse(format!(
                "expected {:?} at byte {}, found {:?}",
                byte as char,
                self.pos - 1,
                b as char
            ))),
            None => Err(FilterError::Parse(format!(
                "expected {:?} at byte {}, found end of input",
                byte as char, self.pos
            ))),
        }
    }

    fn parse_filter(&mut self) -> Result<Filter, FilterError> {
        self.expect(b'(')?;

        let filter = match self.peek() {
            Some(b'&') => {
                self.pos += 1;
                Filter::And(self.parse_filter_list("AND")?)
            }
            Some(b'|') => {
                self.pos += 1;
                Filter::Or(self.parse_filter_list("OR")?)
            }
            Some(b'!') => {
                self.pos += 1;
                Filter::Not(Box::new(self.parse_filter()?))
            }
            Some(_) => self.parse_item()?,
            None => {
                return Err(FilterError::Parse(
                    "unbalanced parentheses: unexpected end of input".to_string(),
                ))
            }
        };

        self.expect(b')').map_err(|_| {
            FilterError::Parse(format!("unbalanced parentheses at byte {}", self.pos))
        })?;

        Ok(filter)
    }

    fn parse_filter_list(&mut self, kind: &str) -> Result<Vec<Filter>, FilterError> {
        let mut children = Vec::new();
        while self.peek() == Some(b'(') {
            children.push(self.parse_filter()?);
        }
        if children.is_empty() {
            return Err(FilterError::Parse(format!(
                "{kind} filter must have at least one child"
            )));
        }
        Ok(children)
    }

    fn parse_item(&mut self) -> Result<Filter, FilterError> {
        let attr = self.parse_attr()?;

        match self.bump() {
            Some(b'=') => self.parse_equality_rhs(attr),
            Some(b'>') => {
                self.expect(b'=')?;
                let value = self.parse_value_part(&attr)?;
                Ok(Filter::GreaterOrEqual { attr, value })
            }
            Some(b'<') => {
                self.expect(b'=')?;
                let value = self.parse_value_part(&attr)?;
                Ok(Filter::LessOrEqual { attr, value })
            }
            Some(b'~') => {
                self.expect(b'=')?;
                let value = self.parse_value_part(&attr)?;
                Ok(Filter::ApproxMatch { attr, value })
            }
            _ => Err(FilterError::Parse(format!(
                "expected comparison operator after attribute {attr:?}"
            ))),
        }
    }

    fn parse_attr(&mut self) -> Result<String, FilterError> {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            match byte {
                b'=' | b'>' | b'<' | b'~' => break,
                b'(' | b')' => {
                    return Err(FilterError::Parse(format!(
                        "unexpected {:?} in attribute name at byte {}",
                        byte as char, self.pos
                    )))
                }
                _ => self.pos += 1,
            }
        }

        let raw = &self.input[start..self.pos];
        if raw.is_empty() {
            return Err(FilterError::Parse(format!(
                "empty attribute name at byte {start}"
            )));
        }
        if raw.contains(&b':') {
            return Err(FilterError::ExtensibleMatch);
        }

        String::from_utf8(raw.to_vec())
            .map_err(|_| FilterError::Parse("attribute name is not valid UTF-8".to_string()))
    }

    /// Parses a single assertion value (no wildcard splitting), as
    /// used by the ordering and approximate comparisons.
    fn parse_value_part(&mut self, attr: &str) -> Result<String, FilterError> {
        let mut bytes = Vec::new();
        loop {
            match self.peek() {
                None | Some(b')') => break,
                Some(b'(') => {
                    return Err(FilterError::Parse(format!(
                        "unescaped '(' in value at byte {}",
                        self.pos
                    )))
                }
                Some(b'\\') => {
                    self.pos += 1;
                    bytes.push(self.parse_hex_escape()?);
                }
                Some(byte) => {
                    self.pos += 1;
                    bytes.push(byte);
                }
            }
        }

        String::from_utf8(bytes)
            .map_err(|_| FilterError::Parse(format!("value of {attr:?} is not valid UTF-8")))
    }

    /// Parses the right-hand side of `attr=`: a plain value, `*` for
    /// presence, or a wildcard pattern for a substring match.
    fn parse_equality_rhs(&mut self, attr: String) -> Result<Filter, FilterError> {
        let mut parts = vec![Vec::new()];

        loop {
            match self.peek() {
                None | Some(b')') => break,
                Some(b'(') => {
                    return Err(FilterError::Parse(format!(
                        "unescaped '(' in value at byte {}",
                        self.pos
                    )))
                }
                Some(b'*') => {
                    self.pos += 1;
                    parts.push(Vec::new());
                }
                Some(b'\\') => {
                    self.pos += 1;
                    let byte = self.parse_hex_escape()?;
                    push_byte(&mut parts, byte);
                }
                Some(byte) => {
                    self.pos += 1;
                    push_byte(&mut parts, byte);
                }
            }
        }

        let mut parts = parts
            .into_iter()
            .map(|bytes| {
                String::from_utf8(bytes).map_err(|_| {
                    FilterError::Parse(format!("value of {attr:?} is not valid UTF-8"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if parts.len() == 1 {
            let value = parts.pop().unwrap_or_default();
            return Ok(Filter::Equal { attr, value });
        }

        // Exactly one wildcard and nothing else: a presence test.
        if parts.len() == 2 && parts[0].is_empty() && parts[1].is_empty() {
            return Ok(Filter::Present { attr });
        }

        let final_part = parts.pop().unwrap_or_default();
        let initial_part = parts.remove(0);

        if parts.iter().any(String::is_empty) {
            return Err(FilterError::Parse(format!(
                "adjacent wildcards in substring filter on {attr:?}"
            )));
        }

        Ok(Filter::Substring {
            attr,
            substring: Substring {
                initial: (!initial_part.is_empty()).then_some(initial_part),
                any: parts,
                final_: (!final_part.is_empty()).then_some(final_part),
            },
        })
    }

    fn parse_hex_escape(&mut self) -> Result<u8, FilterError> {
        let hi = self.bump();
        let lo = self.bump();
        match (hi.and_then(hex_digit), lo.and_then(hex_digit)) {
            (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
            _ => Err(FilterError::Parse(format!(
                "invalid escape sequence at byte {}: expected two hex digits after '\\'",
                self.pos
            ))),
        }
    }
}

fn push_byte(parts: &mut [Vec<u8>], byte: u8) {
    let last = parts.len() - 1;
    parts[last].push(byte);
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Filter, FilterError, Substring};

    fn equal(attr: &str, value: &str) -> Filter {
        Filter::Equal {
            attr: attr.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn parses_equality() {
        assert_eq!(Filter::parse("(cn=John)").unwrap(), equal("cn", "John"));
    }

    #[test]
    fn parses_presence() {
        assert_eq!(
            Filter::parse("(cn=*)").unwrap(),
            Filter::Present {
                attr: "cn".to_string()
            }
        );
    }

    #[test]
    fn parses_substring_prefix() {
        let Filter::Substring { attr, substring } = Filter::parse("(cn=Jo*)").unwrap() else {
            panic!("expected substring");
        };
        assert_eq!(attr, "cn");
        assert_eq!(substring.initial.as_deref(), Some("Jo"));
        assert!(substring.any.is_empty());
        assert!(substring.final_.is_none());
    }

    #[test]
    fn parses_substring_suffix() {
        let Filter::Substring { substring, .. } = Filter::parse("(cn=*ohn)").unwrap() else {
            panic!("expected substring");
        };
        assert!(substring.initial.is_none());
        assert!(substring.any.is_empty());
        assert_eq!(substring.final_.as_deref(), Some("ohn"));
    }

    #[test]
    fn parses_substring_any() {
        let Filter::Substring { substring, .. } = Filter::parse("(cn=*oh*)").unwrap() else {
            panic!("expected substring");
        };
        assert!(substring.initial.is_none());
        assert_eq!(substring.any, vec!["oh".to_string()]);
        assert!(substring.final_.is_none());
    }

    #[test]
    fn parses_substring_complex() {
        let Filter::Substring { substring, .. } = Filter::parse("(cn=J*o*hn)").unwrap() else {
            panic!("expected substring");
        };
        assert_eq!(substring.initial.as_deref(), Some("J"));
        assert_eq!(substring.any, vec!["o".to_string()]);
        assert_eq!(substring.final_.as_deref(), Some("hn"));
    }

    #[test]
    fn parses_ordering_matches() {
        assert_eq!(
            Filter::parse("(age>=18)").unwrap(),
            Filter::GreaterOrEqual {
                attr: "age".to_string(),
                value: "18".to_string()
            }
        );
        assert_eq!(
            Filter::parse("(age<=65)").unwrap(),
            Filter::LessOrEqual {
                attr: "age".to_string(),
                value: "65".to_string()
            }
        );
    }

    #[test]
    fn parses_approx_match() {
        assert_eq!(
            Filter::parse("(cn~=Jon)").unwrap(),
            Filter::ApproxMatch {
                attr: "cn".to_string(),
                value: "Jon".to_string()
            }
        );
    }

    #[test]
    fn parses_and() {
        assert_eq!(
            Filter::parse("(&(cn=John)(mail=j@e.com))").unwrap(),
            Filter::And(vec![equal("cn", "John"), equal("mail", "j@e.com")])
        );
    }

    #[test]
    fn parses_or() {
        assert_eq!(
            Filter::parse("(|(cn=John)(cn=Jane))").unwrap(),
            Filter::Or(vec![equal("cn", "John"), equal("cn", "Jane")])
        );
    }

    #[test]
    fn parses_not() {
        assert_eq!(
            Filter::parse("(!(cn=John))").unwrap(),
            Filter::Not(Box::new(equal("cn", "John")))
        );
    }

    #[test]
    fn parses_nested_combination() {
        // AND[OR[Equal, Equal], NOT[Equal], Substring(final)]
        let filter =
            Filter::parse("(&(|(cn=A)(cn=B))(!(status=disabled))(mail=*@example.com))").unwrap();
        assert_eq!(
            filter,
            Filter::And(vec![
                Filter::Or(vec![equal("cn", "A"), equal("cn", "B")]),
                Filter::Not(Box::new(equal("status", "disabled"))),
                Filter::Substring {
                    attr: "mail".to_string(),
                    substring: Substring {
                        initial: None,
                        any: Vec::new(),
                        final_: Some("@example.com".to_string()),
                    },
                },
            ])
        );
    }

    #[test]
    fn decodes_hex_escapes() {
        assert_eq!(
            Filter::parse(r"(cn=left\28right\29)").unwrap(),
            equal("cn", "left(right)")
        );
        assert_eq!(Filter::parse(r"(cn=a\2ab)").unwrap(), equal("cn", "a*b"));
        assert_eq!(Filter::parse(r"(cn=back\5cslash)").unwrap(), equal("cn", r"back\slash"));
    }

    #[test]
    fn rejects_empty_filter() {
        assert!(matches!(Filter::parse(""), Err(FilterError::Parse(_))));
    }

    #[test]
    fn rejects_missing_parens() {
        assert!(matches!(Filter::parse("cn=John"), Err(FilterError::Parse(_))));
    }

    #[test]
    fn rejects_unbalanced_parens() {
        assert!(matches!(
            Filter::parse("(&(cn=John)"),
            Err(FilterError::Parse(_))
        ));
        assert!(matches!(
            Filter::parse("(cn=John))"),
            Err(FilterError::Parse(_))
        ));
    }

    #[test]
    fn rejects_empty_compound() {
        assert!(matches!(Filter::parse("(&)"), Err(FilterError::Parse(_))));
        assert!(matches!(Filter::parse("(|)"), Err(FilterError::Parse(_))));
    }

    #[test]
    fn rejects_not_with_two_children() {
        assert!(matches!(
            Filter::parse("(!(cn=a)(cn=b))"),
            Err(FilterError::Parse(_))
        ));
    }

    #[test]
    fn rejects_extensible_match() {
        assert_eq!(
            Filter::parse("(cn:caseExactMatch:=John)"),
            Err(FilterError::ExtensibleMatch)
        );
        assert_eq!(Filter::parse("(cn:=John)"), Err(FilterError::ExtensibleMatch));
    }

    #[test]
    fn rejects_bad_escape() {
        assert!(matches!(Filter::parse(r"(cn=a\zz)"), Err(FilterError::Parse(_))));
        assert!(matches!(Filter::parse(r"(cn=a\5)"), Err(FilterError::Parse(_))));
    }

    #[test]
    fn rejects_adjacent_wildcards() {
        assert!(matches!(Filter::parse("(cn=a**b)"), Err(FilterError::Parse(_))));
    }

    #[test]
    fn print_parse_round_trip() {
        let inputs = [
            "(cn=John)",
            "(cn=*)",
            "(mail=*@example.com)",
            "(cn=J*o*hn)",
            "(age>=18)",
            "(age<=65)",
            "(cn~=Jon)",
            "(&(cn=John)(mail=j@e.com))",
            "(|(cn=John)(cn=Jane))",
            "(!(cn=John))",
            "(&(|(cn=A)(cn=B))(!(status=disabled))(mail=*@example.com))",
            r"(cn=left\28right\29)",
            r"(cn=star\2avalue)",
        ];

        for input in inputs {
            let parsed = Filter::parse(input).unwrap();
            let reparsed = Filter::parse(&parsed.to_string()).unwrap();
            assert_eq!(parsed, reparsed, "round trip failed for {input}");
        }
    }
}
