//! Recursive-descent parser for location paths.

use std::collections::HashMap;

use super::{Axis, NodeTest, Predicate, Step, XPath, XML_NAMESPACE};
use crate::error::{HarvesterError, Result};

pub(super) fn parse(expression: &str, namespaces: &HashMap<String, String>) -> Result<XPath> {
    Parser {
        expression,
        chars: expression.chars().collect(),
        pos: 0,
        namespaces,
    }
    .parse_path()
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

struct Parser<'a> {
    expression: &'a str,
    chars: Vec<char>,
    pos: usize,
    namespaces: &'a HashMap<String, String>,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> HarvesterError {
        HarvesterError::InvalidExpression {
            expression: self.expression.to_string(),
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        match self.peek() {
            Some(found) if found == c => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(self.error(format!("expected '{c}', found '{found}'"))),
            None => Err(self.error(format!("expected '{c}', found end of expression"))),
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse_path(mut self) -> Result<XPath> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(self.error("empty expression"));
        }

        let mut absolute = false;
        let mut axis = Axis::Child;
        if self.eat('/') {
            absolute = true;
            if self.eat('/') {
                axis = Axis::Descendant;
            }
        }

        let mut steps = Vec::new();
        loop {
            let step = self.parse_step(axis)?;
            let is_attribute = step.axis == Axis::Attribute;
            steps.push(step);

            self.skip_ws();
            match self.peek() {
                None => break,
                Some('/') if is_attribute => {
                    return Err(self.error("an attribute step must be the last step"));
                }
                Some('/') => {
                    self.bump();
                    axis = if self.eat('/') {
                        Axis::Descendant
                    } else {
                        Axis::Child
                    };
                }
                Some(c) => return Err(self.error(format!("unexpected '{c}'"))),
            }
        }

        Ok(XPath {
            source: self.expression.to_string(),
            absolute,
            steps,
        })
    }

    fn parse_step(&mut self, axis: Axis) -> Result<Step> {
        self.skip_ws();

        if self.eat('.') {
            if axis == Axis::Descendant {
                return Err(self.error("'.' and '..' cannot follow '//'"));
            }
            let axis = if self.eat('.') {
                Axis::Parent
            } else {
                Axis::SelfNode
            };
            return Ok(Step {
                axis,
                test: NodeTest::AnyNode,
                predicates: Vec::new(),
            });
        }

        if self.eat('@') {
            if axis == Axis::Descendant {
                return Err(self.error("'//@' is not supported"));
            }
            let test = self.parse_name_test(true)?;
            let predicates = self.parse_predicates()?;
            return Ok(Step {
                axis: Axis::Attribute,
                test,
                predicates,
            });
        }

        let test = self.parse_name_test(false)?;
        let predicates = self.parse_predicates()?;
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_name_test(&mut self, attribute: bool) -> Result<NodeTest> {
        if self.eat('*') {
            return Ok(NodeTest::Any);
        }

        let first = self.parse_ncname()?;

        if self.peek() == Some('(') {
            if attribute {
                return Err(self.error("node tests are not allowed on attributes"));
            }
            self.bump();
            self.skip_ws();
            self.expect(')')?;
            return match first.as_str() {
                "text" => Ok(NodeTest::Text),
                "node" => Ok(NodeTest::AnyNode),
                other => Err(self.error(format!("unsupported node test '{other}()'"))),
            };
        }

        if self.peek() == Some(':') {
            if self.peek_at(1) == Some(':') {
                return Err(self.error("axis specifiers are not supported"));
            }
            self.bump();
            let namespace = self.resolve(&first)?;
            if self.eat('*') {
                return Ok(NodeTest::AnyInNamespace(namespace));
            }
            let local = self.parse_ncname()?;
            return Ok(NodeTest::Name {
                namespace: Some(namespace),
                local,
            });
        }

        Ok(NodeTest::Name {
            namespace: None,
            local: first,
        })
    }

    fn resolve(&self, prefix: &str) -> Result<String> {
        if prefix == "xml" {
            return Ok(XML_NAMESPACE.to_string());
        }
        self.namespaces
            .get(prefix)
            .cloned()
            .ok_or_else(|| HarvesterError::UnknownPrefix {
                prefix: prefix.to_string(),
                expression: self.expression.to_string(),
            })
    }

    fn parse_ncname(&mut self) -> Result<String> {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_name_start(c) => {}
            Some(c) => return Err(self.error(format!("expected a name, found '{c}'"))),
            None => return Err(self.error("expected a name, found end of expression")),
        }
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_predicates(&mut self) -> Result<Vec<Predicate>> {
        let mut predicates = Vec::new();
        loop {
            self.skip_ws();
            if !self.eat('[') {
                break;
            }
            self.skip_ws();
            predicates.push(self.parse_predicate()?);
            self.skip_ws();
            self.expect(']')?;
        }
        Ok(predicates)
    }

    fn parse_predicate(&mut self) -> Result<Predicate> {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let digits: String = self.chars[start..self.pos].iter().collect();
                match digits.parse::<usize>() {
                    Ok(0) => Err(self.error("positions start at 1")),
                    Ok(n) => Ok(Predicate::Position(n)),
                    Err(_) => Err(self.error(format!("position '{digits}' is out of range"))),
                }
            }
            Some('@') => {
                self.bump();
                let NodeTest::Name { namespace, local } = self.parse_name_test(true)? else {
                    return Err(self.error("attribute predicates need an attribute name"));
                };
                let value = self.parse_comparison()?;
                Ok(Predicate::AttributeEquals {
                    namespace,
                    local,
                    value,
                })
            }
            Some(_) => {
                let function = self.parse_ncname()?;
                self.skip_ws();
                self.expect('(')?;
                self.skip_ws();
                self.expect(')')?;
                let value = self.parse_comparison()?;
                match function.as_str() {
                    "name" => Ok(Predicate::NameEquals(value)),
                    "local-name" => Ok(Predicate::LocalNameEquals(value)),
                    other => Err(self.error(format!("unsupported function '{other}()'"))),
                }
            }
            None => Err(self.error("unterminated predicate")),
        }
    }

    /// Parse `= 'literal'`.
    fn parse_comparison(&mut self) -> Result<String> {
        self.skip_ws();
        self.expect('=')?;
        self.skip_ws();
        self.parse_literal()
    }

    fn parse_literal(&mut self) -> Result<String> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a quoted string")),
        };
        self.bump();
        let start = self.pos;
        loop {
            match self.bump() {
                Some(c) if c == quote => break,
                Some(_) => {}
                None => return Err(self.error("unterminated string literal")),
            }
        }
        Ok(self.chars[start..self.pos - 1].iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns() -> HashMap<String, String> {
        HashMap::from([
            ("dc".to_string(), "http://purl.org/dc/elements/1.1/".to_string()),
            (
                "oai_dc".to_string(),
                "http://www.openarchives.org/OAI/2.0/oai_dc/".to_string(),
            ),
        ])
    }

    #[test]
    fn test_parse_relative_path() {
        let path = parse("oai_dc:dc/dc:title/text()", &ns()).unwrap();
        assert!(!path.absolute);
        assert_eq!(path.steps.len(), 3);
        assert_eq!(path.steps[2].test, NodeTest::Text);
        assert_eq!(
            path.steps[1].test,
            NodeTest::Name {
                namespace: Some("http://purl.org/dc/elements/1.1/".to_string()),
                local: "title".to_string()
            }
        );
    }

    #[test]
    fn test_parse_name_predicate() {
        let path = parse("//*[name()='metadata']/*[name()=\"DIF\"]/text()", &ns()).unwrap();
        assert!(path.absolute);
        assert_eq!(path.steps[0].axis, Axis::Descendant);
        assert_eq!(
            path.steps[0].predicates,
            vec![Predicate::NameEquals("metadata".to_string())]
        );
        assert_eq!(
            path.steps[1].predicates,
            vec![Predicate::NameEquals("DIF".to_string())]
        );
    }

    #[test]
    fn test_parse_attribute_steps() {
        let path = parse("codeBook/@xml:lang", &ns()).unwrap();
        assert_eq!(path.steps[1].axis, Axis::Attribute);
        assert_eq!(
            path.steps[1].test,
            NodeTest::Name {
                namespace: Some(XML_NAMESPACE.to_string()),
                local: "lang".to_string()
            }
        );
        assert!(parse("a/@b/c", &ns()).is_err());
    }

    #[test]
    fn test_parse_position_and_attribute_predicates() {
        let path = parse("a[2][@type = 'doi']", &ns()).unwrap();
        assert_eq!(path.steps[0].predicates.len(), 2);
        assert_eq!(path.steps[0].predicates[0], Predicate::Position(2));
        assert!(parse("a[0]", &ns()).is_err());
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "   ", "/", "a/", "a//", "a[", "a[name()='x'", "a[name()='x]", "a b", "a/text(", "a/foo()", "child::a", "1a"] {
            let err = parse(bad, &ns()).unwrap_err();
            assert!(
                matches!(err, HarvesterError::InvalidExpression { .. }),
                "expected InvalidExpression for {bad:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_parse_unknown_prefix() {
        let err = parse("dcterms:title", &ns()).unwrap_err();
        assert!(matches!(err, HarvesterError::UnknownPrefix { ref prefix, .. } if prefix == "dcterms"));
    }
}
