// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Multi-variant property value for tests.
//!
//! Token grammar of [`TestCodec`]:
//! - `Int(v)`: the decimal integer (`5`, `-5`)
//! - `Label(s)`: `s` followed by the label (`sred`), with `%`, `:`, `|` and
//!   `_` written as `%25`, `%3A`, `%7C` and `%5F`
//! - `Port(n)`: `p` followed by the node index, or `pe` for the leg

use std::sync::Arc;

use graph_state::{DecodeError, Externalizable, Externalizer, NodeIndex, PropertyValue, LEG};

/// Property value with one scalar, one opaque, and one node-valued variant.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestValue {
    /// Signed quantity; negated with its edge.
    Int(i64),
    /// Opaque label; never negated.
    Label(String),
    /// Reference to an endpoint; becomes the leg when that endpoint is external.
    Port(NodeIndex),
}

impl PropertyValue for TestValue {
    fn negated(&self) -> Self {
        match self {
            Self::Int(v) => Self::Int(v.wrapping_neg()),
            other => other.clone(),
        }
    }

    fn as_externalizable(&self) -> Option<&dyn Externalizable<Self>> {
        match self {
            Self::Port(_) => Some(self),
            _ => None,
        }
    }
}

impl Externalizable<Self> for TestValue {
    fn make_external(&self, _nodes: (NodeIndex, NodeIndex), external_node: NodeIndex) -> Self {
        match self {
            Self::Port(n) if *n == external_node => Self::Port(LEG),
            other => other.clone(),
        }
    }
}

/// Codec for [`TestValue`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TestCodec;

impl TestCodec {
    /// The codec behind an `Arc`, ready for a property key.
    pub fn shared() -> Arc<dyn Externalizer<TestValue>> {
        Arc::new(Self)
    }
}

impl Externalizer<TestValue> for TestCodec {
    fn serialize(&self, value: &TestValue) -> String {
        match value {
            TestValue::Int(v) => v.to_string(),
            TestValue::Label(s) => format!("s{}", escape(s)),
            TestValue::Port(LEG) => "pe".to_owned(),
            TestValue::Port(n) => format!("p{n}"),
        }
    }

    fn deserialize(&self, token: &str) -> Result<TestValue, DecodeError> {
        let invalid = |reason: &str| DecodeError::InvalidToken {
            token: token.to_owned(),
            reason: reason.to_owned(),
        };
        if let Some(label) = token.strip_prefix('s') {
            return unescape(label)
                .map(TestValue::Label)
                .ok_or_else(|| invalid("bad escape in label"));
        }
        if let Some(port) = token.strip_prefix('p') {
            if port == "e" {
                return Ok(TestValue::Port(LEG));
            }
            return port
                .parse()
                .map(TestValue::Port)
                .map_err(|_| invalid("bad port"));
        }
        token
            .parse()
            .map(TestValue::Int)
            .map_err(|_| invalid("expected integer, `s<label>` or `p<node>`"))
    }
}

const ESCAPED: [(char, &str); 4] = [('%', "%25"), (':', "%3A"), ('|', "%7C"), ('_', "%5F")];

fn escape(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        match ESCAPED.iter().find(|(raw, _)| *raw == c) {
            Some((_, code)) => out.push_str(code),
            None => out.push(c),
        }
    }
    out
}

fn unescape(token: &str) -> Option<String> {
    let mut out = String::with_capacity(token.len());
    let mut rest = token;
    while let Some(at) = rest.find('%') {
        out.push_str(&rest[..at]);
        let code = rest.get(at..at + 3)?;
        let (raw, _) = ESCAPED.iter().find(|(_, c)| *c == code)?;
        out.push(*raw);
        rest = &rest[at + 3..];
    }
    out.push_str(rest);
    Some(out)
}
