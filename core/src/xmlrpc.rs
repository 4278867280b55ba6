//! Typed XML-RPC envelopes.
//!
//! # Design
//! Requests and responses are built as `Value` trees and serialized in one
//! place, so every piece of text that reaches the wire goes through XML
//! escaping. Carriage returns are written as `&#13;` so the server's parser
//! does not fold them into line feeds. Control characters that XML 1.0 cannot
//! represent at all (everything below U+0020 except tab, LF and CR, plus
//! U+FFFE/U+FFFF) are dropped from the output. The output layout (two-space indentation, one element per
//! line) matches what the Cobbler server has always been sent, which keeps
//! captured traffic and the golden files in `test-vectors/` comparable.
//!
//! Decoding builds a small element tree from `quick-xml` events and then
//! interprets it. Whitespace between container tags is ignored, but text
//! inside leaf elements is kept verbatim.

use std::borrow::Cow;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ApiError;

/// A single XML-RPC value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Int(i32),
    Boolean(bool),
    /// Members in wire order.
    Struct(Vec<(String, Value)>),
    Array(Vec<Value>),
    Nil,
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Look up a struct member by name.
    pub fn member(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Boolean(_) => "boolean",
            Value::Struct(_) => "struct",
            Value::Array(_) => "array",
            Value::Nil => "nil",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

/// An XML-RPC request: a method name and positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method_name: String,
    pub params: Vec<Value>,
}

impl MethodCall {
    pub fn new(method_name: &str, params: Vec<Value>) -> Self {
        Self {
            method_name: method_name.to_string(),
            params,
        }
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::from("<methodCall>\n");
        line(&mut out, 2, &format!("<methodName>{}</methodName>", escape_text(&self.method_name)));
        write_params(&mut out, &self.params);
        out.push_str("</methodCall>\n");
        out
    }

    pub fn parse(xml: &str) -> Result<Self, ApiError> {
        let root = parse_tree(xml)?;
        if root.name != "methodCall" {
            return Err(decode_error(format!("expected <methodCall>, found <{}>", root.name)));
        }
        let method_name = root
            .child("methodName")
            .map(|el| el.text.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| decode_error("missing <methodName>"))?;
        let params = match root.child("params") {
            Some(params) => params
                .children_named("param")
                .map(param_value)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(Self { method_name, params })
    }
}

/// An XML-RPC response: either a single return value or a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodResponse {
    Success(Value),
    Fault { code: i32, message: String },
}

impl MethodResponse {
    pub fn to_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\"?>\n<methodResponse>\n");
        match self {
            MethodResponse::Success(value) => write_params(&mut out, std::slice::from_ref(value)),
            MethodResponse::Fault { code, message } => {
                let fault = Value::Struct(vec![
                    ("faultCode".to_string(), Value::Int(*code)),
                    ("faultString".to_string(), Value::String(message.clone())),
                ]);
                line(&mut out, 2, "<fault>");
                write_value(&mut out, &fault, 4);
                line(&mut out, 2, "</fault>");
            }
        }
        out.push_str("</methodResponse>\n");
        out
    }

    pub fn parse(xml: &str) -> Result<Self, ApiError> {
        let root = parse_tree(xml)?;
        if root.name != "methodResponse" {
            return Err(decode_error(format!("expected <methodResponse>, found <{}>", root.name)));
        }
        if let Some(fault) = root.child("fault") {
            let value = fault
                .child("value")
                .ok_or_else(|| decode_error("<fault> without <value>"))
                .and_then(parse_value)?;
            let code = value
                .member("faultCode")
                .and_then(Value::as_int)
                .ok_or_else(|| decode_error("fault is missing an integer faultCode"))?;
            let message = value
                .member("faultString")
                .and_then(Value::as_str)
                .ok_or_else(|| decode_error("fault is missing a faultString"))?;
            return Ok(MethodResponse::Fault {
                code,
                message: message.to_string(),
            });
        }
        let param = root
            .child("params")
            .and_then(|params| params.child("param"))
            .ok_or_else(|| decode_error("response has neither <params> nor <fault>"))?;
        Ok(MethodResponse::Success(param_value(param)?))
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

fn line(out: &mut String, indent: usize, text: &str) {
    out.extend(std::iter::repeat(' ').take(indent));
    out.push_str(text);
    out.push('\n');
}

/// Escape markup characters, encode CR, drop characters XML 1.0 forbids.
fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| c == '\r' || !is_xml_char(c)) {
        return escape(text);
    }
    let mut cleaned = String::with_capacity(text.len() + 8);
    let mut buf = [0u8; 4];
    for c in text.chars() {
        match c {
            '\r' => cleaned.push_str("&#13;"),
            c if is_xml_char(c) => cleaned.push_str(&escape(&*c.encode_utf8(&mut buf))),
            _ => {}
        }
    }
    Cow::Owned(cleaned)
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

fn write_params(out: &mut String, params: &[Value]) {
    line(out, 2, "<params>");
    for value in params {
        line(out, 4, "<param>");
        write_value(out, value, 6);
        line(out, 4, "</param>");
    }
    line(out, 2, "</params>");
}

fn write_value(out: &mut String, value: &Value, indent: usize) {
    line(out, indent, "<value>");
    let inner = indent + 2;
    match value {
        Value::String(s) => line(out, inner, &format!("<string>{}</string>", escape_text(s))),
        Value::Int(i) => line(out, inner, &format!("<int>{i}</int>")),
        Value::Boolean(b) => line(out, inner, &format!("<boolean>{}</boolean>", u8::from(*b))),
        Value::Nil => line(out, inner, "<nil/>"),
        Value::Struct(members) => {
            line(out, inner, "<struct>");
            for (name, member) in members {
                line(out, inner + 2, "<member>");
                line(out, inner + 4, &format!("<name>{}</name>", escape_text(name)));
                write_value(out, member, inner + 4);
                line(out, inner + 2, "</member>");
            }
            line(out, inner, "</struct>");
        }
        Value::Array(items) => {
            line(out, inner, "<array>");
            line(out, inner + 2, "<data>");
            for item in items {
                write_value(out, item, inner + 4);
            }
            line(out, inner + 2, "</data>");
            line(out, inner, "</array>");
        }
    }
    line(out, indent, "</value>");
}

// ---------------------------------------------------------------------------
// Deserialization
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn named(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Self::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn decode_error(msg: impl Into<String>) -> ApiError {
    ApiError::Deserialization(msg.into())
}

fn parse_tree(xml: &str) -> Result<Element, ApiError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| decode_error(format!("malformed XML at byte {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(tag) => stack.push(Element::named(tag.name().as_ref())),
            Event::Empty(tag) => attach(&mut stack, &mut root, Element::named(tag.name().as_ref()))?,
            Event::End(_) => {
                let done = stack.pop().ok_or_else(|| decode_error("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, done)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| decode_error(e.to_string()))?;
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&text);
                } else if !text.trim().is_empty() {
                    return Err(decode_error("text outside of the root element"));
                }
            }
            Event::CData(data) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(decode_error("document ended inside an open element"));
    }
    root.ok_or_else(|| decode_error("empty document"))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<(), ApiError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(decode_error("more than one root element")),
    }
    Ok(())
}

fn param_value(param: &Element) -> Result<Value, ApiError> {
    param
        .child("value")
        .ok_or_else(|| decode_error("<param> without <value>"))
        .and_then(parse_value)
}

fn parse_value(value: &Element) -> Result<Value, ApiError> {
    let typed = match value.children.as_slice() {
        // A bare <value> defaults to string.
        [] => return Ok(Value::String(value.text.clone())),
        [typed] => typed,
        [_, extra, ..] => {
            return Err(decode_error(format!("<value> holds more than one type element (extra <{}>)", extra.name)))
        }
    };
    match typed.name.as_str() {
        "string" => Ok(Value::String(typed.text.clone())),
        "int" | "i4" => typed
            .text
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| decode_error(format!("invalid integer {:?}", typed.text))),
        "boolean" => match typed.text.trim() {
            "1" => Ok(Value::Boolean(true)),
            "0" => Ok(Value::Boolean(false)),
            other => Err(decode_error(format!("invalid boolean {other:?}"))),
        },
        "nil" => Ok(Value::Nil),
        "struct" => typed
            .children_named("member")
            .map(|member| {
                let name = member
                    .child("name")
                    .ok_or_else(|| decode_error("<member> without <name>"))?;
                let value = member
                    .child("value")
                    .ok_or_else(|| decode_error("<member> without <value>"))
                    .and_then(parse_value)?;
                Ok((name.text.clone(), value))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Struct),
        "array" => typed
            .child("data")
            .map(|data| data.children_named("value").map(parse_value).collect::<Result<Vec<_>, _>>())
            .unwrap_or_else(|| Ok(Vec::new()))
            .map(Value::Array),
        other => Err(decode_error(format!("unsupported value type <{other}>"))),
    }
}
