//! Namecheap XML response envelope
//!
//! Every response is an `ApiResponse` element in the
//! `http://api.namecheap.com/xml.response` namespace:
//!
//! ```xml
//! <ApiResponse Status="OK" xmlns="http://api.namecheap.com/xml.response">
//!   <Errors />
//!   <CommandResponse Type="namecheap.domains.dns.getHosts">
//!     <DomainDNSGetHostsResult Domain="example.com" IsUsingOurDNS="true">
//!       <host HostId="10" Name="@" Type="A" Address="203.0.113.5" MXPref="10" TTL="1800" />
//!     </DomainDNSGetHostsResult>
//!   </CommandResponse>
//! </ApiResponse>
//! ```
//!
//! The body is read into a small owned element tree. Lookups only match
//! elements bound to the response namespace.

use folio_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

/// Namespace of every element in a response
pub const RESPONSE_NAMESPACE: &str = "http://api.namecheap.com/xml.response";

/// An element of a parsed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Local name
    pub name: String,
    /// Whether the element is bound to [`RESPONSE_NAMESPACE`]
    pub in_namespace: bool,
    /// Attributes by local name, in document order
    pub attributes: Vec<(String, String)>,
    /// Concatenated text content
    pub text: String,
    /// Child elements
    pub children: Vec<Element>,
}

impl Element {
    /// Attribute value by local name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First descendant with the given local name
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|child| {
            if child.matches(name) {
                Some(child)
            } else {
                child.find(name)
            }
        })
    }

    /// All descendants with the given local name, in document order
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect(name, &mut found);
        found
    }

    fn collect<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.matches(name) {
                found.push(child);
            }
            child.collect(name, found);
        }
    }

    fn matches(&self, name: &str) -> bool {
        self.in_namespace && self.name == name
    }
}

/// Parse a response body into its root element
///
/// Malformed XML or a root that is not a namespaced `ApiResponse` is a
/// protocol error.
pub fn parse(body: &str) -> Result<Element> {
    let mut reader = NsReader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (namespace, event) = reader
            .read_resolved_event()
            .map_err(|e| Error::protocol(format!("Invalid XML response: {}", e)))?;

        match event {
            Event::Start(start) => {
                stack.push(element(&namespace, &start)?);
            }
            Event::Empty(start) => {
                let element = element(&namespace, &start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::protocol("Invalid XML response: unbalanced end tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| Error::protocol(format!("Invalid XML text: {}", e)))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::protocol("Invalid XML response: unexpected end of document"));
    }

    let root = root.ok_or_else(|| Error::protocol("Empty XML response"))?;
    if root.name != "ApiResponse" || !root.in_namespace {
        return Err(Error::protocol(format!(
            "Unexpected response root element: {}",
            root.name
        )));
    }
    Ok(root)
}

fn element(namespace: &ResolveResult<'_>, start: &BytesStart<'_>) -> Result<Element> {
    let in_namespace = matches!(
        namespace,
        ResolveResult::Bound(Namespace(ns)) if *ns == RESPONSE_NAMESPACE.as_bytes()
    );

    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute =
            attribute.map_err(|e| Error::protocol(format!("Invalid XML attribute: {}", e)))?;
        // Namespace declarations are not data
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let value = attribute
            .unescape_value()
            .map_err(|e| Error::protocol(format!("Invalid XML attribute: {}", e)))?;
        attributes.push((
            String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned(),
            value.into_owned(),
        ));
    }

    Ok(Element {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        in_namespace,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::protocol("Invalid XML response: multiple root elements")),
    }
    Ok(())
}
