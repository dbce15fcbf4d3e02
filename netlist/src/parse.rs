use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use yap::{one_of, types::WithContext, IntoTokens, TokenLocation, Tokens};

use crate::{Design, DeviceKind, Link, NetKind};

#[derive(Debug)]
struct Context {
    design: Design,
}

impl Context {
    fn new() -> Context {
        Context { design: Design::new() }
    }

    fn get_net_pin(&self, name: &str, pin: usize) -> Link {
        let net = self.design.find_net(name).expect("name should reference a net");
        assert!(pin < self.design.net(net).pin_count(), "pin &{name:?}+{pin} out of range");
        self.design.net_pin(net, pin)
    }

    fn get_device_pin(&self, name: &str, pin: usize) -> Link {
        let device = self.design.find_device(name).expect("name should reference a device");
        assert!(pin < self.design.device(device).pin_count(), "pin %{name:?}+{pin} out of range");
        self.design.device_pin(device, pin)
    }
}

fn parse_space(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> bool {
    t.skip_while(|c| *c == ' ' || *c == '\t') > 0
}

fn parse_comment(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> bool {
    if !t.token(';') {
        return false;
    }
    t.skip_while(|c| *c != '\n');
    true
}

fn parse_blank(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> bool {
    let space = parse_space(t);
    let comment = parse_comment(t);
    space || comment
}

#[must_use]
fn parse_symbol(t: &mut WithContext<impl Tokens<Item = char>, Context>, symbol: char) -> Option<()> {
    if !t.token(symbol) {
        return None;
    }
    Some(())
}

fn parse_decimal<T: FromStr>(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<T> {
    t.take_while(|c| c.is_ascii_digit()).parse::<T, String>().ok()
}

fn parse_string_char(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<u8> {
    match t.next() {
        Some('"' | '\\') => None,
        Some(char) if char.is_ascii() => Some(char as u8),
        _ => None,
    }
}

fn parse_string_escape(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<u8> {
    parse_symbol(t, '\\')?;
    if let (Some(hi @ ('0'..='9' | 'a'..='f')), Some(lo @ ('0'..='9' | 'a'..='f'))) = (t.next(), t.next()) {
        u8::from_str_radix(&format!("{hi}{lo}"), 16).ok()
    } else {
        None
    }
}

fn parse_string(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<String> {
    parse_symbol(t, '"')?;
    let bytes = t
        .many(|t| {
            one_of!(t;
                parse_string_char(t),
                parse_string_escape(t)
            )
        })
        .collect::<Vec<u8>>();
    parse_symbol(t, '"')?;
    String::from_utf8(bytes).ok()
}

fn parse_keyword(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<String> {
    let name: String = t.take_while(|c| c.is_ascii_alphanumeric() || *c == '_').collect();
    if name.is_empty() {
        return None;
    }
    Some(name)
}

#[must_use]
fn parse_keyword_expect(t: &mut WithContext<impl Tokens<Item = char>, Context>, expected: &str) -> Option<()> {
    let keyword = parse_keyword(t)?;
    if keyword != expected {
        return None;
    }
    Some(())
}

fn parse_name_width(t: &mut WithContext<impl Tokens<Item = char>, Context>, sigil: char) -> Option<(String, usize)> {
    parse_symbol(t, sigil)?;
    let name = parse_string(t)?;
    parse_symbol(t, ':')?;
    let width = parse_decimal(t)?;
    Some((name, width))
}

fn parse_name_pin(t: &mut WithContext<impl Tokens<Item = char>, Context>, sigil: char) -> Option<(String, usize)> {
    parse_symbol(t, sigil)?;
    let name = parse_string(t)?;
    parse_symbol(t, '+')?;
    let pin = parse_decimal(t)?;
    Some((name, pin))
}

fn parse_attribute(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<(String, String)> {
    let name = parse_string(t)?;
    parse_blank(t);
    parse_symbol(t, '=')?;
    parse_blank(t);
    let value = parse_string(t)?;
    Some((name, value))
}

fn parse_attributes(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<BTreeMap<String, String>> {
    let mut attributes = BTreeMap::new();
    parse_symbol(t, '{')?;
    while let Some((name, value)) = t.optional(|t| {
        parse_blank(t);
        parse_attribute(t)
    }) {
        assert!(attributes.insert(name, value).is_none(), "attribute names cannot be repeated");
    }
    parse_blank(t);
    parse_symbol(t, '}')?;
    Some(attributes)
}

fn parse_line_end(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<()> {
    parse_blank(t);
    one_of!(t;
        parse_symbol(t, '\n'),
        t.eof().then_some(()),
    )
}

fn parse_net(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<()> {
    let (name, width) = parse_name_width(t, '&')?;
    parse_blank(t);
    let kind = parse_keyword(t)?.parse::<NetKind>().ok()?;
    let attributes = t
        .optional(|t| {
            parse_blank(t);
            parse_attributes(t)
        })
        .unwrap_or_default();
    parse_line_end(t)?;
    let design = &mut t.context_mut().design;
    let net = design.add_net(name, kind, width);
    for (name, value) in attributes {
        design.net_mut(net).set_attribute(name, value);
    }
    Some(())
}

fn parse_device(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<()> {
    let (name, width) = parse_name_width(t, '%')?;
    parse_blank(t);
    let kind = parse_keyword(t)?.parse::<DeviceKind>().ok()?;
    let attributes = t
        .optional(|t| {
            parse_blank(t);
            parse_attributes(t)
        })
        .unwrap_or_default();
    parse_line_end(t)?;
    let design = &mut t.context_mut().design;
    let device = design.add_device(name, kind, width);
    for (name, value) in attributes {
        design.device_mut(device).set_attribute(name, value);
    }
    Some(())
}

fn parse_link(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<Link> {
    one_of!(t;
        parse_name_pin(t, '&').map(|(name, pin)| t.context().get_net_pin(&name, pin)),
        parse_name_pin(t, '%').map(|(name, pin)| t.context().get_device_pin(&name, pin)),
    )
}

fn parse_ring(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<()> {
    parse_keyword_expect(t, "ring")?;
    let links = Vec::from_iter(
        t.many(|t| {
            parse_blank(t);
            parse_link(t)
        })
        .as_iter(),
    );
    if links.len() < 2 {
        return None;
    }
    parse_line_end(t)?;
    let design = &mut t.context_mut().design;
    assert!(design.ring(links[0]).next().is_none(), "terminal cannot appear in more than one ring");
    for &link in &links[1..] {
        assert!(design.ring(link).next().is_none(), "terminal cannot appear in more than one ring");
        design.connect(links[0], link);
    }
    Some(())
}

fn parse_line(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> bool {
    parse_blank(t);
    one_of!(t;
        parse_net(t).is_some(),
        parse_device(t).is_some(),
        parse_ring(t).is_some(),
        t.token('\n')
    )
}

#[derive(Debug)]
pub struct ParseError {
    source: String,
    offset: usize,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to parse near offset {}: {:?}", self.offset, &self.source[self.offset..])
    }
}

impl std::error::Error for ParseError {}

pub fn parse(source: &str) -> Result<Design, ParseError> {
    let context = Context::new();
    let mut tokens = source.into_tokens().with_context(context);
    while parse_line(&mut tokens) {}
    parse_blank(&mut tokens);
    let (mut tokens, context) = tokens.into_parts();
    if !tokens.eof() {
        return Err(ParseError { source: String::from(source), offset: tokens.location().offset() });
    }
    Ok(context.design)
}

impl FromStr for Design {
    type Err = ParseError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        parse(source)
    }
}
