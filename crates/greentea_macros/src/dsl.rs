//! DSL AST types and `syn::parse::Parse` implementations.
//!
//! Parses the describe/it DSL syntax into a structured AST.

use proc_macro2::TokenStream;
use syn::parse::{Parse, ParseStream};
use syn::{braced, Ident, LitStr, Result, Token};

// ============================================================================
// AST types
// ============================================================================

/// Top-level suite — a list of DSL items.
#[derive(Debug)]
pub struct Suite {
    pub items: Vec<DslItem>,
}

/// A single DSL node.
#[derive(Debug)]
pub enum DslItem {
    Describe(DescribeBlock),
    It(ItBlock),
    Hook(HookBlock),
}

/// `describe "name" { ... }` / `context "name" { ... }` / `when "name" { ... }`
#[derive(Debug)]
pub struct DescribeBlock {
    pub name: LitStr,
    pub items: Vec<DslItem>,
}

/// `it "name" { ... }`, `it "name";` (pending) or `it { ... }` (nameless).
#[derive(Debug)]
pub struct ItBlock {
    pub name: Option<LitStr>,
    /// `None` for a pending test.
    pub body: Option<TokenStream>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Before,
    BeforeEach,
    AfterEach,
    After,
}

/// `before ["description"] { ... }` and friends.
#[derive(Debug)]
pub struct HookBlock {
    pub kind: HookKind,
    pub description: Option<LitStr>,
    pub body: TokenStream,
}

// ============================================================================
// Parsing
// ============================================================================

impl Parse for Suite {
    fn parse(input: ParseStream) -> Result<Self> {
        let items = parse_items(input)?;
        Ok(Suite { items })
    }
}

/// Parse a sequence of DSL items until the stream is exhausted.
fn parse_items(input: ParseStream) -> Result<Vec<DslItem>> {
    let mut items = Vec::new();
    while !input.is_empty() {
        items.push(input.parse::<DslItem>()?);
    }
    Ok(items)
}

impl Parse for DslItem {
    fn parse(input: ParseStream) -> Result<Self> {
        let ident: Ident = input.parse()?;
        let name = ident.to_string();

        match name.as_str() {
            "describe" | "context" | "when" => Ok(DslItem::Describe(parse_describe_block(input)?)),

            "it" | "specify" => Ok(DslItem::It(parse_it_block(input)?)),

            "before" | "before_all" => Ok(DslItem::Hook(parse_hook_block(input, HookKind::Before)?)),
            "before_each" => Ok(DslItem::Hook(parse_hook_block(input, HookKind::BeforeEach)?)),
            "after_each" => Ok(DslItem::Hook(parse_hook_block(input, HookKind::AfterEach)?)),
            "after" | "after_all" => Ok(DslItem::Hook(parse_hook_block(input, HookKind::After)?)),

            _ => Err(syn::Error::new(
                ident.span(),
                format!(
                    "unknown DSL keyword `{name}`. Expected one of: \
                     describe, context, when, it, specify, before, after, \
                     before_each, after_each"
                ),
            )),
        }
    }
}

// ============================================================================
// Block parsers
// ============================================================================

/// Parse: `"name" { items... }`
fn parse_describe_block(input: ParseStream) -> Result<DescribeBlock> {
    let name: LitStr = input.parse()?;
    let content;
    braced!(content in input);
    let items = parse_items(&content)?;
    Ok(DescribeBlock { name, items })
}

/// Parse: `"name" { body }`, `"name";` or `{ body }`
fn parse_it_block(input: ParseStream) -> Result<ItBlock> {
    let name = if input.peek(LitStr) {
        Some(input.parse::<LitStr>()?)
    } else {
        None
    };

    if name.is_some() && input.peek(Token![;]) {
        input.parse::<Token![;]>()?;
        return Ok(ItBlock { name, body: None });
    }

    if !input.peek(syn::token::Brace) {
        return Err(input.error("expected `{ body }` or, for a pending test, `;`"));
    }
    let body_content;
    braced!(body_content in input);
    let body: TokenStream = body_content.parse()?;
    Ok(ItBlock {
        name,
        body: Some(body),
    })
}

/// Parse: `["description"] { body }`
fn parse_hook_block(input: ParseStream, kind: HookKind) -> Result<HookBlock> {
    let description = if input.peek(LitStr) {
        Some(input.parse::<LitStr>()?)
    } else {
        None
    };
    let content;
    braced!(content in input);
    let body: TokenStream = content.parse()?;
    Ok(HookBlock {
        kind,
        description,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Suite {
        syn::parse_str::<Suite>(src).unwrap()
    }

    #[test]
    fn test_parse_nested_describe() {
        let suite = parse(
            r#"
            describe "A" {
                before "open" { setup(); }
                it "passes" { check(); }
                it "later";
                context "B" {
                    it { other(); }
                }
            }
            "#,
        );
        assert_eq!(suite.items.len(), 1);
        let DslItem::Describe(a) = &suite.items[0] else {
            panic!("expected describe");
        };
        assert_eq!(a.name.value(), "A");
        assert_eq!(a.items.len(), 4);

        match &a.items[0] {
            DslItem::Hook(hook) => {
                assert_eq!(hook.kind, HookKind::Before);
                assert_eq!(hook.description.as_ref().unwrap().value(), "open");
            }
            other => panic!("expected hook, got {other:?}"),
        }
        match &a.items[2] {
            DslItem::It(it) => {
                assert_eq!(it.name.as_ref().unwrap().value(), "later");
                assert!(it.body.is_none());
            }
            other => panic!("expected it, got {other:?}"),
        }
        let DslItem::Describe(b) = &a.items[3] else {
            panic!("expected nested describe");
        };
        match &b.items[0] {
            DslItem::It(it) => {
                assert!(it.name.is_none());
                assert!(it.body.is_some());
            }
            other => panic!("expected it, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_hook_without_description() {
        let suite = parse("after_each { cleanup(); } after_all { done(); }");
        let kinds: Vec<HookKind> = suite
            .items
            .iter()
            .map(|item| match item {
                DslItem::Hook(hook) => {
                    assert!(hook.description.is_none());
                    hook.kind
                }
                other => panic!("expected hook, got {other:?}"),
            })
            .collect();
        assert_eq!(kinds, vec![HookKind::AfterEach, HookKind::After]);
    }

    #[test]
    fn test_unknown_keyword_is_error() {
        let err = syn::parse_str::<Suite>(r#"subject { 1 }"#).unwrap_err();
        assert!(err.to_string().contains("unknown DSL keyword `subject`"));
    }

    #[test]
    fn test_nameless_pending_is_error() {
        assert!(syn::parse_str::<Suite>("it;").is_err());
    }
}
