//! Code generation — turns the DSL AST into `greentea::Context` registration calls.

use proc_macro2::TokenStream;
use quote::quote;

use crate::dsl::*;

// ============================================================================
// Public entry points
// ============================================================================

/// A closure `|ctx: &Context| -> Result<(), SpecError>` registering the suite.
pub fn generate_spec(suite: Suite) -> TokenStream {
    registration_closure(&suite.items)
}

/// A `fn main()` that builds the suite and runs it through `greentea::run`.
pub fn generate_bdd(suite: Suite) -> TokenStream {
    let closure = registration_closure(&suite.items);
    quote! {
        fn main() {
            ::greentea::run(#closure);
        }
    }
}

fn registration_closure(items: &[DslItem]) -> TokenStream {
    let calls = generate_items(items);
    quote! {
        |ctx: &::greentea::Context| -> ::std::result::Result<(), ::greentea::SpecError> {
            #(#calls)*
            ::std::result::Result::Ok(())
        }
    }
}

// ============================================================================
// Item generation
// ============================================================================

fn generate_items(items: &[DslItem]) -> Vec<TokenStream> {
    items
        .iter()
        .map(|item| match item {
            DslItem::Describe(block) => generate_describe(block),
            DslItem::It(block) => generate_it(block),
            DslItem::Hook(block) => generate_hook(block),
        })
        .collect()
}

fn generate_describe(block: &DescribeBlock) -> TokenStream {
    let name = &block.name;
    let closure = registration_closure(&block.items);
    quote! {
        ctx.describe(#name, #closure)?;
    }
}

fn generate_it(block: &ItBlock) -> TokenStream {
    match (&block.name, &block.body) {
        (Some(name), Some(body)) => quote! {
            ctx.it(#name, || { #body })?;
        },
        (Some(name), None) => quote! {
            ctx.pending(#name)?;
        },
        (None, Some(body)) => quote! {
            ctx.specify(|| { #body })?;
        },
        // rejected by the parser
        (None, None) => TokenStream::new(),
    }
}

fn generate_hook(block: &HookBlock) -> TokenStream {
    let description = block
        .description
        .as_ref()
        .map(|lit| lit.value())
        .unwrap_or_default();
    let body = &block.body;
    let method = match block.kind {
        HookKind::Before => quote!(before),
        HookKind::BeforeEach => quote!(before_each),
        HookKind::AfterEach => quote!(after_each),
        HookKind::After => quote!(after),
    };
    quote! {
        ctx.#method(#description, || { #body })?;
    }
}
