//! `#[graph(...)]` attribute parsing shared by every derive.

use syn::{Attribute, Data, DeriveInput, Expr, ExprLit, Field, Fields, Lit};

/// Read `#[graph(name = "...")]` from an attribute list.
pub fn str_attr(attrs: &[Attribute], name: &str) -> Option<String> {
    let mut found = None;
    for attr in attrs {
        if !attr.path().is_ident("graph") {
            continue;
        }
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(name) {
                let expr: Expr = meta.value()?.parse()?;
                if let Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) = expr {
                    found = Some(s.value());
                }
            } else if meta.input.peek(syn::Token![=]) {
                // skip the value of keys we are not looking for
                let _: Expr = meta.value()?.parse()?;
            }
            Ok(())
        });
    }
    found
}

/// Whether `#[graph(name)]` is present.
pub fn has_flag(attrs: &[Attribute], name: &str) -> bool {
    let mut found = false;
    for attr in attrs {
        if !attr.path().is_ident("graph") {
            continue;
        }
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(name) {
                found = true;
            } else if meta.input.peek(syn::Token![=]) {
                let _: Expr = meta.value()?.parse()?;
            }
            Ok(())
        });
    }
    found
}

/// Syntactic `Option<...>` check, kept lightweight on purpose.
pub fn is_option(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Path(p) => p.path.segments.last().map(|s| s.ident == "Option").unwrap_or(false),
        _ => false,
    }
}

/// The named fields of a struct, or a compile error naming the derive.
pub fn named_fields<'a>(ast: &'a DeriveInput, derive: &str) -> Result<Vec<&'a Field>, proc_macro2::TokenStream> {
    match &ast.data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(named) => Ok(named.named.iter().collect()),
            _ => Err(syn::Error::new_spanned(ast, format!("{derive} only supports structs with named fields"))
                .to_compile_error()),
        },
        _ => Err(syn::Error::new_spanned(ast, format!("{derive} only supports structs")).to_compile_error()),
    }
}
