//! Property-map hydration shared by `GraphNode` and `GraphRelation`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::Field;

use crate::attrs::{is_option, str_attr};

/// Generate `field: value` initializers reading from a `props: &BoltMap`.
///
/// `owner` is the label or relationship type (used in error messages),
/// `owner_const` the expression for it inside the impl.
pub fn field_inits(fields: &[&Field], owner: &str, owner_const: &TokenStream) -> Vec<TokenStream> {
    let mut inits = Vec::new();

    for f in fields {
        let ident = f.ident.as_ref().expect("named field");
        let key = ident.to_string();
        let ty = &f.ty;

        // #[graph(id)] is a marker only; the property key stays the same.
        let prop_key = str_attr(&f.attrs, "prop").unwrap_or_else(|| key.clone());

        // Servers drop null properties, so a missing key is `None` for Option fields.
        if is_option(ty) {
            inits.push(quote! {
                #ident: match graphwire_core::props::map_prop(props, #prop_key) {
                    None => None,
                    Some(v) => <#ty as graphwire_core::traits::FromGraphValue>::from_value(v)
                        .map_err(|e| e.with_context(format!("{}::{} (prop '{}')", #owner, #key, #prop_key)))?,
                }
            });
        } else {
            inits.push(quote! {
                #ident: {
                    let v = graphwire_core::props::map_prop(props, #prop_key)
                        .ok_or_else(|| graphwire_core::error::GraphError::missing_property(#prop_key, #owner_const))?;
                    <#ty as graphwire_core::traits::FromGraphValue>::from_value(v)
                        .map_err(|e| e.with_context(format!("{}::{} (prop '{}')", #owner, #key, #prop_key)))?
                }
            });
        }
    }

    inits
}
