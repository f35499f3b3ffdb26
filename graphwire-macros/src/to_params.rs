use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use crate::attrs::{has_flag, named_fields, str_attr};

pub fn expand(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let name = &ast.ident;

    let fields = match named_fields(&ast, "ToParams") {
        Ok(fields) => fields,
        Err(err) => return err.into(),
    };

    let mut inserts = Vec::new();

    for f in fields {
        if has_flag(&f.attrs, "skip") || has_flag(&f.attrs, "id") {
            continue;
        }
        let ident = f.ident.as_ref().unwrap();
        let key = str_attr(&f.attrs, "prop").unwrap_or_else(|| ident.to_string());
        inserts.push(quote! {
            map.insert(#key.to_string(), graphwire_core::traits::IntoGraphValue::into_value(self.#ident));
        });
    }

    let expanded = quote! {
        impl graphwire_core::traits::ToParams for #name {
            fn to_params(self) -> std::collections::HashMap<String, graphwire_core::neo4rs::BoltType> {
                let mut map = std::collections::HashMap::new();
                #(#inserts)*
                map
            }
        }
    };

    expanded.into()
}
