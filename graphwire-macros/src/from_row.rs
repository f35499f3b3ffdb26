use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use crate::attrs::{has_flag, is_option, named_fields, str_attr};

pub fn expand(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let name = &ast.ident;

    let fields = match named_fields(&ast, "FromRow") {
        Ok(fields) => fields,
        Err(err) => return err.into(),
    };

    let struct_name = name.to_string();
    let mut inits = Vec::new();

    for f in fields {
        let ident = f.ident.as_ref().unwrap();
        let ty = &f.ty;

        if has_flag(&f.attrs, "flatten") {
            inits.push(quote! {
                #ident: <#ty as graphwire_core::traits::FromRow>::from_record(record)?
            });
            continue;
        }

        let key = str_attr(&f.attrs, "column").unwrap_or_else(|| ident.to_string());

        // Record lookups fall back to a case-insensitive match, so `Name`
        // still fills a `name` field.
        if is_option(ty) {
            inits.push(quote! {
                #ident: {
                    match graphwire_core::record::get_value(record, #key) {
                        None => None,
                        Some(v) => <#ty as graphwire_core::traits::FromGraphValue>::from_value(v)
                            .map_err(|e| e.with_context(format!("{}::{}", #struct_name, #key)))?,
                    }
                }
            });
        } else {
            inits.push(quote! {
                #ident: {
                    let v = graphwire_core::record::get_value(record, #key)
                        .ok_or_else(|| graphwire_core::error::GraphError::missing_field(#key, #struct_name))?;
                    <#ty as graphwire_core::traits::FromGraphValue>::from_value(v)
                        .map_err(|e| e.with_context(format!("{}::{}", #struct_name, #key)))?
                }
            });
        }
    }

    let expanded = quote! {
        impl graphwire_core::traits::FromRow for #name {
            fn from_record(
                record: &graphwire_core::record::Record,
            ) -> Result<Self, graphwire_core::error::GraphError> {
                Ok(Self {
                    #(#inits,)*
                })
            }
        }
    };

    expanded.into()
}
