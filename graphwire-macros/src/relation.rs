use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use crate::attrs::{named_fields, str_attr};
use crate::hydrate::field_inits;

pub fn expand(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let name = &ast.ident;

    let rel_type = str_attr(&ast.attrs, "type").unwrap_or_else(|| name.to_string());
    let from_label = str_attr(&ast.attrs, "from");
    let to_label = str_attr(&ast.attrs, "to");

    let fields = match named_fields(&ast, "GraphRelation") {
        Ok(fields) => fields,
        Err(err) => return err.into(),
    };

    let owner_const = quote! { <Self as graphwire_core::traits::GraphRelation>::TYPE };
    let inits = field_inits(&fields, &rel_type, &owner_const);

    let from_label_tokens = match from_label {
        Some(s) => quote! { Some(#s) },
        None => quote! { None },
    };
    let to_label_tokens = match to_label {
        Some(s) => quote! { Some(#s) },
        None => quote! { None },
    };

    let expanded = quote! {
        impl graphwire_core::traits::GraphRelation for #name {
            const TYPE: &'static str = #rel_type;
            const FROM_LABEL: Option<&'static str> = #from_label_tokens;
            const TO_LABEL: Option<&'static str> = #to_label_tokens;

            fn from_properties(
                props: &graphwire_core::neo4rs::BoltMap,
            ) -> Result<Self, graphwire_core::error::GraphError> {
                Ok(Self {
                    #(#inits,)*
                })
            }
        }

        impl graphwire_core::traits::FromGraphValue for #name {
            fn from_value(
                value: graphwire_core::neo4rs::BoltType,
            ) -> Result<Self, graphwire_core::error::GraphError> {
                match value {
                    graphwire_core::neo4rs::BoltType::Relation(r) => {
                        <Self as graphwire_core::traits::GraphRelation>::from_rel(&r)
                    }
                    graphwire_core::neo4rs::BoltType::Map(m) => {
                        <Self as graphwire_core::traits::GraphRelation>::from_properties(&m)
                    }
                    other => Err(graphwire_core::error::GraphError::type_mismatch(
                        "Relationship", graphwire_core::value::type_name(&other), #rel_type,
                    )),
                }
            }
        }

        impl graphwire_core::traits::FromRow for #name {
            fn from_record(
                record: &graphwire_core::record::Record,
            ) -> Result<Self, graphwire_core::error::GraphError> {
                <Self as graphwire_core::traits::FromGraphValue>::from_value(record.single()?.clone())
            }
        }
    };

    expanded.into()
}
