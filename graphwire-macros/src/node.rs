use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use crate::attrs::{named_fields, str_attr};
use crate::hydrate::field_inits;

pub fn expand(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let name = &ast.ident;

    let label = str_attr(&ast.attrs, "label").unwrap_or_else(|| name.to_string());

    let fields = match named_fields(&ast, "GraphNode") {
        Ok(fields) => fields,
        Err(err) => return err.into(),
    };

    let owner_const = quote! { <Self as graphwire_core::traits::GraphNode>::LABEL };
    let inits = field_inits(&fields, &label, &owner_const);

    let expanded = quote! {
        impl graphwire_core::traits::GraphNode for #name {
            const LABEL: &'static str = #label;

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
                    graphwire_core::neo4rs::BoltType::Node(n) => {
                        <Self as graphwire_core::traits::GraphNode>::from_node(&n)
                    }
                    graphwire_core::neo4rs::BoltType::Map(m) => {
                        <Self as graphwire_core::traits::GraphNode>::from_properties(&m)
                    }
                    other => Err(graphwire_core::error::GraphError::type_mismatch(
                        "Node", graphwire_core::value::type_name(&other), #label,
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
