//! Implementation of the `#[derive(GridRow)]` macro.
//!
//! Generates `datagrid::Row` with `SHAPE = Static` and a member table
//! mapping each member name to its `CellType` value type and reader, plus
//! field name constants.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Data, DeriveInput, Error, Fields, Result};

use super::attrs::parse_grid_attrs;

/// Main implementation of the GridRow derive macro.
pub fn grid_row_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "GridRow can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "GridRow can only be derived for structs",
            ))
        }
    };

    let mut member_arms: Vec<TokenStream> = Vec::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let grid_attrs = parse_grid_attrs(&field.attrs)?;
        if grid_attrs.skip {
            continue;
        }

        let member_name = grid_attrs
            .rename
            .unwrap_or_else(|| field_name.to_string());
        if seen.contains(&member_name) {
            return Err(Error::new(
                field.span(),
                format!("duplicate grid member name '{}'", member_name),
            ));
        }
        seen.push(member_name.clone());

        let const_name = format_ident!("{}", to_screaming_snake_case(&member_name));
        field_constants.push(quote! {
            /// Member name constant.
            pub const #const_name: &'static str = #member_name;
        });

        let ty = &field.ty;
        member_arms.push(quote! {
            #member_name => ::core::option::Option::Some(::datagrid::Member::new(
                <#ty as ::datagrid::CellType>::value_type(),
                |row: &Self| ::datagrid::CellType::to_value(&row.#field_name),
            )),
        });
    }

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#field_constants)*
        }

        impl #impl_generics ::datagrid::Row for #struct_name #ty_generics #where_clause {
            const SHAPE: ::datagrid::RowShape = ::datagrid::RowShape::Static;

            fn member(field: &str) -> ::core::option::Option<::datagrid::Member<Self>> {
                match field {
                    #(#member_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    };

    Ok(expanded)
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' || c == ' ' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = c.is_alphanumeric();
        }
    }

    result
}
